//! HTTP protocol layer module
//!
//! Protocol-level building blocks, decoupled from file resolution and
//! routing: range decisions, response body streaming, response builders,
//! MIME lookup, and the uniform CORS header set.

pub mod body;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use range::{decide, RangeDecision};
pub use response::{
    build_404_response, build_405_response, build_416_response, build_500_response,
    build_full_response, build_html_response, build_options_response, build_partial_response,
    build_redirect_response,
};
