//! HTTP response building module
//!
//! Builders for every status the server emits, decoupled from routing and
//! file resolution. All builders return `Response<ResponseBody>`; CORS
//! headers are injected later at a single point in the handler.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use hyper::Response;

use crate::http::body::ResponseBody;
use crate::logger;

/// Build 200 OK for a whole-resource transfer.
///
/// `body` is either a streaming file window or an empty body for HEAD; the
/// framing headers are identical either way.
pub fn build_full_response(
    body: ResponseBody,
    total_len: u64,
    content_type: &str,
    modified: Option<SystemTime>,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", total_len)
        .header("Accept-Ranges", "bytes");

    if let Some(mtime) = modified {
        builder = builder.header("Last-Modified", http_date(mtime));
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(ResponseBody::empty())
    })
}

/// Build 206 Partial Content for an inclusive byte window.
pub fn build_partial_response(
    body: ResponseBody,
    start: u64,
    end: u64,
    total_len: u64,
    content_type: &str,
    modified: Option<SystemTime>,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(206)
        .header("Content-Type", content_type)
        .header("Content-Length", end - start + 1)
        .header("Content-Range", format!("bytes {start}-{end}/{total_len}"))
        .header("Accept-Ranges", "bytes");

    if let Some(mtime) = modified {
        builder = builder.header("Last-Modified", http_date(mtime));
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(ResponseBody::empty())
    })
}

/// Build 416 Range Not Satisfiable, advertising the actual resource length.
pub fn build_416_response(total_len: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{total_len}"))
        .body(ResponseBody::full("416 Range Not Satisfiable"))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build 500 Internal Server Error carrying the failure description.
///
/// Used for malformed `Range` headers among other things; the parse
/// failure text goes into the body so clients can see what was wrong.
pub fn build_500_response(detail: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(500)
        .header("Content-Type", "text/plain")
        .body(ResponseBody::full(format!("500 Internal Server Error: {detail}")))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(ResponseBody::full("404 Not Found"))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(ResponseBody::full("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build the OPTIONS preflight response: 200 with an empty body.
///
/// The CORS headers themselves are added by the handler's uniform
/// injection pass.
pub fn build_options_response() -> Response<ResponseBody> {
    Response::builder()
        .status(200)
        .header("Content-Length", 0)
        .body(ResponseBody::empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build 301 redirect, used to append the trailing slash on directory
/// paths so relative listing links resolve.
pub fn build_redirect_response(target: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(301)
        .header("Location", target)
        .header("Content-Type", "text/plain")
        .body(ResponseBody::full("Redirecting..."))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Build a generated HTML page (directory listings).
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head {
        ResponseBody::empty()
    } else {
        ResponseBody::full(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(ResponseBody::empty())
        })
}

/// Format a timestamp as an IMF-fixdate `Last-Modified` value.
fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
