//! Static file serving module
//!
//! Resolves request paths under the serving root, decides between full,
//! partial, unsatisfiable, and malformed range outcomes, and builds the
//! matching response. File bodies are streamed; nothing is read into
//! memory whole.

use std::path::{Path, PathBuf};

use hyper::Response;
use tokio::fs::File;

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::mime;
use crate::http::{self, ResponseBody};
use crate::http::range::{decide, RangeDecision};
use crate::logger;

/// Serve a GET/HEAD request from the configured root.
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<ResponseBody> {
    let decoded = percent_decode(ctx.path);

    let Some(fs_path) = resolve_path(&state.root, &decoded) else {
        return http::build_404_response();
    };

    if fs_path.is_dir() {
        return serve_directory(ctx, state, &fs_path, &decoded).await;
    }

    serve_file(ctx, &fs_path).await
}

/// Serve a directory target: index file if present, listing otherwise.
async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &AppState,
    dir: &Path,
    decoded_path: &str,
) -> Response<ResponseBody> {
    for index in &state.config.http.index_files {
        let candidate = dir.join(index);
        if candidate.is_file() {
            return serve_file(ctx, &candidate).await;
        }
    }

    if !state.config.http.directory_listing {
        return http::build_404_response();
    }

    // Relative links in the listing only resolve below a trailing slash.
    if !decoded_path.ends_with('/') {
        return http::build_redirect_response(&format!("{}/", ctx.path));
    }

    match listing::read_entries(dir).await {
        Ok(entries) => {
            http::build_html_response(listing::render_html(decoded_path, &entries), ctx.is_head)
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read directory '{}': {e}",
                dir.display()
            ));
            http::build_404_response()
        }
    }
}

/// Serve a regular file, honoring an optional `Range` header.
async fn serve_file(ctx: &RequestContext<'_>, path: &Path) -> Response<ResponseBody> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return http::build_404_response(),
        Err(_) => return http::build_404_response(),
    };

    let total_len = metadata.len();
    let modified = metadata.modified().ok();
    let content_type = mime::content_type_for(path);

    match decide(ctx.range_header.as_deref(), total_len) {
        RangeDecision::Full(total) => {
            let Some(window) = open_window(ctx, path, 0, total).await else {
                return http::build_404_response();
            };
            http::build_full_response(window, total, content_type, modified)
        }
        RangeDecision::Partial { start, end, total } => {
            let Some(window) = open_window(ctx, path, start, end - start + 1).await else {
                return http::build_404_response();
            };
            http::build_partial_response(window, start, end, total, content_type, modified)
        }
        RangeDecision::Unsatisfiable(total) => {
            logger::log_warning(&format!(
                "Unsatisfiable range '{}' for '{}' ({total} bytes)",
                ctx.range_header.as_deref().unwrap_or(""),
                path.display()
            ));
            http::build_416_response(total)
        }
        RangeDecision::Malformed(err) => {
            logger::log_error(&format!(
                "Malformed range '{}' for '{}': {err}",
                ctx.range_header.as_deref().unwrap_or(""),
                path.display()
            ));
            http::build_500_response(&err.to_string())
        }
    }
}

/// Open the file and wrap the requested window, or an empty body for HEAD.
///
/// `None` means the file vanished between metadata and open; the caller
/// answers 404.
async fn open_window(
    ctx: &RequestContext<'_>,
    path: &Path,
    start: u64,
    len: u64,
) -> Option<ResponseBody> {
    if ctx.is_head {
        return Some(ResponseBody::empty());
    }

    match File::open(path).await {
        Ok(file) => Some(ResponseBody::window(file, start, len)),
        Err(e) => {
            logger::log_error(&format!("Failed to open '{}': {e}", path.display()));
            None
        }
    }
}

/// Resolve a decoded request path to a filesystem path inside `root`.
///
/// Canonicalizes the candidate and requires it to stay under the
/// canonicalized root, which defeats `..` and symlink escapes in one
/// check. Nonexistent paths resolve to `None` (a plain 404).
fn resolve_path(root: &Path, decoded_path: &str) -> Option<PathBuf> {
    let relative = decoded_path.trim_start_matches('/');
    let candidate = root.join(relative);

    let canonical = candidate.canonicalize().ok()?;
    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {decoded_path} -> {}",
            canonical.display()
        ));
        return None;
    }

    Some(canonical)
}

/// Decode `%XX` escapes in a request path. Invalid escapes pass through
/// unchanged; non-UTF-8 results are replaced lossily.
fn percent_decode(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).copied().and_then(hex_value),
                bytes.get(i + 2).copied().and_then(hex_value),
            ) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
