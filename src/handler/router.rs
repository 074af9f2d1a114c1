//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, dispatch to
//! the static file layer, uniform CORS injection, and access logging.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::Body;
use hyper::{Method, Request, Response, Version};

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, cors, ResponseBody};
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw (undecoded) request path.
    pub path: &'a str,
    pub is_head: bool,
    /// Raw `Range` header value, if one was sent.
    pub range_header: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// Every response leaving this function carries the CORS header set,
/// whatever branch produced it.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: std::net::SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let http_version = version_label(req.version());
    let user_agent = header_string(&req, "user-agent");

    let mut response = match method {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext {
                path: &path,
                is_head: method == Method::HEAD,
                range_header: header_string(&req, "range"),
            };
            static_files::serve(&ctx, &state).await
        }
        Method::OPTIONS => http::build_options_response(),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    };

    cors::apply(response.headers_mut());

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            remote_addr.ip().to_string(),
            method.to_string(),
            path,
        );
        entry.http_version = http_version.to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    struct Fixture {
        state: Arc<AppState>,
        dir: PathBuf,
    }

    impl Fixture {
        fn new(name: &str, content: &[u8]) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "rangeserve-router-{name}-{}",
                std::process::id()
            ));
            std::fs::create_dir_all(&dir).expect("create fixture dir");
            std::fs::write(dir.join("media.bin"), content).expect("write fixture file");

            let mut cfg = Config::load_from("definitely-missing-config").expect("defaults");
            cfg.server.root_dir = dir.to_str().expect("utf-8 temp dir").to_string();
            cfg.logging.access_log = false;
            let state = Arc::new(AppState::new(cfg).expect("state"));

            Self { state, dir }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn request(method: Method, uri: &str, range: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(r) = range {
            builder = builder.header("range", r);
        }
        builder.body(()).expect("request")
    }

    async fn send(
        fixture: &Fixture,
        method: Method,
        uri: &str,
        range: Option<&str>,
    ) -> Response<ResponseBody> {
        handle_request(request(method, uri, range), Arc::clone(&fixture.state), peer())
            .await
            .expect("infallible")
    }

    async fn body_bytes(response: Response<ResponseBody>) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes()
            .to_vec()
    }

    fn assert_cors(response: &Response<ResponseBody>) {
        let headers = response.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "GET, OPTIONS"
        );
        assert_eq!(headers.get("access-control-allow-headers").unwrap(), "Range");
    }

    #[tokio::test]
    async fn full_request_returns_every_byte() {
        let content: Vec<u8> = (0u16..1000).map(|i| (i % 256) as u8).collect();
        let fixture = Fixture::new("full", &content);

        let resp = send(&fixture, Method::GET, "/media.bin", None).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("content-length").unwrap(), "1000");
        assert_eq!(resp.headers().get("accept-ranges").unwrap(), "bytes");
        assert!(resp.headers().get("last-modified").is_some());
        assert_cors(&resp);
        assert_eq!(body_bytes(resp).await, content);
    }

    #[tokio::test]
    async fn partial_request_returns_the_window() {
        let content: Vec<u8> = (0u16..1000).map(|i| (i % 251) as u8).collect();
        let fixture = Fixture::new("partial", &content);

        let resp = send(&fixture, Method::GET, "/media.bin", Some("bytes=100-199")).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers().get("content-length").unwrap(), "100");
        assert_eq!(
            resp.headers().get("content-range").unwrap(),
            "bytes 100-199/1000"
        );
        assert_cors(&resp);
        assert_eq!(body_bytes(resp).await, &content[100..200]);
    }

    #[tokio::test]
    async fn open_ended_range_runs_to_the_last_byte() {
        let content = vec![7u8; 1000];
        let fixture = Fixture::new("open", &content);

        let resp = send(&fixture, Method::GET, "/media.bin", Some("bytes=100-")).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(
            resp.headers().get("content-range").unwrap(),
            "bytes 100-999/1000"
        );
        assert_eq!(body_bytes(resp).await.len(), 900);
    }

    #[tokio::test]
    async fn blank_start_uses_offset_zero_arithmetic() {
        let content = vec![1u8; 1000];
        let fixture = Fixture::new("suffixish", &content);

        // Documented non-RFC behavior: "-500" is the window 0..=500.
        let resp = send(&fixture, Method::GET, "/media.bin", Some("bytes=-500")).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(
            resp.headers().get("content-range").unwrap(),
            "bytes 0-500/1000"
        );
        assert_eq!(body_bytes(resp).await.len(), 501);
    }

    #[tokio::test]
    async fn single_byte_window_has_length_one() {
        let content: Vec<u8> = (0u8..100).collect();
        let fixture = Fixture::new("byte", &content);

        let resp = send(&fixture, Method::GET, "/media.bin", Some("bytes=42-42")).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers().get("content-length").unwrap(), "1");
        assert_eq!(body_bytes(resp).await, vec![42u8]);
    }

    #[tokio::test]
    async fn out_of_bounds_ranges_are_416() {
        let fixture = Fixture::new("bounds", &[0u8; 100]);

        for header in ["bytes=100-", "bytes=0-100", "bytes=9-3", "bytes=500-600"] {
            let resp = send(&fixture, Method::GET, "/media.bin", Some(header)).await;
            assert_eq!(resp.status(), 416, "header {header}");
            assert_eq!(
                resp.headers().get("content-range").unwrap(),
                "bytes */100",
                "header {header}"
            );
            assert_cors(&resp);
        }
    }

    #[tokio::test]
    async fn malformed_range_is_a_server_error() {
        let fixture = Fixture::new("malformed", &[0u8; 100]);

        let resp = send(&fixture, Method::GET, "/media.bin", Some("bytes=abc-def")).await;
        assert_eq!(resp.status(), 500);
        assert_cors(&resp);
        let body = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(body.contains("invalid byte position"));
    }

    #[tokio::test]
    async fn options_preflight_is_empty_200_with_cors() {
        let fixture = Fixture::new("options", &[0u8; 10]);

        let resp = send(&fixture, Method::OPTIONS, "/anything", None).await;
        assert_eq!(resp.status(), 200);
        assert_cors(&resp);
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn disallowed_method_is_405_with_cors() {
        let fixture = Fixture::new("method", &[0u8; 10]);

        let resp = send(&fixture, Method::POST, "/media.bin", None).await;
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers().get("allow").unwrap(), "GET, HEAD, OPTIONS");
        assert_cors(&resp);
    }

    #[tokio::test]
    async fn missing_file_is_404_with_cors() {
        let fixture = Fixture::new("missing", &[0u8; 10]);

        let resp = send(&fixture, Method::GET, "/nope.bin", None).await;
        assert_eq!(resp.status(), 404);
        assert_cors(&resp);
    }

    #[tokio::test]
    async fn head_mirrors_get_headers_without_a_body() {
        let fixture = Fixture::new("head", &[9u8; 256]);

        let resp = send(&fixture, Method::HEAD, "/media.bin", Some("bytes=0-99")).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers().get("content-length").unwrap(), "100");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn sequential_windows_reconstruct_the_resource() {
        let content: Vec<u8> = (0u32..4096).map(|i| (i % 253) as u8).collect();
        let fixture = Fixture::new("reassemble", &content);

        let mut reassembled = Vec::new();
        let step = 500;
        let mut start = 0usize;
        while start < content.len() {
            let end = (start + step - 1).min(content.len() - 1);
            let header = format!("bytes={start}-{end}");
            let resp = send(&fixture, Method::GET, "/media.bin", Some(&header)).await;
            assert_eq!(resp.status(), 206);
            reassembled.extend(body_bytes(resp).await);
            start = end + 1;
        }

        assert_eq!(reassembled, content);
    }

    #[tokio::test]
    async fn directory_listing_links_files() {
        let fixture = Fixture::new("listing", b"data");

        let resp = send(&fixture, Method::GET, "/", None).await;
        assert_eq!(resp.status(), 200);
        assert_cors(&resp);
        let html = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(html.contains("media.bin"));
    }

    #[tokio::test]
    async fn traversal_attempts_are_not_served() {
        let fixture = Fixture::new("traversal", b"data");

        let resp = send(&fixture, Method::GET, "/../../etc/passwd", None).await;
        assert_eq!(resp.status(), 404);
    }
}
