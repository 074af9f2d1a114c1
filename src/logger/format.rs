//! Access log format module
//!
//! Supported formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format)
//! - `json` (structured, one object per line)
//!
//! Unknown format names fall back to `common`.

use chrono::Local;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, HEAD, OPTIONS)
    pub method: String,
    /// Request URI path
    pub path: String,
    /// HTTP version (1.0, 1.1)
    pub http_version: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: u64,
    /// User-Agent header
    pub user_agent: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "json" => self.format_json(),
            _ => self.format_common(),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.path, self.http_version)
    }

    /// Common Log Format
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// Combined format: common plus referer and user agent. Referers are
    /// not tracked here, so that field is always `-`.
    fn format_combined(&self) -> String {
        format!(
            "{} \"-\" \"{}\"",
            self.format_common(),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// JSON structured log format
    fn format_json(&self) -> String {
        let user_agent = self
            .user_agent
            .as_ref()
            .map_or_else(|| "null".to_string(), |u| format!("\"{}\"", escape_json(u)));

        format!(
            r#"{{"remote_addr":"{}","time":"{}","method":"{}","path":"{}","status":{},"body_bytes":{},"user_agent":{},"request_time_us":{}}}"#,
            escape_json(&self.remote_addr),
            self.time.to_rfc3339(),
            escape_json(&self.method),
            escape_json(&self.path),
            self.status,
            self.body_bytes,
            user_agent,
            self.request_time_us,
        )
    }
}

/// Escape special characters for JSON string
fn escape_json(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.9".to_string(),
            "GET".to_string(),
            "/media/clip.mp4".to_string(),
        );
        entry.status = 206;
        entry.body_bytes = 8192;
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.request_time_us = 1500;
        entry
    }

    #[test]
    fn common_has_request_line_and_counts() {
        let log = entry().format("common");
        assert!(log.contains("192.168.1.9"));
        assert!(log.contains("\"GET /media/clip.mp4 HTTP/1.1\""));
        assert!(log.contains("206 8192"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn combined_appends_user_agent() {
        let log = entry().format("combined");
        assert!(log.contains("206 8192"));
        assert!(log.contains("\"Mozilla/5.0\""));
    }

    #[test]
    fn json_is_structured() {
        let log = entry().format("json");
        assert!(log.contains(r#""remote_addr":"192.168.1.9""#));
        assert!(log.contains(r#""status":206"#));
        assert!(log.contains(r#""body_bytes":8192"#));
        assert!(log.contains(r#""request_time_us":1500"#));
    }

    #[test]
    fn unknown_format_falls_back_to_common() {
        let e = entry();
        assert_eq!(e.format("fancy"), e.format("common"));
    }

    #[test]
    fn json_escapes_quotes_in_paths() {
        let mut e = entry();
        e.path = "/odd\"name".to_string();
        assert!(e.format("json").contains(r#"/odd\"name"#));
    }
}
