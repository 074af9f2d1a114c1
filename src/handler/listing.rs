//! Directory listing module
//!
//! Renders an HTML index for directories that have no index file.
//! Directories sort before files, both alphabetically.

use std::io;
use std::path::Path;

use chrono::{DateTime, Local};

/// One row of a directory listing.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Local>>,
}

/// Collect the visible entries of a directory.
///
/// Entries whose names are not valid UTF-8 are skipped; they could not be
/// linked to reliably anyway.
pub async fn read_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(item) = reader.next_entry().await? {
        let Ok(name) = item.file_name().into_string() else {
            continue;
        };

        let metadata = item.metadata().await.ok();
        let is_dir = metadata.as_ref().is_some_and(std::fs::Metadata::is_dir);
        entries.push(Entry {
            name,
            is_dir,
            size: metadata.as_ref().and_then(|m| (!m.is_dir()).then(|| m.len())),
            modified: metadata
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Local>::from),
        });
    }

    sort(&mut entries);
    Ok(entries)
}

/// Sort entries for display: directories first, then by name.
pub fn sort(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
}

/// Render the listing page for `request_path`.
pub fn render_html(request_path: &str, entries: &[Entry]) -> String {
    let title = format!("Directory listing for {}", escape_html(request_path));
    let mut rows = String::new();

    if request_path != "/" {
        rows.push_str("<tr><td><a href=\"../\">../</a></td><td></td><td></td></tr>\n");
    }

    for entry in entries {
        let display = if entry.is_dir {
            format!("{}/", escape_html(&entry.name))
        } else {
            escape_html(&entry.name)
        };
        let href = if entry.is_dir {
            format!("{}/", encode_href(&entry.name))
        } else {
            encode_href(&entry.name)
        };
        let size = entry
            .size
            .map(|s| s.to_string())
            .unwrap_or_default();
        let modified = entry
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        rows.push_str(&format!(
            "<tr><td><a href=\"{href}\">{display}</a></td><td>{size}</td><td>{modified}</td></tr>\n"
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\nbody {{ font-family: monospace; margin: 2em; }}\n\
         table {{ border-collapse: collapse; }}\n\
         td {{ padding: 0.15em 1.5em 0.15em 0; text-align: left; }}\n\
         </style>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n\
         <table>\n{rows}</table>\n<hr>\n</body>\n</html>\n"
    )
}

/// Escape text for safe inclusion in HTML.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Percent-encode the characters that would break an href attribute or be
/// misread as URL syntax.
fn encode_href(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '#' | '?' | ' ' | '"' | '<' | '>' => {
                out.push_str(&format!("%{:02X}", ch as u32));
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64) -> Entry {
        Entry {
            name: name.to_string(),
            is_dir: false,
            size: Some(size),
            modified: None,
        }
    }

    fn dir(name: &str) -> Entry {
        Entry {
            name: name.to_string(),
            is_dir: true,
            size: None,
            modified: None,
        }
    }

    #[test]
    fn directories_sort_before_files() {
        let mut entries = vec![file("zz.txt", 1), dir("media"), file("aa.txt", 1), dir("docs")];
        sort(&mut entries);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "media", "aa.txt", "zz.txt"]);
    }

    #[test]
    fn render_links_and_escapes() {
        let entries = vec![dir("clips"), file("a<b>.mp4", 42)];
        let html = render_html("/media/", &entries);

        assert!(html.contains("Directory listing for /media/"));
        assert!(html.contains("<a href=\"clips/\">clips/</a>"));
        assert!(html.contains("a&lt;b&gt;.mp4"));
        assert!(html.contains("href=\"a%3Cb%3E.mp4\""));
        assert!(html.contains("<td>42</td>"));
        // non-root listing offers a parent link
        assert!(html.contains("href=\"../\""));
    }

    #[test]
    fn root_listing_has_no_parent_link() {
        let html = render_html("/", &[]);
        assert!(!html.contains("href=\"../\""));
    }

    #[test]
    fn hrefs_encode_reserved_characters() {
        assert_eq!(encode_href("my clip.mp4"), "my%20clip.mp4");
        assert_eq!(encode_href("100%.txt"), "100%25.txt");
        assert_eq!(encode_href("a#b?c"), "a%23b%3Fc");
    }
}
