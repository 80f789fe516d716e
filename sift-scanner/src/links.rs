use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Extensions of resources that are never worth fetching as pages.
pub const DENIED_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "json", "xml", "rss", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico",
    "bmp", "mp3", "mp4", "webm", "avi", "mov", "woff", "woff2", "ttf", "zip", "rar", "gz", "tar",
    "7z", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv",
];

// Scheme-qualified targets inside href-like attributes, single or double quoted.
static HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["'](https?://[^"'\s<>]+)["']"#).expect("valid href pattern")
});

/// Scan raw page text for absolute http(s) link targets, in document order.
///
/// Malformed targets are skipped. Duplicates within one page are collapsed
/// so a page linking the same URL twice offers it once.
pub fn discover_links(raw_text: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for capture in HREF_PATTERN.captures_iter(raw_text) {
        let candidate = &capture[1];
        if !is_well_formed(candidate) {
            debug!("Skipping malformed link: {}", candidate);
            continue;
        }
        if !links.iter().any(|l| l == candidate) {
            links.push(candidate.to_string());
        }
    }
    links
}

fn is_well_formed(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// True when the URL's path ends in a denied resource extension.
pub fn has_denied_extension(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return true;
    };
    let path = parsed.path().to_lowercase();
    let Some(last_segment) = path.rsplit('/').next() else {
        return false;
    };
    match last_segment.rsplit_once('.') {
        Some((_, ext)) => DENIED_EXTENSIONS.contains(&ext),
        None => false,
    }
}
