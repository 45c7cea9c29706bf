//! Deterministic on-disk locations for mirrored assets
//!
//! `https://cdn.test:8443/a/b%20c/logo?v=2` with `image/png` lands at
//! `<root>/cdn.test_8443/a/b_20c/logo__q<hash>.png`.

use crate::url::CanonicalUrl;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Extensions for content types commonly served as page assets
const CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("text/css", ".css"),
    ("text/javascript", ".js"),
    ("application/javascript", ".js"),
    ("application/x-javascript", ".js"),
    ("application/json", ".json"),
    ("application/xml", ".xml"),
    ("text/xml", ".xml"),
    ("text/html", ".html"),
    ("text/plain", ".txt"),
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/avif", ".avif"),
    ("image/svg+xml", ".svg"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("image/bmp", ".bmp"),
    ("image/tiff", ".tif"),
    ("font/woff", ".woff"),
    ("font/woff2", ".woff2"),
    ("application/font-woff", ".woff"),
    ("font/ttf", ".ttf"),
    ("font/otf", ".otf"),
    ("application/vnd.ms-fontobject", ".eot"),
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
    ("video/quicktime", ".mov"),
    ("audio/mpeg", ".mp3"),
    ("audio/mp4", ".m4a"),
    ("audio/wav", ".wav"),
    ("audio/x-wav", ".wav"),
    ("application/pdf", ".pdf"),
];

/// Where the body of `url` is written under `root`
///
/// The path is built from the sanitized host (with port) and path segments.
/// When the last segment has no extension one is guessed from
/// `content_type`; a query string adds `__q<8 hex of SHA-256(query)>` to the
/// file stem so query variants never collide.
pub fn asset_target_path(root: &Path, url: &CanonicalUrl, content_type: Option<&str>) -> PathBuf {
    let netloc = url.netloc();
    let host = sanitize_segment(if netloc.is_empty() { "unknown-host" } else { &netloc });

    let raw_path = url.path();
    let mut parts: Vec<String> = raw_path
        .split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .map(sanitize_segment)
        .collect();
    if parts.is_empty() || raw_path.ends_with('/') {
        parts.push("index".to_string());
    }

    let mut filename = parts.pop().unwrap_or_else(|| "index".to_string());
    if suffix(&filename).is_none() {
        if let Some(ext) = content_type.and_then(extension_for) {
            filename.push_str(ext);
        }
    }
    if let Some(query) = url.query() {
        let digest = hex::encode(Sha256::digest(query.as_bytes()));
        let (stem, ext) = match suffix(&filename) {
            Some(idx) => filename.split_at(idx),
            None => (filename.as_str(), ""),
        };
        filename = format!("{}__q{}{}", stem, &digest[..8], ext);
    }
    parts.push(filename);

    let mut path = root.join(host);
    for part in parts {
        path.push(part);
    }
    path
}

/// Replaces every run of characters outside `[A-Za-z0-9._-]` with `_` and
/// trims leading/trailing `.` and `_`
pub fn sanitize_segment(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    let mut in_run = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            cleaned.push(ch);
            in_run = false;
        } else if !in_run {
            cleaned.push('_');
            in_run = true;
        }
    }
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Byte index of the extension dot, ignoring leading and trailing dots
fn suffix(name: &str) -> Option<usize> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(idx),
        _ => None,
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == mime)
        .map(|(_, ext)| *ext)
}
