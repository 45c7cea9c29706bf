use crate::UrlError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// Scheme used when the input has none
pub const DEFAULT_SCHEME: &str = "https";

/// Options controlling how a raw URL string is canonicalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalizeOptions<'a> {
    /// Scheme added to inputs that carry none
    pub default_scheme: &'a str,

    /// When set, replaces whatever scheme the input had
    pub force_scheme: Option<&'a str>,
}

impl<'a> CanonicalizeOptions<'a> {
    /// Options used for the crawl inventory: every page folds onto `scheme`
    pub fn crawl(scheme: &'a str) -> Self {
        Self {
            default_scheme: scheme,
            force_scheme: Some(scheme),
        }
    }

    /// Options used for resource URLs: the original scheme is preserved
    pub fn resource() -> Self {
        Self {
            default_scheme: DEFAULT_SCHEME,
            force_scheme: None,
        }
    }
}

/// A URL in canonical form
///
/// Two canonical URLs are equal exactly when their string forms are equal,
/// and they sort lexicographically by that string.
#[derive(Debug, Clone)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Lowercased host, if any
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Query string without the leading `?`; `None` when absent or empty
    pub fn query(&self) -> Option<&str> {
        self.0.query().filter(|q| !q.is_empty())
    }

    /// Host plus explicit port, as used for on-disk asset directories
    pub fn netloc(&self) -> String {
        match (self.0.host_str(), self.0.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        }
    }
}

impl PartialEq for CanonicalUrl {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for CanonicalUrl {}

impl Hash for CanonicalUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Ord for CanonicalUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for CanonicalUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for CanonicalUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CanonicalUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        canonicalize(&raw, CanonicalizeOptions::resource()).map_err(serde::de::Error::custom)
    }
}

/// Canonicalizes a URL string
///
/// # Canonicalization Steps
///
/// 1. Trim; reject empty input
/// 2. Add `default_scheme` when the input has none (`//host/x` and `host/x`)
/// 3. Parse; reject if malformed or host-less
/// 4. Reject hosts with characters outside `[a-z0-9.-]` (host is lowercased by parsing)
/// 5. Apply `force_scheme`, if any
/// 6. Drop default ports (80 for http, 443 for https)
/// 7. Drop the fragment, keep the query
/// 8. Remove trailing slashes from non-root paths; empty path becomes `/`
///
/// # Examples
///
/// ```
/// use site_snapshot::url::{canonicalize, CanonicalizeOptions};
///
/// let url = canonicalize("http://Example.COM:80/a/#top", CanonicalizeOptions::crawl("https")).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/a");
/// ```
pub fn canonicalize(raw: &str, options: CanonicalizeOptions<'_>) -> Result<CanonicalUrl, UrlError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_default = |rest: &str| Url::parse(&format!("{}://{}", options.default_scheme, rest));
    let parsed = if let Some(rest) = value.strip_prefix("//") {
        with_default(rest)
    } else {
        match Url::parse(value) {
            // `host:8080/path` parses as scheme `host`; treat it as scheme-less
            Ok(url) if !url.has_host() && looks_like_host_port(value) => with_default(value),
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => with_default(value),
            Err(e) => Err(e),
        }
    };
    let mut url = parsed.map_err(|e| UrlError::Parse(e.to_string()))?;

    let host = match url.host_str() {
        Some(h) if !h.is_empty() => h.to_lowercase(),
        _ => return Err(UrlError::MissingHost),
    };

    // Credentials never take part in identity
    let _ = url.set_username("");
    let _ = url.set_password(None);
    if !host
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(UrlError::InvalidHost(host));
    }

    let source_scheme = url.scheme().to_string();
    let explicit_port = url.port();

    if let Some(forced) = options.force_scheme {
        if url.scheme() != forced {
            let mut rebuilt = format!("{}://{}", forced, host);
            if let Some(port) = explicit_port {
                rebuilt.push_str(&format!(":{}", port));
            }
            rebuilt.push_str(url.path());
            if let Some(query) = url.query() {
                rebuilt.push('?');
                rebuilt.push_str(query);
            }
            url = Url::parse(&rebuilt).map_err(|e| UrlError::Parse(e.to_string()))?;
        }
    }

    if let Some(port) = explicit_port {
        if is_default_port(&source_scheme, port) || is_default_port(url.scheme(), port) {
            url.set_port(None)
                .map_err(|_| UrlError::Parse(format!("cannot clear port on {}", url)))?;
        }
    }

    url.set_fragment(None);

    let path = collapse_trailing_slash(url.path());
    url.set_path(&path);

    // `Url` keeps an empty `?`; an empty query carries no information
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(CanonicalUrl(url))
}

/// Canonicalizes a page URL for the crawl inventory (scheme forced to https)
pub fn canonicalize_crawl_url(raw: &str) -> Result<CanonicalUrl, UrlError> {
    canonicalize(raw, CanonicalizeOptions::crawl(DEFAULT_SCHEME))
}

/// Canonicalizes a resource URL, preserving its scheme
pub fn canonicalize_resource_url(raw: &str) -> Result<CanonicalUrl, UrlError> {
    canonicalize(raw, CanonicalizeOptions::resource())
}

fn looks_like_host_port(value: &str) -> bool {
    value
        .split_once(':')
        .map(|(_, rest)| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(false)
}

fn is_default_port(scheme: &str, port: u16) -> bool {
    matches!((scheme, port), ("http", 80) | ("https", 443))
}

fn collapse_trailing_slash(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
