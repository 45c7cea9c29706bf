use crate::url::CanonicalUrl;
use crate::ConfigError;

/// The set of hosts that make up "the site"
///
/// Patterns are either exact (`www.example.com`) or wildcard
/// (`*.example.com`, which also matches the bare `example.com`). Hosts are
/// compared lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteHosts {
    patterns: Vec<String>,
}

impl SiteHosts {
    /// Builds the host set, rejecting malformed patterns
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().to_lowercase();
            validate_host_pattern(&pattern)?;
            if !out.contains(&pattern) {
                out.push(pattern);
            }
        }
        Ok(Self { patterns: out })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if `host` belongs to the site
    pub fn contains(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.patterns
            .iter()
            .any(|pattern| matches_host_pattern(pattern, &host))
    }

    /// Returns true if the URL's host belongs to the site
    pub fn is_internal(&self, url: &CanonicalUrl) -> bool {
        url.host().map(|h| self.contains(h)).unwrap_or(false)
    }
}

/// Checks a lowercase host against an exact or `*.`-prefixed pattern
pub fn matches_host_pattern(pattern: &str, host: &str) -> bool {
    if host.is_empty() {
        return false;
    }
    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}

/// Validates a host pattern as accepted in the configuration
pub fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    if base.is_empty() {
        return Err(ConfigError::InvalidPattern(format!(
            "empty host pattern: {:?}",
            pattern
        )));
    }
    if base.starts_with('.') || base.ends_with('.') || base.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "malformed host pattern: {}",
            pattern
        )));
    }
    if !base
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "host pattern may only contain [a-z0-9.-]: {}",
            pattern
        )));
    }
    Ok(())
}
