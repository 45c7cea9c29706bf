use crate::config::types::{
    AssetsConfig, BrowserConfig, Config, ScriptsConfig, SiteConfig, TimeoutsConfig,
    ViewportConfig, WorkersConfig,
};
use crate::url::validate_host_pattern;
use crate::ConfigError;
use url::Url;

/// Largest worker count accepted for any pool
pub const MAX_WORKERS: usize = 64;

/// Longest settle delay accepted (milliseconds)
pub const MAX_SETTLE_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_workers_config(&config.workers)?;
    validate_browser_config(&config.browser)?;
    validate_scripts_config(&config.scripts)?;
    validate_assets_config(&config.assets)?;
    Ok(())
}

/// Validates the site section
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("site.url", &config.url)?;

    if let Some(sitemap_url) = &config.sitemap_url {
        validate_http_url("site.sitemap-url", sitemap_url)?;
    }

    if config.hosts.is_empty() {
        return Err(ConfigError::Validation(
            "site.hosts must list at least one host pattern".to_string(),
        ));
    }
    for pattern in &config.hosts {
        validate_host_pattern(&pattern.trim().to_lowercase())?;
    }

    if config.crawl_scheme != "http" && config.crawl_scheme != "https" {
        return Err(ConfigError::Validation(format!(
            "site.crawl-scheme must be 'http' or 'https', got '{}'",
            config.crawl_scheme
        )));
    }

    Ok(())
}

/// Validates that a configured URL is absolute http(s) with a host
fn validate_http_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, raw
        )));
    }

    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, raw
        )));
    }

    Ok(())
}

/// Validates worker pool sizes
fn validate_workers_config(config: &WorkersConfig) -> Result<(), ConfigError> {
    validate_worker_count("workers.capture", config.capture)?;
    validate_worker_count("workers.assets", config.assets)?;
    Ok(())
}

/// Validates a single worker count, shared with the CLI overrides
pub fn validate_worker_count(field: &str, count: usize) -> Result<(), ConfigError> {
    if count < 1 || count > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            field, MAX_WORKERS, count
        )));
    }
    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.command.trim().is_empty() {
        return Err(ConfigError::Validation(
            "browser.command cannot be empty".to_string(),
        ));
    }

    if config.settle_ms > MAX_SETTLE_MS {
        return Err(ConfigError::Validation(format!(
            "browser.settle-ms must be <= {}ms, got {}ms",
            MAX_SETTLE_MS, config.settle_ms
        )));
    }

    validate_viewport("browser.desktop-viewport", &config.desktop_viewport)?;
    validate_viewport("browser.mobile-viewport", &config.mobile_viewport)?;
    validate_timeouts(&config.timeouts)?;

    Ok(())
}

fn validate_viewport(field: &str, viewport: &ViewportConfig) -> Result<(), ConfigError> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(ConfigError::Validation(format!(
            "{} must be non-zero, got {}x{}",
            field, viewport.width, viewport.height
        )));
    }
    Ok(())
}

fn validate_timeouts(config: &TimeoutsConfig) -> Result<(), ConfigError> {
    let timeouts = [
        ("viewport", config.viewport),
        ("open", config.open),
        ("wait", config.wait),
        ("screenshot", config.screenshot),
        ("html", config.html),
        ("eval", config.eval),
    ];
    for (name, secs) in timeouts {
        if secs < 1 {
            return Err(ConfigError::Validation(format!(
                "browser.timeouts.{} must be >= 1s, got {}s",
                name, secs
            )));
        }
    }
    Ok(())
}

/// Validates that every script path is set
fn validate_scripts_config(config: &ScriptsConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("nav", &config.nav),
        ("page", &config.page),
        ("verify", &config.verify),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!(
                "scripts.{} cannot be empty",
                name
            )));
        }
    }
    Ok(())
}

/// Validates asset mirroring configuration
fn validate_assets_config(config: &AssetsConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "assets.user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "assets.timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    for host in config
        .extra_runtime_blocklist
        .iter()
        .chain(config.extra_static_allowlist.iter())
    {
        if host.starts_with("*.") {
            return Err(ConfigError::InvalidPattern(format!(
                "classifier host lists take exact hosts, got '{}'",
                host
            )));
        }
        validate_host_pattern(&host.trim().to_lowercase())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("site.url", "https://www.example.com/").is_ok());
        assert!(validate_http_url("site.url", "http://example.com").is_ok());

        assert!(matches!(
            validate_http_url("site.url", "example.com"),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(validate_http_url("site.url", "ftp://example.com").is_err());
        assert!(validate_http_url("site.url", "file:///tmp/x").is_err());
    }

    #[test]
    fn test_validate_worker_count() {
        assert!(validate_worker_count("workers.capture", 1).is_ok());
        assert!(validate_worker_count("workers.capture", MAX_WORKERS).is_ok());
        assert!(validate_worker_count("workers.capture", 0).is_err());
        assert!(validate_worker_count("workers.capture", MAX_WORKERS + 1).is_err());
    }

    #[test]
    fn test_validate_viewport() {
        let ok = ViewportConfig {
            width: 390,
            height: 844,
        };
        let zero = ViewportConfig {
            width: 0,
            height: 844,
        };
        assert!(validate_viewport("browser.mobile-viewport", &ok).is_ok());
        assert!(validate_viewport("browser.mobile-viewport", &zero).is_err());
    }

    #[test]
    fn test_validate_timeouts() {
        assert!(validate_timeouts(&TimeoutsConfig::default()).is_ok());
        let bad = TimeoutsConfig {
            eval: 0,
            ..TimeoutsConfig::default()
        };
        let err = validate_timeouts(&bad).unwrap_err();
        assert!(err.to_string().contains("eval"));
    }

    #[test]
    fn test_validate_assets_hosts() {
        let mut config = AssetsConfig::default();
        assert!(validate_assets_config(&config).is_ok());

        config.extra_static_allowlist = vec!["media.partner.net".to_string()];
        assert!(validate_assets_config(&config).is_ok());

        config.extra_runtime_blocklist = vec!["*.tracker.net".to_string()];
        assert!(matches!(
            validate_assets_config(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
