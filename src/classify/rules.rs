//! Fixed host and extension sets plus the ordered rule table
//!
//! The table is the single source for both the decision logic and the
//! `asset_filter_rules.json` description.

use crate::classify::{Candidate, Reason, ResourceClassifier};

/// Telemetry, analytics and API-registry hosts that only carry runtime traffic
pub const RUNTIME_HOST_BLOCKLIST: &[&str] = &[
    "featureassets.org",
    "prodregistryv2.org",
    "cdn.mxpnl.com",
    "www.google-analytics.com",
    "www.googletagmanager.com",
    "log.pinterest.com",
    "graph.facebook.com",
    "clanker-events.squarespace.com",
];

/// CDN and font hosts whose content is always static
pub const STATIC_HOST_ALLOWLIST: &[&str] = &[
    "assets.squarespace.com",
    "images.squarespace-cdn.com",
    "static1.squarespace.com",
    "definitions.sqspcdn.com",
    "use.typekit.com",
    "p.typekit.net",
    "fonts.googleapis.com",
    "fonts.gstatic.com",
    "ajax.googleapis.com",
    "maps.gstatic.com",
];

/// File extensions (lowercase, with dot) treated as static files
pub const STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".mjs", ".json", ".xml", ".map", ".png", ".jpg", ".jpeg", ".gif", ".webp",
    ".avif", ".svg", ".ico", ".bmp", ".tif", ".tiff", ".woff", ".woff2", ".ttf", ".otf", ".eot",
    ".mp4", ".webm", ".mov", ".mp3", ".m4a", ".wav", ".pdf",
];

/// Initiator types that mark a resource as an asset load
pub const ASSET_INITIATOR_ALLOWLIST: &[&str] =
    &["img", "image", "link", "script", "css", "font", "video", "audio"];

/// Image CDN whose `/content/` paths are static even without an extension
pub const IMAGE_CDN_HOST: &str = "images.squarespace-cdn.com";

/// Font providers whose `/css` endpoints serve stylesheets
pub const FONT_CSS_HOSTS: &[&str] = &["fonts.googleapis.com", "use.typekit.com"];

/// One entry of the ordered rule chain
pub struct Rule {
    pub id: &'static str,
    pub reason: Reason,
    pub include: bool,
    pub description: &'static str,
    pub(crate) matches: fn(&ResourceClassifier, &Candidate<'_>) -> bool,
}

/// The rule chain, evaluated top to bottom; the first match decides
pub static RULES: &[Rule] = &[
    Rule {
        id: "reject_unsupported_schemes",
        reason: Reason::UnsupportedScheme,
        include: false,
        description: "Only http and https resources can be mirrored.",
        matches: |_, c| c.scheme != "http" && c.scheme != "https",
    },
    Rule {
        id: "reject_missing_host",
        reason: Reason::MissingHost,
        include: false,
        description: "Resources without a host cannot be fetched.",
        matches: |_, c| c.host.is_empty(),
    },
    Rule {
        id: "reject_runtime_hosts",
        reason: Reason::RuntimeHostBlocklist,
        include: false,
        description: "Block telemetry/API providers that are runtime-only and not static mirror candidates.",
        matches: |classifier, c| classifier.runtime_blocklist.contains(c.host),
    },
    Rule {
        id: "reject_internal_api_paths",
        reason: Reason::InternalApiEndpoint,
        include: false,
        description: "Block first-party /api/ endpoints from static asset mirroring.",
        matches: |classifier, c| classifier.site_hosts.contains(c.host) && c.path.starts_with("/api/"),
    },
    Rule {
        id: "allow_known_static_hosts",
        reason: Reason::StaticHostAllowlist,
        include: true,
        description: "Allow static CDNs and font providers used by captured pages.",
        matches: |classifier, c| classifier.static_allowlist.contains(c.host),
    },
    Rule {
        id: "allow_static_extension_or_provider_pattern",
        reason: Reason::StaticExtensionOrProviderRule,
        include: true,
        description: "Allow URLs that match known static extensions/provider patterns.",
        matches: |_, c| looks_like_static(c.host, c.path),
    },
    Rule {
        id: "allow_asset_initiator_types",
        reason: Reason::AssetInitiatorAllowlist,
        include: true,
        description: "Allow non-API resources discovered via static asset initiator types.",
        matches: |_, c| {
            ASSET_INITIATOR_ALLOWLIST.contains(&c.initiator) && !c.path.contains("/api/")
        },
    },
    Rule {
        id: "exclude_non_static_or_outbound",
        reason: Reason::NonStaticOrOutbound,
        include: false,
        description: "Exclude unresolved non-static URLs so outbound destinations remain outbound links.",
        matches: |_, _| true,
    },
];

/// Extension of the last path segment, lowercased and including the dot
///
/// Dot-files such as `/.well-known` have no extension.
pub fn path_extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or("");
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(name[idx..].to_ascii_lowercase()),
        _ => None,
    }
}

/// Static file extension or a known provider pattern
pub fn looks_like_static(host: &str, path: &str) -> bool {
    if let Some(ext) = path_extension(path) {
        if STATIC_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }
    if host == IMAGE_CDN_HOST && path.contains("/content/") {
        return true;
    }
    FONT_CSS_HOSTS.contains(&host) && path.contains("/css")
}
