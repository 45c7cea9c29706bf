//! Resource classification
//!
//! Decides whether a resource URL discovered on a captured page is a static
//! asset worth mirroring, or runtime/API/outbound traffic to leave alone. The
//! decision is a pure function of the URL, the initiator hint and the fixed
//! host sets; it never touches the network.

pub mod rules;

use crate::url::{CanonicalUrl, SiteHosts};
use rules::{RULES, RUNTIME_HOST_BLOCKLIST, STATIC_HOST_ALLOWLIST};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Why a resource was included or excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    UnsupportedScheme,
    MissingHost,
    RuntimeHostBlocklist,
    InternalApiEndpoint,
    StaticHostAllowlist,
    StaticExtensionOrProviderRule,
    AssetInitiatorAllowlist,
    NonStaticOrOutbound,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::MissingHost => "missing_host",
            Self::RuntimeHostBlocklist => "runtime_host_blocklist",
            Self::InternalApiEndpoint => "internal_api_endpoint",
            Self::StaticHostAllowlist => "static_host_allowlist",
            Self::StaticExtensionOrProviderRule => "static_extension_or_provider_rule",
            Self::AssetInitiatorAllowlist => "asset_initiator_allowlist",
            Self::NonStaticOrOutbound => "non_static_or_outbound",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one resource URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationDecision {
    pub include: bool,
    pub reason: Reason,
}

/// The parts of a resource the rules look at
pub(crate) struct Candidate<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub initiator: &'a str,
}

/// Classifier bound to one site's first-party hosts
#[derive(Debug, Clone)]
pub struct ResourceClassifier {
    pub(crate) site_hosts: SiteHosts,
    pub(crate) runtime_blocklist: BTreeSet<String>,
    pub(crate) static_allowlist: BTreeSet<String>,
}

impl ResourceClassifier {
    /// Creates a classifier with the default host sets
    pub fn new(site_hosts: SiteHosts) -> Self {
        Self {
            site_hosts,
            runtime_blocklist: RUNTIME_HOST_BLOCKLIST.iter().map(|h| h.to_string()).collect(),
            static_allowlist: STATIC_HOST_ALLOWLIST.iter().map(|h| h.to_string()).collect(),
        }
    }

    /// Adds hosts to the runtime blocklist and static allowlist
    pub fn with_extra_hosts<B, A>(mut self, blocklist: B, allowlist: A) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        self.runtime_blocklist
            .extend(blocklist.into_iter().map(|h| h.as_ref().trim().to_lowercase()));
        self.static_allowlist
            .extend(allowlist.into_iter().map(|h| h.as_ref().trim().to_lowercase()));
        self
    }

    /// Classifies a resource URL
    ///
    /// Rules are evaluated in [`RULES`] order and the first match wins. The
    /// last rule matches everything, so every input yields exactly one
    /// decision.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_snapshot::classify::{Reason, ResourceClassifier};
    /// use site_snapshot::url::{canonicalize_resource_url, SiteHosts};
    ///
    /// let classifier = ResourceClassifier::new(SiteHosts::new(["example.com"]).unwrap());
    /// let url = canonicalize_resource_url("https://www.google-analytics.com/collect.png").unwrap();
    /// let decision = classifier.classify(&url, Some("img"));
    /// assert!(!decision.include);
    /// assert_eq!(decision.reason, Reason::RuntimeHostBlocklist);
    /// ```
    pub fn classify(&self, url: &CanonicalUrl, initiator: Option<&str>) -> ClassificationDecision {
        let scheme = url.scheme().to_ascii_lowercase();
        let host = url.host().unwrap_or("").to_lowercase();
        let initiator = initiator.unwrap_or("").trim().to_ascii_lowercase();
        let candidate = Candidate {
            scheme: &scheme,
            host: &host,
            path: url.path(),
            initiator: &initiator,
        };

        for rule in RULES {
            if (rule.matches)(self, &candidate) {
                return ClassificationDecision {
                    include: rule.include,
                    reason: rule.reason,
                };
            }
        }

        // Unreachable while the table ends in its catch-all
        ClassificationDecision {
            include: false,
            reason: Reason::NonStaticOrOutbound,
        }
    }

    /// Describes the rule chain for `asset_filter_rules.json`
    pub fn describe_rules(&self, exclusions: &BTreeMap<Reason, usize>) -> FilterRulesDocument {
        FilterRulesDocument {
            generated_at: chrono::Utc::now().to_rfc3339(),
            site_hosts: self.site_hosts.patterns().to_vec(),
            runtime_host_blocklist: self.runtime_blocklist.iter().cloned().collect(),
            static_host_allowlist: self.static_allowlist.iter().cloned().collect(),
            allowed_asset_initiator_types: {
                let mut types: Vec<String> = rules::ASSET_INITIATOR_ALLOWLIST
                    .iter()
                    .map(|t| t.to_string())
                    .collect();
                types.sort();
                types
            },
            static_extensions: rules::STATIC_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            rules: RULES
                .iter()
                .map(|rule| RuleDescription {
                    id: rule.id.to_string(),
                    result: if rule.include { "include" } else { "exclude" }.to_string(),
                    reason: rule.reason,
                    description: rule.description.to_string(),
                })
                .collect(),
            exclusions: exclusions
                .iter()
                .map(|(reason, count)| (reason.as_str().to_string(), *count))
                .collect(),
        }
    }
}

/// Serialized form of the rule chain
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRulesDocument {
    pub generated_at: String,
    pub site_hosts: Vec<String>,
    pub runtime_host_blocklist: Vec<String>,
    pub static_host_allowlist: Vec<String>,
    pub allowed_asset_initiator_types: Vec<String>,
    pub static_extensions: Vec<String>,
    pub rules: Vec<RuleDescription>,
    /// Excluded candidates of this run, by reason
    pub exclusions: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleDescription {
    pub id: String,
    pub result: String,
    pub reason: Reason,
    pub description: String,
}
