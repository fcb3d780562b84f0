//! URL classification.

use std::net::IpAddr;
use std::sync::{Arc, LazyLock};

use url::Url;

use crate::blocklist::canonical_address;
use crate::config::ClassifierConfig;
use crate::target::{split_zone_id, Target};
use crate::verdict::{Reason, Verdict};

static DEFAULT_CLASSIFIER: LazyLock<UrlClassifier> = LazyLock::new(UrlClassifier::default);

/// Classifies outbound fetch targets against an immutable [`ClassifierConfig`].
///
/// Cloning is cheap and clones share the configuration.
#[derive(Debug, Clone, Default)]
pub struct UrlClassifier {
    config: Arc<ClassifierConfig>,
}

impl UrlClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a URL before any connection is made.
    ///
    /// Rules are evaluated in order and the first match wins:
    /// 1. Input that does not parse into scheme + host → `parse-error`
    /// 2. Host on the hostname blocklist → `blocked-hostname`
    /// 3. Host is an IP literal in a blocked range → `private-ip`
    /// 4. Scheme other than http/https → `invalid-scheme`
    /// 5. Otherwise → `safe`
    ///
    /// Hostnames are never resolved. A name whose DNS record points into
    /// private space passes here; the caller must recheck the address it
    /// actually connects to.
    ///
    /// # Example
    ///
    /// ```rust
    /// use url_gate::{UrlClassifier, Reason};
    ///
    /// let classifier = UrlClassifier::default();
    /// let verdict = classifier.classify("http://169.254.169.254/latest/meta-data/");
    /// assert!(verdict.blocked);
    /// assert_eq!(verdict.reason, Reason::PrivateIp);
    /// ```
    pub fn classify(&self, url: &str) -> Verdict {
        let target = match Target::parse(url) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!(url, error = %e, "blocked: parse error");
                return Verdict::from_reason(Reason::ParseError);
            }
        };
        self.classify_target(&target)
    }

    /// Classify a parsed target.
    pub fn classify_target(&self, target: &Target) -> Verdict {
        let url = target.as_str();

        if self.config.hostnames().contains(target.host()) {
            tracing::debug!(url, host = target.host(), "blocked: hostname on blocklist");
            return Verdict::from_reason(Reason::BlockedHostname);
        }

        if let Some(ip) = target.ip() {
            let ip = canonical_address(ip);
            if let Some(range) = self.config.matcher().matching_range(ip) {
                tracing::debug!(
                    url,
                    %ip,
                    range = %range.network(),
                    label = range.label(),
                    zone = target.zone(),
                    "blocked: address in disallowed range"
                );
                return Verdict::from_reason(Reason::PrivateIp);
            }
        }

        if !target.is_http() {
            tracing::debug!(url, scheme = target.scheme(), "blocked: scheme not allowed");
            return Verdict::from_reason(Reason::InvalidScheme);
        }

        Verdict::safe()
    }

    /// Classify the target of a redirect.
    ///
    /// `location` may be relative; it is resolved against `from` the way a
    /// client following the redirect would. Each hop needs its own call.
    pub fn classify_redirect(&self, from: &str, location: &str) -> Verdict {
        match resolve_redirect_url(from, location) {
            Some(next) => self.classify(&next),
            None => {
                tracing::debug!(from, location, "blocked: unresolvable redirect");
                Verdict::from_reason(Reason::ParseError)
            }
        }
    }

    /// True iff `ip` lies in a configured range of the same family.
    pub fn is_blocked_address(&self, ip: IpAddr) -> bool {
        self.config.is_blocked_address(ip)
    }
}

/// Classify a URL with the built-in configuration.
///
/// ```rust
/// assert!(url_gate::classify("http://localhost/").blocked);
/// assert!(!url_gate::classify("https://example.com/").blocked);
/// ```
pub fn classify(url: &str) -> Verdict {
    DEFAULT_CLASSIFIER.classify(url)
}

/// Check an address against the built-in range table.
pub fn is_blocked_address(ip: IpAddr) -> bool {
    DEFAULT_CLASSIFIER.is_blocked_address(ip)
}

/// Resolve a redirect URL (which may be relative) against the base URL.
///
/// An absolute `location` is returned as given so zone identifiers survive
/// to [`Target::parse`]; `Url::join` would reject them.
fn resolve_redirect_url(base: &str, location: &str) -> Option<String> {
    let location = location.trim();
    let (location_rewritten, _) = split_zone_id(location);
    if Url::parse(&location_rewritten).is_ok() {
        return Some(location.to_string());
    }

    let (base_rewritten, _) = split_zone_id(base);
    let base_url = Url::parse(&base_rewritten).ok()?;

    // Scheme-relative: take the scheme from the base, keep the authority as written
    if location.starts_with("//") {
        return Some(format!("{}:{}", base_url.scheme(), location));
    }

    let resolved = base_url.join(location).ok()?;
    Some(resolved.to_string())
}
