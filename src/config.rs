//! Classifier configuration: blocked ranges and hostnames.
//!
//! ## Immutability
//!
//! A [`ClassifierConfig`] is frozen once built. [`ConfigBuilder`] consumes
//! `self` on each call, and [`UrlClassifier`](crate::UrlClassifier) shares
//! the finished value behind an `Arc`, so every thread sees the same tables.
//!
//! ## Extending the defaults
//!
//! Deployments add their own internal space on top of the built-in tables:
//!
//! ```rust
//! use url_gate::{ClassifierConfig, UrlClassifier, Reason};
//!
//! let config = ClassifierConfig::builder()
//!     .block_cidr("203.0.113.0/24")?
//!     .block_host("intranet.example.com")
//!     .build();
//!
//! let classifier = UrlClassifier::new(config);
//! assert_eq!(classifier.classify("http://203.0.113.5/").reason, Reason::PrivateIp);
//! # Ok::<(), url_gate::Error>(())
//! ```
//!
//! There is no allowlist: configuration can only block more.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blocklist::{AddressMatcher, HostnameBlocklist, NetworkRange};
use crate::Error;

/// Label given to ranges added through the builder or an override file.
const CUSTOM_LABEL: &str = "custom";

/// The ranges and hostnames a classifier consults.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    matcher: AddressMatcher,
    hostnames: HostnameBlocklist,
}

impl ClassifierConfig {
    /// Start from the built-in tables.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn matcher(&self) -> &AddressMatcher {
        &self.matcher
    }

    pub fn hostnames(&self) -> &HostnameBlocklist {
        &self.hostnames
    }

    /// True iff `ip` lies in a configured range of the same family.
    pub fn is_blocked_address(&self, ip: IpAddr) -> bool {
        self.matcher.is_blocked(ip)
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            matcher: AddressMatcher::with_defaults(),
            hostnames: HostnameBlocklist::with_defaults(),
        }
    }
}

/// Builder for [`ClassifierConfig`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    matcher: AddressMatcher,
    hostnames: HostnameBlocklist,
}

impl ConfigBuilder {
    /// Builder seeded with the built-in tables.
    pub fn new() -> Self {
        let defaults = ClassifierConfig::default();
        Self {
            matcher: defaults.matcher,
            hostnames: defaults.hostnames,
        }
    }

    /// Builder with no ranges and no hostnames.
    pub fn empty() -> Self {
        Self {
            matcher: AddressMatcher::default(),
            hostnames: HostnameBlocklist::default(),
        }
    }

    /// Block an IP range (CIDR notation, or a bare address for one host).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCidr`] if `cidr` does not parse.
    pub fn block_cidr(self, cidr: &str) -> Result<Self, Error> {
        let range = NetworkRange::parse(cidr, CUSTOM_LABEL)?;
        Ok(self.block_range(range))
    }

    pub fn block_range(mut self, range: NetworkRange) -> Self {
        self.matcher.push(range);
        self
    }

    /// Block a literal hostname. Matching stays exact: `*.corp` only matches
    /// the host `*.corp`.
    pub fn block_host(mut self, host: &str) -> Self {
        self.hostnames.insert(host);
        self
    }

    pub fn build(self) -> ClassifierConfig {
        tracing::debug!(
            ranges = self.matcher.ranges().len(),
            hostnames = self.hostnames.len(),
            "classifier config built"
        );
        ClassifierConfig {
            matcher: self.matcher,
            hostnames: self.hostnames,
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Deployment-specific additions, read from a TOML file.
///
/// ```toml
/// extra_cidrs = ["203.0.113.0/24", "fd12:3456::/32"]
/// extra_hostnames = ["intranet.example.com"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    /// Extra ranges to block, in CIDR notation.
    pub extra_cidrs: Vec<String>,
    /// Extra literal hostnames to block.
    pub extra_hostnames: Vec<String>,
    /// Drop the built-in tables and use only the extras.
    pub replace_defaults: bool,
}

impl ConfigOverrides {
    /// Parse overrides from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the text does not match the schema.
    pub fn from_toml_str(data: &str) -> Result<Self, Error> {
        toml::from_str(data).map_err(|e| Error::decode(e.to_string()))
    }

    /// Read overrides from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: Self =
            toml::from_str(&data).map_err(|e| Error::config(path, e.to_string()))?;
        tracing::info!(
            path = %path.display(),
            extra_cidrs = overrides.extra_cidrs.len(),
            extra_hostnames = overrides.extra_hostnames.len(),
            "loaded classifier overrides"
        );
        Ok(overrides)
    }

    /// Build the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCidr`] for the first malformed range. Nothing
    /// in an override file is silently dropped.
    pub fn into_config(self) -> Result<ClassifierConfig, Error> {
        if self.replace_defaults {
            tracing::warn!("classifier overrides replace the built-in blocklists");
        }
        let mut builder = if self.replace_defaults {
            ConfigBuilder::empty()
        } else {
            ConfigBuilder::new()
        };
        for cidr in &self.extra_cidrs {
            builder = builder.block_cidr(cidr)?;
        }
        for host in &self.extra_hostnames {
            builder = builder.block_host(host);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    // ==================== Builder tests ====================

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert!(config.is_blocked_address(ip("10.1.2.3")));
        assert!(!config.is_blocked_address(ip("93.184.216.34")));
        assert!(config.hostnames().contains("localhost"));
    }

    #[test]
    fn test_block_cidr() {
        let config = ClassifierConfig::builder()
            .block_cidr("203.0.113.0/24")
            .unwrap()
            .build();

        assert!(config.is_blocked_address(ip("203.0.113.77")));
        assert!(!config.is_blocked_address(ip("203.0.114.1")));
        // Defaults still present
        assert!(config.is_blocked_address(ip("127.0.0.1")));
    }

    #[test]
    fn test_block_ipv6_cidr() {
        let config = ClassifierConfig::builder()
            .block_cidr("2001:db8::/32")
            .unwrap()
            .build();

        assert!(config.is_blocked_address(ip("2001:db8::1")));
        assert!(!config.is_blocked_address(ip("2001:db9::1")));
    }

    #[test]
    fn test_block_single_ip() {
        let config = ConfigBuilder::empty()
            .block_cidr("198.51.100.100")
            .unwrap()
            .build();

        assert!(config.is_blocked_address(ip("198.51.100.100")));
        assert!(!config.is_blocked_address(ip("198.51.100.101")));
    }

    #[test]
    fn test_block_invalid_cidr_rejected() {
        let err = ClassifierConfig::builder().block_cidr("not-a-cidr").unwrap_err();
        assert!(matches!(err, Error::InvalidCidr { ref cidr, .. } if cidr == "not-a-cidr"));
    }

    #[test]
    fn test_custom_range_label() {
        let config = ConfigBuilder::empty()
            .block_cidr("10.9.0.0/16")
            .unwrap()
            .build();
        let range = config.matcher().matching_range(ip("10.9.1.1")).unwrap();
        assert_eq!(range.label(), "custom");
    }

    #[test]
    fn test_block_cidr_existing_network_not_duplicated() {
        let before = ClassifierConfig::default().matcher().ranges().len();
        let config = ClassifierConfig::builder()
            .block_cidr("10.0.0.0/8")
            .unwrap()
            .build();
        // Already covered by the built-in private-10 range
        assert_eq!(config.matcher().ranges().len(), before);
        assert_eq!(
            config.matcher().matching_range(ip("10.1.1.1")).unwrap().label(),
            "private-10"
        );

        let config = ConfigBuilder::empty()
            .block_cidr("10.0.0.0/8")
            .unwrap()
            .block_cidr("10.0.0.0/8")
            .unwrap()
            .build();
        assert_eq!(config.matcher().ranges().len(), 1);
    }

    #[test]
    fn test_block_host_exact_and_case_insensitive() {
        let config = ClassifierConfig::builder()
            .block_host("Blocked.Example.com")
            .build();

        assert!(config.hostnames().contains("blocked.example.com"));
        assert!(config.hostnames().contains("BLOCKED.EXAMPLE.COM"));
        assert!(!config.hostnames().contains("sub.blocked.example.com"));
    }

    #[test]
    fn test_block_host_wildcard_is_literal() {
        let config = ClassifierConfig::builder().block_host("*.corp").build();
        assert!(config.hostnames().contains("*.corp"));
        assert!(!config.hostnames().contains("db.corp"));
    }

    #[test]
    fn test_empty_builder() {
        let config = ConfigBuilder::empty().build();
        assert!(!config.is_blocked_address(ip("127.0.0.1")));
        assert!(config.hostnames().is_empty());
    }

    #[test]
    fn test_config_clone() {
        let config = ClassifierConfig::builder()
            .block_cidr("203.0.113.0/24")
            .unwrap()
            .build();
        let cloned = config.clone();
        assert!(cloned.is_blocked_address(ip("203.0.113.1")));
    }

    // ==================== Override file tests ====================

    #[test]
    fn test_overrides_from_toml() {
        let overrides = ConfigOverrides::from_toml_str(
            r#"
            extra_cidrs = ["203.0.113.0/24"]
            extra_hostnames = ["intranet.example.com"]
            "#,
        )
        .unwrap();
        assert!(!overrides.replace_defaults);

        let config = overrides.into_config().unwrap();
        assert!(config.is_blocked_address(ip("203.0.113.9")));
        assert!(config.is_blocked_address(ip("192.168.0.1")));
        assert!(config.hostnames().contains("intranet.example.com"));
        assert!(config.hostnames().contains("localhost"));
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let overrides = ConfigOverrides::from_toml_str(
            r#"
            replace_defaults = true
            extra_cidrs = ["10.0.0.0/8"]
            "#,
        )
        .unwrap();
        let config = overrides.into_config().unwrap();
        assert!(config.is_blocked_address(ip("10.0.0.1")));
        assert!(!config.is_blocked_address(ip("127.0.0.1")));
        assert!(!config.hostnames().contains("localhost"));
    }

    #[test]
    fn test_overrides_empty_file_is_defaults() {
        let overrides = ConfigOverrides::from_toml_str("").unwrap();
        assert_eq!(overrides, ConfigOverrides::default());
        let config = overrides.into_config().unwrap();
        assert_eq!(
            config.matcher().ranges().len(),
            ClassifierConfig::default().matcher().ranges().len()
        );
    }

    #[test]
    fn test_overrides_bad_cidr_is_error() {
        let overrides = ConfigOverrides::from_toml_str(r#"extra_cidrs = ["10.0.0.0/99"]"#).unwrap();
        assert!(matches!(overrides.into_config(), Err(Error::InvalidCidr { .. })));
    }

    #[test]
    fn test_overrides_unknown_field_rejected() {
        let err = ConfigOverrides::from_toml_str(r#"allow_cidrs = ["10.0.0.0/8"]"#).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.to_string().contains("allow_cidrs"));
    }

    #[test]
    fn test_overrides_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("url-gate.toml");
        fs::write(&path, "extra_hostnames = [\"build.internal\"]\n").unwrap();

        let config = ConfigOverrides::load(&path).unwrap().into_config().unwrap();
        assert!(config.hostnames().contains("build.internal"));
    }

    #[test]
    fn test_overrides_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigOverrides::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_overrides_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "extra_cidrs = 5\n").unwrap();
        assert!(matches!(ConfigOverrides::load(&path), Err(Error::Config { .. })));
    }
}
