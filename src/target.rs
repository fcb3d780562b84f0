//! Parsing a candidate URL into the pieces the classifier looks at.

use std::borrow::Cow;
use std::net::IpAddr;

use url::{Host, Url};

use crate::blocklist::normalize_hostname;
use crate::Error;

/// A URL split into scheme, normalized host and (if the host is one) IP literal.
///
/// Nothing here is resolved: a `Target` is built from the string alone.
#[derive(Debug, Clone)]
pub struct Target {
    inner: Url,
    host: String,
    ip: Option<IpAddr>,
    zone: Option<String>,
}

impl Target {
    /// Parse a URL string.
    ///
    /// This performs:
    /// - Zone identifier removal from bracketed IPv6 hosts (`[fe80::1%25eth0]`)
    /// - WHATWG URL parsing, which also turns hex, octal, decimal and
    ///   short-form IPv4 spellings of special schemes into dotted addresses
    /// - Hostname normalization (lowercase, no trailing dot, no brackets)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the input has no scheme, no host, or
    /// is otherwise malformed.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let (rewritten, zone) = split_zone_id(input);

        let url = Url::parse(&rewritten).map_err(|e| Error::invalid_url(input, e.to_string()))?;

        let (host, ip) = match url.host() {
            None => return Err(Error::invalid_url(input, "URL must have a host")),
            Some(Host::Ipv4(v4)) => (v4.to_string(), Some(IpAddr::V4(v4))),
            Some(Host::Ipv6(v6)) => (v6.to_string(), Some(IpAddr::V6(v6))),
            Some(Host::Domain(domain)) => {
                let normalized = normalize_hostname(domain);
                // Opaque hosts of non-special schemes are not parsed by `url`
                let ip = normalized.parse::<IpAddr>().ok();
                (normalized, ip)
            }
        };

        if host.is_empty() {
            return Err(Error::invalid_url(input, "empty hostname"));
        }

        Ok(Self {
            inner: url,
            host,
            ip,
            zone,
        })
    }

    /// Lowercased scheme without the trailing colon.
    pub fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    /// Normalized host. IPv6 literals appear without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The address named by the host, if the host is an IP literal.
    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// Zone identifier stripped from a bracketed IPv6 host, if any.
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.inner.port_or_known_default()
    }

    pub fn is_http(&self) -> bool {
        matches!(self.inner.scheme(), "http" | "https")
    }

    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.inner
    }
}

/// Remove an RFC 6874 zone identifier from a bracketed IPv6 host.
///
/// `url` rejects `[fe80::1%25eth0]`, so the zone is cut out of the raw
/// string before parsing and returned separately. Inputs without one are
/// passed through untouched.
pub(crate) fn split_zone_id(input: &str) -> (Cow<'_, str>, Option<String>) {
    let Some(scheme_end) = input.find("://") else {
        return (Cow::Borrowed(input), None);
    };

    let scheme = input[..scheme_end].trim_start();
    let scheme_ok = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_ok {
        return (Cow::Borrowed(input), None);
    }

    let authority_start = scheme_end + 3;
    let rest = &input[authority_start..];
    let authority_len = rest.find(['/', '?', '#', '\\']).unwrap_or(rest.len());
    let authority = &rest[..authority_len];

    let host_offset = authority.rfind('@').map(|i| i + 1).unwrap_or(0);
    let host_part = &authority[host_offset..];
    if !host_part.starts_with('[') {
        return (Cow::Borrowed(input), None);
    }
    let Some(close) = host_part.find(']') else {
        return (Cow::Borrowed(input), None);
    };
    let Some(pct) = host_part[..close].find('%') else {
        return (Cow::Borrowed(input), None);
    };

    let raw_zone = &host_part[pct + 1..close];
    let zone = raw_zone.strip_prefix("25").unwrap_or(raw_zone).to_string();

    let base = authority_start + host_offset;
    let mut rewritten = String::with_capacity(input.len());
    rewritten.push_str(&input[..base + pct]);
    rewritten.push_str(&input[base + close..]);

    (Cow::Owned(rewritten), Some(zone))
}
