//! Classification verdicts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a URL was blocked or allowed. Exactly one fires per verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    /// The input could not be parsed into scheme + host.
    ParseError,
    /// The host is on the hostname blocklist.
    BlockedHostname,
    /// The host is an IP literal inside a blocked range.
    PrivateIp,
    /// The scheme is not http or https.
    InvalidScheme,
    /// No rule fired.
    Safe,
}

impl Reason {
    pub const ALL: [Reason; 5] = [
        Reason::ParseError,
        Reason::BlockedHostname,
        Reason::PrivateIp,
        Reason::InvalidScheme,
        Reason::Safe,
    ];

    /// Short code, e.g. `private-ip`.
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::ParseError => "parse-error",
            Reason::BlockedHostname => "blocked-hostname",
            Reason::PrivateIp => "private-ip",
            Reason::InvalidScheme => "invalid-scheme",
            Reason::Safe => "safe",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Reason::ParseError => "URL could not be parsed into a scheme and host",
            Reason::BlockedHostname => "host is on the blocked hostname list",
            Reason::PrivateIp => "host is an IP address in loopback, private, link-local or reserved space",
            Reason::InvalidScheme => "only http and https URLs may be fetched",
            Reason::Safe => "no blocking rule matched",
        }
    }

    pub fn is_blocking(self) -> bool {
        self != Reason::Safe
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reason::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown reason '{}'", s))
    }
}

/// Result of classifying one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Verdict {
    pub blocked: bool,
    pub reason: Reason,
}

impl Verdict {
    pub(crate) fn from_reason(reason: Reason) -> Self {
        Self {
            blocked: reason.is_blocking(),
            reason,
        }
    }

    pub(crate) fn safe() -> Self {
        Self::from_reason(Reason::Safe)
    }

    pub fn is_allowed(&self) -> bool {
        !self.blocked
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decision = if self.blocked { "BLOCK" } else { "ALLOW" };
        write!(f, "{} {}: {}", decision, self.reason, self.reason.description())
    }
}
