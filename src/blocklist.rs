//! Blocklists for hostnames and IP address ranges.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;

use crate::Error;

/// Address space blocked by default, as `(cidr, label)` pairs.
const DEFAULT_RANGES: &[(&str, &str)] = &[
    ("0.0.0.0/8", "this-network"),
    ("10.0.0.0/8", "private-10"),
    ("100.64.0.0/10", "shared-cgnat"),
    ("127.0.0.0/8", "loopback"),
    ("169.254.0.0/16", "link-local"),
    ("172.16.0.0/12", "private-172"),
    ("192.168.0.0/16", "private-192"),
    ("224.0.0.0/4", "multicast"),
    ("240.0.0.0/4", "reserved"),
    ("::/128", "ipv6-unspecified"),
    ("::1/128", "ipv6-loopback"),
    ("fc00::/7", "ipv6-unique-local"),
    ("fe80::/10", "ipv6-link-local"),
    ("ff00::/8", "ipv6-multicast"),
];

/// Hostnames blocked by default. IP literals are left to the range table.
const DEFAULT_HOSTNAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "ip6-localhost",
    "ip6-loopback",
    "metadata.google.internal",
    "metadata.goog",
    "metadata.azure.internal",
    "instance-data",
    "instance-data.ec2.internal",
];

/// One disallowed CIDR block.
///
/// The address family is part of the range: an IPv4 range never contains an
/// IPv6 address, even an IPv4-mapped one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRange {
    net: IpNet,
    label: Cow<'static, str>,
}

impl NetworkRange {
    /// Wrap an already-parsed network.
    pub fn new(net: IpNet, label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            net: net.trunc(),
            label: label.into(),
        }
    }

    /// Parse CIDR notation (`10.0.0.0/8`, `fd00::/8`).
    ///
    /// A bare address is accepted as a single-host range.
    pub fn parse(cidr: &str, label: impl Into<Cow<'static, str>>) -> Result<Self, Error> {
        let trimmed = cidr.trim();
        let net = if trimmed.contains('/') {
            trimmed
                .parse::<IpNet>()
                .map_err(|e| Error::invalid_cidr(cidr, e.to_string()))?
        } else {
            trimmed
                .parse::<IpAddr>()
                .map(IpNet::from)
                .map_err(|e| Error::invalid_cidr(cidr, e.to_string()))?
        };
        Ok(Self::new(net, label))
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.net.contains(&ip)
    }

    pub fn network(&self) -> IpNet {
        self.net
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.net, self.label)
    }
}

/// Matches parsed addresses against a fixed set of [`NetworkRange`]s.
#[derive(Debug, Clone, Default)]
pub struct AddressMatcher {
    ranges: Vec<NetworkRange>,
}

impl AddressMatcher {
    pub fn new(ranges: Vec<NetworkRange>) -> Self {
        Self { ranges }
    }

    /// The built-in table of loopback, private, link-local and reserved space.
    pub fn with_defaults() -> Self {
        let ranges = DEFAULT_RANGES
            .iter()
            .map(|&(cidr, label)| {
                NetworkRange::parse(cidr, label).expect("built-in range table is valid CIDR")
            })
            .collect();
        Self { ranges }
    }

    /// True iff `ip` lies inside a configured range of the same family.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.matching_range(ip).is_some()
    }

    /// First configured range containing `ip`.
    pub fn matching_range(&self, ip: IpAddr) -> Option<&NetworkRange> {
        self.ranges.iter().find(|range| range.contains(ip))
    }

    pub fn ranges(&self) -> &[NetworkRange] {
        &self.ranges
    }

    /// Add a range unless the same network is already present.
    pub(crate) fn push(&mut self, range: NetworkRange) {
        if !self.ranges.iter().any(|r| r.net == range.net) {
            self.ranges.push(range);
        }
    }
}

/// Exact, case-insensitive set of blocked hostnames.
#[derive(Debug, Clone, Default)]
pub struct HostnameBlocklist {
    names: BTreeSet<String>,
}

impl HostnameBlocklist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| normalize_hostname(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_HOSTNAMES)
    }

    /// Check if a hostname is blocked. No wildcard or suffix matching.
    pub fn contains(&self, host: &str) -> bool {
        self.names.contains(&normalize_hostname(host))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub(crate) fn insert(&mut self, host: &str) {
        let normalized = normalize_hostname(host);
        if !normalized.is_empty() {
            self.names.insert(normalized);
        }
    }
}

/// Lowercase, drop IPv6 brackets and a single trailing dot (FQDN notation).
pub(crate) fn normalize_hostname(host: &str) -> String {
    let trimmed = host.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(trimmed);
    let mut normalized = unbracketed.to_lowercase();
    if normalized.ends_with('.') {
        normalized.pop();
    }
    normalized
}

/// Map IPv6 forms that embed an IPv4 address onto that IPv4 address.
///
/// Covers IPv4-mapped (`::ffff:a.b.c.d`), the deprecated IPv4-compatible
/// (`::a.b.c.d`), NAT64 well-known prefix (`64:ff9b::a.b.c.d`) and 6to4
/// (`2002:AABB:CCDD::`) forms. `::` and `::1` stay IPv6.
pub(crate) fn canonical_address(ip: IpAddr) -> IpAddr {
    let IpAddr::V6(v6) = ip else {
        return ip;
    };

    if let Some(v4) = v6.to_ipv4_mapped() {
        return IpAddr::V4(v4);
    }

    let segments = v6.segments();
    if segments[0..6] == [0, 0, 0, 0, 0, 0] && (segments[6] != 0 || segments[7] > 1) {
        return IpAddr::V4(trailing_ipv4(v6));
    }

    // 64:ff9b::/96
    if segments[0..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        return IpAddr::V4(trailing_ipv4(v6));
    }

    // 2002::/16 carries the IPv4 address in bits 16..48
    if segments[0] == 0x2002 {
        let [_, _, a, b, c, d, ..] = v6.octets();
        return IpAddr::V4(Ipv4Addr::new(a, b, c, d));
    }

    ip
}

fn trailing_ipv4(v6: Ipv6Addr) -> Ipv4Addr {
    let [.., a, b, c, d] = v6.octets();
    Ipv4Addr::new(a, b, c, d)
}
