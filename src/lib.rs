//! # url_gate
//!
//! Pre-connection SSRF gate for a web-scraping service.
//!
//! `url_gate` decides whether an outbound fetch target is safe to contact
//! or must be blocked because it names loopback, link-local, private,
//! reserved or cloud-metadata address space. It does not make requests or
//! DNS lookups: a verdict is a pure function of the URL string and the
//! configuration.
//!
//! ## Quick Start
//!
//! ```rust
//! use url_gate::{classify, Reason};
//!
//! let verdict = classify("http://192.168.1.1/router");
//! assert!(verdict.blocked);
//! assert_eq!(verdict.reason, Reason::PrivateIp);
//!
//! assert!(!classify("https://example.com/").blocked);
//! ```
//!
//! ## What is not caught
//!
//! Hostnames are checked against a literal blocklist only and never
//! resolved. A public name whose DNS record points at `10.0.0.5` (or that
//! is rebound there between check and connect) passes. Callers must pin
//! or recheck the address they actually connect to, and must classify
//! every redirect hop (see [`UrlClassifier::classify_redirect`]).

mod blocklist;
mod classifier;
mod config;
mod error;
mod target;
mod verdict;

pub mod harness;

pub use blocklist::{AddressMatcher, HostnameBlocklist, NetworkRange};
pub use classifier::{classify, is_blocked_address, UrlClassifier};
pub use config::{ClassifierConfig, ConfigBuilder, ConfigOverrides};
pub use error::Error;
pub use target::Target;
pub use verdict::{Reason, Verdict};
