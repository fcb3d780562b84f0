//! Error types for url_gate.
//!
//! Classification itself never fails; these errors come from building a
//! configuration or loading files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while setting up a classifier or its harness.
#[derive(Debug, Error)]
pub enum Error {
    /// The input could not be parsed into scheme + host.
    #[error("Invalid URL: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A CIDR string in a builder call or override file is malformed.
    #[error("Invalid CIDR range '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },

    /// Reading a config or case file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML text does not match the config or case-table schema.
    #[error("Invalid TOML: {message}")]
    Decode { message: String },

    /// A config or case file is not valid TOML for its schema.
    #[error("Invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_cidr(cidr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCidr {
            cidr: cidr.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}
