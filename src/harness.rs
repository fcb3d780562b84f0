//! Verification harness: drive a classifier with a table of expected outcomes.
//!
//! The case table is loaded from a file kept apart from the classifier's
//! configuration, so fixtures never turn into policy.
//!
//! ```toml
//! [[case]]
//! url = "http://localhost/"
//! blocked = true
//! reason = "blocked-hostname"
//! description = "loopback hostname"
//! ```
//!
//! Leaving `reason` out asserts only `blocked`.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::UrlClassifier;
use crate::verdict::{Reason, Verdict};
use crate::Error;

/// One URL with its expected outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Case {
    pub url: String,
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    #[serde(default)]
    pub description: String,
}

impl Case {
    pub fn new(url: impl Into<String>, blocked: bool, reason: Option<Reason>) -> Self {
        Self {
            url: url.into(),
            blocked,
            reason,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether `verdict` satisfies this case.
    pub fn accepts(&self, verdict: &Verdict) -> bool {
        verdict.blocked == self.blocked && self.reason.map_or(true, |r| r == verdict.reason)
    }
}

/// A table of [`Case`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseTable {
    #[serde(rename = "case", default)]
    pub cases: Vec<Case>,
}

impl CaseTable {
    pub fn new(cases: Vec<Case>) -> Self {
        Self { cases }
    }

    /// Parse a case table from TOML text.
    pub fn from_toml_str(data: &str) -> Result<Self, Error> {
        toml::from_str(data).map_err(|e| Error::decode(e.to_string()))
    }

    /// Read a case table from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table: Self = toml::from_str(&data).map_err(|e| Error::config(path, e.to_string()))?;
        tracing::info!(path = %path.display(), cases = table.len(), "loaded case table");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    pub case: Case,
    pub verdict: Verdict,
    pub passed: bool,
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "PASS" } else { "FAIL" };
        let expected = match self.case.reason {
            Some(reason) => format!("blocked={} reason={}", self.case.blocked, reason),
            None => format!("blocked={}", self.case.blocked),
        };
        write!(
            f,
            "[{}] {} expected {} got blocked={} reason={}",
            status, self.case.url, expected, self.verdict.blocked, self.verdict.reason
        )?;
        if !self.case.description.is_empty() {
            write!(f, " ({})", self.case.description)?;
        }
        Ok(())
    }
}

/// Pass/fail counts plus per-case detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub outcomes: Vec<CaseOutcome>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} total",
            self.passed(),
            self.failed(),
            self.total()
        )
    }
}

/// Classify every case and compare against its expectation.
pub fn run(classifier: &UrlClassifier, table: &CaseTable) -> Report {
    let outcomes = table
        .cases
        .iter()
        .map(|case| {
            let verdict = classifier.classify(&case.url);
            let passed = case.accepts(&verdict);
            if !passed {
                tracing::warn!(url = %case.url, got = %verdict.reason, "case failed");
            }
            CaseOutcome {
                case: case.clone(),
                verdict,
                passed,
            }
        })
        .collect();
    Report { outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        [[case]]
        url = "http://localhost/"
        blocked = true
        reason = "blocked-hostname"
        description = "loopback hostname"

        [[case]]
        url = "http://127.0.0.1:8080/admin"
        blocked = true

        [[case]]
        url = "https://example.com/"
        blocked = false
        reason = "safe"
    "#;

    #[test]
    fn test_parse_table() {
        let table = CaseTable::from_toml_str(TABLE).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.cases[0].reason, Some(Reason::BlockedHostname));
        assert_eq!(table.cases[0].description, "loopback hostname");
        assert_eq!(table.cases[1].reason, None);
        assert!(table.cases[1].description.is_empty());
    }

    #[test]
    fn test_parse_table_rejects_unknown_reason() {
        let bad = r#"
            [[case]]
            url = "http://x/"
            blocked = true
            reason = "nope"
        "#;
        let err = CaseTable::from_toml_str(bad).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_run_all_pass() {
        let table = CaseTable::from_toml_str(TABLE).unwrap();
        let report = run(&UrlClassifier::default(), &table);
        assert_eq!(report.passed(), 3);
        assert_eq!(report.failed(), 0);
        assert!(report.all_passed());
        assert_eq!(report.to_string(), "3 passed, 0 failed, 3 total");
    }

    #[test]
    fn test_run_reports_failure_detail() {
        let table = CaseTable::new(vec![
            Case::new("https://example.com/", true, Some(Reason::PrivateIp))
                .with_description("deliberately wrong"),
            Case::new("ftp://example.com/", true, Some(Reason::InvalidScheme)),
        ]);
        let report = run(&UrlClassifier::default(), &table);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.verdict.reason, Reason::Safe);
        let line = failure.to_string();
        assert!(line.starts_with("[FAIL] https://example.com/"));
        assert!(line.contains("(deliberately wrong)"));
    }

    #[test]
    fn test_blocked_only_expectation() {
        let case = Case::new("http://127.0.0.1/", true, None);
        assert!(case.accepts(&Verdict::from_reason(Reason::PrivateIp)));
        assert!(case.accepts(&Verdict::from_reason(Reason::BlockedHostname)));
        assert!(!case.accepts(&Verdict::from_reason(Reason::Safe)));
    }

    #[test]
    fn test_run_is_idempotent() {
        let table = CaseTable::from_toml_str(TABLE).unwrap();
        let classifier = UrlClassifier::default();
        assert_eq!(run(&classifier, &table), run(&classifier, &table));
    }

    #[test]
    fn test_empty_table() {
        let report = run(&UrlClassifier::default(), &CaseTable::default());
        assert_eq!(report.total(), 0);
        assert!(report.all_passed());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CaseTable::load(&dir.path().join("cases.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
