use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Unparsed body downloaded from the source list.
#[derive(Debug, Clone)]
pub struct RawListing {
    pub url: String,
    pub body: String,
}

impl RawListing {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.body.split('\n')
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }
}

/// A trimmed, lowercased record. Never empty, never a `#` comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalDomain(String);

impl CanonicalDomain {
    pub fn parse(record: &str) -> Result<Self> {
        let canonical = record.trim().to_lowercase();
        let canonical = canonical.trim();

        if canonical.is_empty() {
            return Err(EtlError::RecordError {
                record: record.to_string(),
                reason: "empty after trimming".to_string(),
            });
        }
        if canonical.starts_with('#') {
            return Err(EtlError::RecordError {
                record: record.to_string(),
                reason: "comment line".to_string(),
            });
        }

        Ok(Self(canonical.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterFormat {
    AdGuard,
    Hosts,
}

impl FilterFormat {
    pub fn name(&self) -> &'static str {
        match self {
            FilterFormat::AdGuard => "AdGuard",
            FilterFormat::Hosts => "Hosts",
        }
    }
}

impl fmt::Display for FilterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordering applied to the deduplicated domains before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RuleOrder {
    #[default]
    Sorted,
    FirstSeen,
}

/// How the two output documents are written once the rule sets exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum WriteMode {
    #[default]
    Sequential,
    Concurrent,
}

/// Formatted rule lines for one target format, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub format: FilterFormat,
    pub rules: Vec<String>,
}

impl RuleSet {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub lines: usize,
    pub blank: usize,
    pub comments: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub stats: NormalizeStats,
    pub domain_count: usize,
    pub adguard: RuleSet,
    pub hosts: RuleSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutput {
    pub format: FilterFormat,
    pub path: PathBuf,
    pub rule_count: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub source_url: String,
    pub input_lines: usize,
    pub domain_count: usize,
    pub outputs: Vec<WrittenOutput>,
}
