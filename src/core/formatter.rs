use crate::domain::model::{CanonicalDomain, FilterFormat, RuleSet};
use crate::domain::ports::RuleFormatter;
use crate::utils::error::{EtlError, Result};

pub const SINK_ADDRESS: &str = "0.0.0.0";

/// `||domain^` network rules. Without the caret the rule reads `||domain`.
#[derive(Debug, Clone, Copy)]
pub struct AdGuardFormatter {
    pub trailing_caret: bool,
}

impl Default for AdGuardFormatter {
    fn default() -> Self {
        Self {
            trailing_caret: true,
        }
    }
}

impl RuleFormatter for AdGuardFormatter {
    fn format(&self) -> FilterFormat {
        FilterFormat::AdGuard
    }

    fn format_rule(&self, domain: &CanonicalDomain) -> String {
        if self.trailing_caret {
            format!("||{}^", domain)
        } else {
            format!("||{}", domain)
        }
    }

    fn parse_rule(&self, line: &str) -> Result<CanonicalDomain> {
        let body = line.strip_prefix("||").ok_or_else(|| EtlError::RecordError {
            record: line.to_string(),
            reason: "missing '||' prefix".to_string(),
        })?;

        let body = if self.trailing_caret {
            body.strip_suffix('^').ok_or_else(|| EtlError::RecordError {
                record: line.to_string(),
                reason: "missing '^' suffix".to_string(),
            })?
        } else {
            body
        };

        canonical_exact(line, body)
    }
}

/// `0.0.0.0 domain` sink entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostsFormatter;

impl RuleFormatter for HostsFormatter {
    fn format(&self) -> FilterFormat {
        FilterFormat::Hosts
    }

    fn format_rule(&self, domain: &CanonicalDomain) -> String {
        format!("{} {}", SINK_ADDRESS, domain)
    }

    fn parse_rule(&self, line: &str) -> Result<CanonicalDomain> {
        let body = line
            .strip_prefix(SINK_ADDRESS)
            .and_then(|rest| rest.strip_prefix(' '))
            .ok_or_else(|| EtlError::RecordError {
                record: line.to_string(),
                reason: format!("missing '{} ' prefix", SINK_ADDRESS),
            })?;

        canonical_exact(line, body)
    }
}

// 只接受已正規化的內容，否則無法逐位元組重現
fn canonical_exact(line: &str, body: &str) -> Result<CanonicalDomain> {
    let domain = CanonicalDomain::parse(body)?;
    if domain.as_str() != body {
        return Err(EtlError::RecordError {
            record: line.to_string(),
            reason: "entry is not in canonical form".to_string(),
        });
    }
    Ok(domain)
}

/// Map every domain to a rule line, keeping input order.
pub fn format_rules(formatter: &dyn RuleFormatter, domains: &[CanonicalDomain]) -> RuleSet {
    RuleSet {
        format: formatter.format(),
        rules: domains.iter().map(|d| formatter.format_rule(d)).collect(),
    }
}
