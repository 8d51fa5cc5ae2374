use crate::domain::model::{CanonicalDomain, NormalizeStats, RuleOrder};
use crate::utils::reporter::Reporter;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Distinct domains in order of first appearance.
    pub domains: Vec<CanonicalDomain>,
    pub stats: NormalizeStats,
}

impl Normalized {
    pub fn ordered(mut self, order: RuleOrder) -> Self {
        if order == RuleOrder::Sorted {
            self.domains.sort();
        }
        self
    }
}

/// Split raw list text into distinct canonical domains.
///
/// Blank lines and `#` comments are dropped. A record that cannot be
/// canonicalized is reported and skipped; the rest of the batch continues.
pub fn normalize(raw: &str, reporter: &dyn Reporter) -> Normalized {
    let mut seen: HashSet<CanonicalDomain> = HashSet::new();
    let mut out = Normalized::default();

    for line in raw.split('\n') {
        out.stats.lines += 1;
        let record = line.trim();

        if record.is_empty() {
            out.stats.blank += 1;
            continue;
        }
        if record.starts_with('#') {
            out.stats.comments += 1;
            continue;
        }

        let domain = match CanonicalDomain::parse(record) {
            Ok(domain) => domain,
            Err(e) => {
                reporter.error(&format!("ERROR: Invalid record - {} ({})", record, e));
                out.stats.rejected += 1;
                continue;
            }
        };

        // 重複檢查
        if seen.contains(&domain) {
            out.stats.duplicates += 1;
            continue;
        }
        seen.insert(domain.clone());
        out.domains.push(domain);
    }

    reporter.debug(&format!(
        "Normalized {} lines: {} domains, {} blank, {} comments, {} duplicates, {} rejected",
        out.stats.lines,
        out.domains.len(),
        out.stats.blank,
        out.stats.comments,
        out.stats.duplicates,
        out.stats.rejected
    ));

    out
}
