// Fixed headers around each rule set, and pulling the rules back out of a
// rendered document.

use crate::domain::model::{CanonicalDomain, FilterFormat, RuleSet};
use crate::domain::ports::RuleFormatter;
use crate::utils::error::{EtlError, Result};
use crate::utils::format::group_thousands;
use chrono::{DateTime, Local, Utc};
use std::fmt::Write;

pub const ADGUARD_TITLE: &str = "USOM Blacklist (AdGuard Format)";
pub const ADGUARD_DESCRIPTION: &str =
    "USOM zararlı URL listesinin AdGuard formatına dönüştürülmüş halini içerir";
pub const HOSTS_TITLE: &str = "USOM Blacklist (Hosts Format)";
/// Published list location named in every header, whichever mirror was fetched.
pub const USOM_LIST_URL: &str = "https://www.usom.gov.tr/url-list.txt";
pub const PROJECT_HOME: &str = "https://github.com/ramazansancar/mertcangokgoz_usom-adguard-mirror";

/// Marks the end of the static hosts preamble.
pub const HOSTS_BLOCK_MARKER: &str = "# Start USOM Blacklist";

pub const LOCALHOST_ENTRIES: [&str; 14] = [
    "127.0.0.1 localhost",
    "127.0.0.1 localhost.localdomain",
    "127.0.0.1 local",
    "255.255.255.255 broadcasthost",
    "::1 localhost",
    "::1 ip6-localhost",
    "::1 ip6-loopback",
    "fe80::1%lo0 localhost",
    "ff00::0 ip6-localnet",
    "ff00::0 ip6-mcastprefix",
    "ff02::1 ip6-allnodes",
    "ff02::2 ip6-allrouters",
    "ff02::3 ip6-allhosts",
    "0.0.0.0 0.0.0.0",
];

/// A rule set plus everything written around it.
#[derive(Debug, Clone)]
pub struct OutputDocument {
    pub rules: RuleSet,
    pub generated_at: DateTime<Local>,
}

impl OutputDocument {
    pub fn new(rules: RuleSet, generated_at: DateTime<Local>) -> Self {
        Self {
            rules,
            generated_at,
        }
    }

    pub fn format(&self) -> FilterFormat {
        self.rules.format
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match self.rules.format {
            FilterFormat::AdGuard => self.write_adguard_header(&mut out),
            FilterFormat::Hosts => self.write_hosts_header(&mut out),
        }

        for rule in &self.rules.rules {
            out.push_str(rule);
            out.push('\n');
        }
        out
    }

    fn write_adguard_header(&self, out: &mut String) {
        // writeln! into a String cannot fail
        let _ = writeln!(out, "! Title: {}", ADGUARD_TITLE);
        let _ = writeln!(out, "! Description: {}", ADGUARD_DESCRIPTION);
        let _ = writeln!(
            out,
            "! Last Modified: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "! Total Rules: {}", self.rules.len());
        let _ = writeln!(out, "! Homepage: {}", USOM_LIST_URL);
        out.push_str("!\n");
    }

    fn write_hosts_header(&self, out: &mut String) {
        let utc = self.generated_at.with_timezone(&Utc);

        let _ = writeln!(out, "# Title: {}", HOSTS_TITLE);
        out.push_str("#\n");
        out.push_str(
            "# Description: This hosts file contains USOM malicious URL list converted to hosts format\n\
             # for use with PiHole, AdGuard Home, and other DNS filtering solutions\n",
        );
        out.push_str("#\n");
        let _ = writeln!(out, "# Date: {} (UTC)", utc.format("%d %B %Y %H:%M:%S"));
        let _ = writeln!(
            out,
            "# Number of unique domains: {}",
            group_thousands(self.rules.len())
        );
        out.push_str("#\n");
        let _ = writeln!(
            out,
            "# Fetch the latest version of this file: {}",
            USOM_LIST_URL
        );
        let _ = writeln!(out, "# Project home page: {}", PROJECT_HOME);
        out.push_str("#\n");
        out.push_str("# ===============================================================\n");
        out.push('\n');

        out.push_str("# Standart localhost entries\n");
        for entry in LOCALHOST_ENTRIES {
            out.push_str(entry);
            out.push('\n');
        }
        out.push('\n');

        out.push_str("# Custom host records are listed here.\n");
        out.push('\n');
        out.push_str("# End of custom host records.\n");
        out.push_str(HOSTS_BLOCK_MARKER);
        out.push('\n');
        out.push('\n');
        out.push_str("#=====================================\n");
        out.push_str("# Title: USOM Zararlı URL Listesi\n");
        let _ = writeln!(out, "# Source: {}", USOM_LIST_URL);
        out.push('\n');
    }
}

/// Recover the domains from a rendered document.
///
/// Header, comment and blank lines are skipped; for hosts documents nothing
/// before [`HOSTS_BLOCK_MARKER`] counts. Any other line must be a rule in
/// canonical form.
pub fn extract_rules(formatter: &dyn RuleFormatter, content: &str) -> Result<Vec<CanonicalDomain>> {
    let comment = match formatter.format() {
        FilterFormat::AdGuard => '!',
        FilterFormat::Hosts => '#',
    };

    let mut lines = content.lines();
    if formatter.format() == FilterFormat::Hosts {
        lines
            .by_ref()
            .find(|line| *line == HOSTS_BLOCK_MARKER)
            .ok_or_else(|| EtlError::RecordError {
                record: HOSTS_BLOCK_MARKER.to_string(),
                reason: "hosts block marker not found".to_string(),
            })?;
    }

    lines
        .filter(|line| !line.is_empty() && !line.starts_with(comment))
        .map(|line| formatter.parse_rule(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formatter::{format_rules, AdGuardFormatter, HostsFormatter};
    use crate::core::normalizer::normalize;
    use crate::domain::model::RuleOrder;
    use crate::utils::reporter::MemoryReporter;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).single().unwrap()
    }

    fn domains(raw: &str) -> Vec<CanonicalDomain> {
        let reporter = MemoryReporter::new();
        normalize(raw, &reporter).ordered(RuleOrder::Sorted).domains
    }

    #[test]
    fn test_adguard_document_is_byte_exact() {
        let rules = format_rules(&AdGuardFormatter::default(), &domains("b.com\na.com"));
        let doc = OutputDocument::new(rules, fixed_time());

        let expected = "! Title: USOM Blacklist (AdGuard Format)\n\
            ! Description: USOM zararlı URL listesinin AdGuard formatına dönüştürülmüş halini içerir\n\
            ! Last Modified: 2024-03-05 14:07:09\n\
            ! Total Rules: 2\n\
            ! Homepage: https://www.usom.gov.tr/url-list.txt\n\
            !\n\
            ||a.com^\n\
            ||b.com^\n";
        assert_eq!(doc.render(), expected);
    }

    #[test]
    fn test_hosts_document_layout() {
        let rules = format_rules(&HostsFormatter, &domains("b.com\na.com"));
        let doc = OutputDocument::new(rules, fixed_time());
        let rendered = doc.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "# Title: USOM Blacklist (Hosts Format)");
        assert!(lines[5].starts_with("# Date: ") && lines[5].ends_with(" (UTC)"));
        assert!(lines[5].contains(" March 2024 "));
        assert_eq!(lines[6], "# Number of unique domains: 2");
        assert_eq!(
            lines[8],
            "# Fetch the latest version of this file: https://www.usom.gov.tr/url-list.txt"
        );
        assert_eq!(lines[13], "# Standart localhost entries");
        assert_eq!(&lines[14..28], &LOCALHOST_ENTRIES[..]);
        assert_eq!(lines[29], "# Custom host records are listed here.");
        assert_eq!(lines[32], HOSTS_BLOCK_MARKER);
        assert_eq!(lines[35], "# Title: USOM Zararlı URL Listesi");
        assert_eq!(lines[36], "# Source: https://www.usom.gov.tr/url-list.txt");
        assert_eq!(lines[37], "");
        assert_eq!(&lines[38..], &["0.0.0.0 a.com", "0.0.0.0 b.com"]);
        assert!(rendered.ends_with("0.0.0.0 b.com\n"));
    }

    #[test]
    fn test_hosts_count_is_comma_grouped() {
        let raw: Vec<String> = (0..1234).map(|i| format!("d{}.example", i)).collect();
        let rules = format_rules(&HostsFormatter, &domains(&raw.join("\n")));
        let rendered = OutputDocument::new(rules, fixed_time()).render();
        assert!(rendered.contains("# Number of unique domains: 1,234\n"));
    }

    #[test]
    fn test_extract_rules_skips_template() {
        let input = domains("Zed.net\nalpha.io\nalpha.io\n# x");
        for formatter in [
            &AdGuardFormatter::default() as &dyn RuleFormatter,
            &HostsFormatter as &dyn RuleFormatter,
        ] {
            let rules = format_rules(formatter, &input);
            let rendered = OutputDocument::new(rules.clone(), fixed_time()).render();

            let extracted = extract_rules(formatter, &rendered).unwrap();
            assert_eq!(extracted, input);
            assert_eq!(format_rules(formatter, &extracted), rules);
        }
    }

    #[test]
    fn test_extract_rules_rejects_corrupt_body() {
        let rendered = "! Title: x\n!\n||ok.com^\nnot a rule\n";
        assert!(extract_rules(&AdGuardFormatter::default(), rendered).is_err());
        assert!(extract_rules(&HostsFormatter, "0.0.0.0 a.com\n").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::core::formatter::{format_rules, AdGuardFormatter, HostsFormatter};
    use crate::core::normalizer::normalize;
    use crate::domain::model::RuleOrder;
    use crate::utils::reporter::MemoryReporter;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_rendered_rules_round_trip(
            lines in prop::collection::vec(
                prop_oneof!["[a-zA-Z0-9.-]{1,24}", "# [a-z]{0,8}", Just(String::new())],
                0..40,
            ),
            caret in any::<bool>(),
        ) {
            let reporter = MemoryReporter::new();
            let domains = normalize(&lines.join("\n"), &reporter)
                .ordered(RuleOrder::Sorted)
                .domains;

            let adguard = AdGuardFormatter { trailing_caret: caret };
            for formatter in [&adguard as &dyn RuleFormatter, &HostsFormatter as &dyn RuleFormatter] {
                let rules = format_rules(formatter, &domains);
                let rendered = OutputDocument::new(rules.clone(), Local::now()).render();
                let extracted = extract_rules(formatter, &rendered).unwrap();
                prop_assert_eq!(&extracted, &domains);
                prop_assert_eq!(format_rules(formatter, &extracted), rules);
            }
        }
    }
}
