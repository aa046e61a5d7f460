// Summary report over a set of PolicyRecords

use super::policy::PolicyRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate counts over retrieved policies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyReport {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub linked: usize,
    pub unlinked: usize,
    pub total_links: usize,
    /// Policy count per domain; records with no domain are keyed by ""
    pub by_domain: BTreeMap<String, usize>,
}

impl PolicyReport {
    pub fn from_records(records: &[PolicyRecord]) -> Self {
        let mut report = PolicyReport::default();

        for record in records {
            report.total += 1;
            if record.is_enabled {
                report.enabled += 1;
            } else {
                report.disabled += 1;
            }

            let links = record.link_count();
            if links > 0 {
                report.linked += 1;
            } else {
                report.unlinked += 1;
            }
            report.total_links += links;

            *report.by_domain.entry(record.domain.clone()).or_default() += 1;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_report_counts() {
        let mut a = PolicyRecord::with_identity("A", Uuid::new_v4());
        a.domain = "corp.example.com".to_string();
        a.link_to("OU=Servers,DC=corp").unwrap();
        a.link_to("OU=Laptops,DC=corp").unwrap();

        let mut b = PolicyRecord::with_identity("B", Uuid::new_v4());
        b.domain = "corp.example.com".to_string();
        b.is_enabled = false;

        let c = PolicyRecord::with_identity("C", Uuid::new_v4());

        let report = PolicyReport::from_records(&[a, b, c]);

        assert_eq!(report.total, 3);
        assert_eq!(report.enabled, 2);
        assert_eq!(report.disabled, 1);
        assert_eq!(report.linked, 1);
        assert_eq!(report.unlinked, 2);
        assert_eq!(report.total_links, 2);
        assert_eq!(report.by_domain["corp.example.com"], 2);
        assert_eq!(report.by_domain[""], 1);
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(PolicyReport::from_records(&[]), PolicyReport::default());
    }
}
