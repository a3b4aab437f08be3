use std::cmp::Reverse;
use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::exceptions::{AcceptedDeviation, SuggestedRule};
use crate::policy::{Deviation, Dimension, Priority, SkippedRecord};

pub mod dashboard;
pub mod files;

pub use dashboard::{create_dashboard, open_in_browser, render_dashboard};
pub use files::{write_reports, ReportFiles};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub total_records: usize,
    pub analyzed: usize,
    pub excluded: usize,
    pub skipped: usize,
    /// Analyzed records without any deviation.
    pub perfect_matches: usize,
    /// Analyzed records with at least one unaccepted deviation.
    pub records_with_issues: usize,
    pub accepted_deviations: usize,
    pub issues: usize,
    /// Share of analyzed records without issues, in percent.
    pub compliance_rate: f64,
    pub issues_by_dimension: IndexMap<String, usize>,
    pub issues_by_priority: IndexMap<String, usize>,
    /// Up to three countries with the most issues.
    pub top_countries: IndexMap<String, usize>,
    /// City tax issues at hotels not listed as city-tax hotels.
    pub low_priority_city_tax: usize,
    pub active_exceptions: usize,
    pub exceptions_needing_review: usize,
    pub suggested_rules: usize,
}

impl ComplianceSummary {
    /// "VAT (6 cases)" for the dimension with the most issues.
    pub fn top_issue_type(&self) -> Option<String> {
        self.issues_by_dimension
            .iter()
            .filter(|(_, count)| **count > 0)
            .max_by_key(|(_, count)| **count)
            .map(|(dimension, count)| format!("{} ({} cases)", dimension, count))
    }
}

/// Everything one run produces, ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub summary: ComplianceSummary,
    pub issues: Vec<Deviation>,
    pub accepted: Vec<AcceptedDeviation>,
    pub suggestions: Vec<SuggestedRule>,
    pub skipped: Vec<SkippedRecord>,
}

impl ComplianceReport {
    /// Issues ordered for fixing: priority, then records with more issues,
    /// then source row and dimension.
    pub fn prioritized_issues(&self) -> Vec<&Deviation> {
        let mut per_record: HashMap<usize, usize> = HashMap::new();
        for issue in &self.issues {
            *per_record.entry(issue.row).or_default() += 1;
        }

        let mut issues: Vec<&Deviation> = self.issues.iter().collect();
        issues.sort_by_key(|issue| {
            (
                Reverse(issue.priority),
                Reverse(per_record.get(&issue.row).copied().unwrap_or(0)),
                issue.row,
                issue.dimension,
            )
        });
        issues
    }

    /// Hotels ranked by issue count, descending; ties by hotel code.
    pub fn issues_by_hotel(&self) -> Vec<(String, usize)> {
        count_desc(self.issues.iter().map(|issue| issue.hotel_code.clone()))
    }
}

/// Count occurrences and sort by count descending, then key ascending.
pub(crate) fn count_desc<I>(keys: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

pub(crate) fn dimension_breakdown(issues: &[Deviation]) -> IndexMap<String, usize> {
    Dimension::ALL
        .iter()
        .map(|dimension| {
            let count = issues.iter().filter(|issue| issue.dimension == *dimension).count();
            (dimension.label().to_string(), count)
        })
        .collect()
}

pub(crate) fn priority_breakdown(issues: &[Deviation]) -> IndexMap<String, usize> {
    [Priority::High, Priority::Medium, Priority::Low]
        .iter()
        .map(|priority| {
            let count = issues.iter().filter(|issue| issue.priority == *priority).count();
            (priority.to_string(), count)
        })
        .collect()
}

pub(crate) fn country_label(country: &str) -> String {
    if country.trim().is_empty() {
        "(unknown)".to_string()
    } else {
        country.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(row: usize, hotel: &str, dimension: Dimension, priority: Priority) -> Deviation {
        Deviation {
            row,
            hotel_code: hotel.to_string(),
            rate_code: String::new(),
            rate_name: String::new(),
            country: String::new(),
            dimension,
            observed: "a".to_string(),
            expected: "b".to_string(),
            priority,
        }
    }

    #[test]
    fn test_prioritized_issues() {
        let report = ComplianceReport {
            issues: vec![
                issue(2, "AMS", Dimension::Subaccount, Priority::Medium),
                issue(3, "AMS", Dimension::Vat, Priority::High),
                issue(4, "RTM", Dimension::Vat, Priority::High),
                issue(4, "RTM", Dimension::Subaccount, Priority::Medium),
                issue(5, "RTM", Dimension::CityTax, Priority::Low),
            ],
            ..ComplianceReport::default()
        };

        let order: Vec<(usize, Dimension)> = report
            .prioritized_issues()
            .iter()
            .map(|issue| (issue.row, issue.dimension))
            .collect();

        assert_eq!(
            order,
            vec![
                (4, Dimension::Vat),
                (3, Dimension::Vat),
                (4, Dimension::Subaccount),
                (2, Dimension::Subaccount),
                (5, Dimension::CityTax),
            ]
        );
    }

    #[test]
    fn test_count_desc() {
        let counts = count_desc(["b", "a", "b", "c", "a", "b"].iter().map(|s| s.to_string()));
        assert_eq!(
            counts,
            vec![("b".to_string(), 3), ("a".to_string(), 2), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_issue_type() {
        let mut summary = ComplianceSummary::default();
        assert_eq!(summary.top_issue_type(), None);

        summary.issues_by_dimension = dimension_breakdown(&[
            issue(2, "AMS", Dimension::Vat, Priority::High),
            issue(3, "AMS", Dimension::Subaccount, Priority::Medium),
            issue(4, "AMS", Dimension::Subaccount, Priority::Medium),
        ]);
        assert_eq!(summary.top_issue_type(), Some("Subaccount (2 cases)".to_string()));
    }
}
