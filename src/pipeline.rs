use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::exceptions::{suggest_rules, ExceptionsFile, DEFAULT_MIN_OCCURRENCES};
use crate::policy::{ComplianceStandards, Dimension, Priority};
use crate::records::RatePlanRecord;
use crate::report::{
    count_desc, country_label, dimension_breakdown, priority_breakdown, ComplianceReport, ComplianceSummary,
};

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub min_occurrences: usize,
    /// Reference date for exception review checks.
    pub today: NaiveDate,
}

impl PipelineOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
            today,
        }
    }
}

/// Evaluate, match and suggest in one deterministic pass. No I/O.
pub fn run_pipeline(
    records: &[RatePlanRecord],
    standards: &ComplianceStandards,
    exceptions: &ExceptionsFile,
    options: &PipelineOptions,
) -> ComplianceReport {
    let evaluation = standards.evaluate(records);
    let outcome = exceptions.match_deviations(evaluation.deviations);
    let suggestions = suggest_rules(&outcome.issues, options.min_occurrences);

    let records_with_issues = outcome
        .issues
        .iter()
        .map(|issue| issue.row)
        .collect::<BTreeSet<_>>()
        .len();

    let compliance_rate = if evaluation.analyzed == 0 {
        100.0
    } else {
        (evaluation.analyzed - records_with_issues) as f64 / evaluation.analyzed as f64 * 100.0
    };

    let summary = ComplianceSummary {
        total_records: records.len(),
        analyzed: evaluation.analyzed,
        excluded: evaluation.excluded,
        skipped: evaluation.skipped.len(),
        perfect_matches: evaluation.compliant,
        records_with_issues,
        accepted_deviations: outcome.accepted.len(),
        issues: outcome.issues.len(),
        compliance_rate,
        issues_by_dimension: dimension_breakdown(&outcome.issues),
        issues_by_priority: priority_breakdown(&outcome.issues),
        top_countries: count_desc(outcome.issues.iter().map(|issue| country_label(&issue.country)))
            .into_iter()
            .take(3)
            .collect(),
        low_priority_city_tax: outcome
            .issues
            .iter()
            .filter(|issue| issue.dimension == Dimension::CityTax && issue.priority == Priority::Low)
            .count(),
        active_exceptions: exceptions.active_count(),
        exceptions_needing_review: exceptions.needs_review_count(options.today),
        suggested_rules: suggestions.len(),
    };

    ComplianceReport {
        summary,
        issues: outcome.issues,
        accepted: outcome.accepted,
        suggestions,
        skipped: evaluation.skipped,
    }
}
