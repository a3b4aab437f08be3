use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::ComplianceReport;
use crate::exceptions::ExceptionsFile;

/// Output directory of one run and the files written into it.
#[derive(Debug, Clone, Default)]
pub struct ReportFiles {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct IssueRow<'a> {
    #[serde(rename = "Row")]
    row: usize,
    #[serde(rename = "Hotel_Code")]
    hotel_code: &'a str,
    #[serde(rename = "Rate_Code")]
    rate_code: &'a str,
    #[serde(rename = "Rate_Name")]
    rate_name: &'a str,
    #[serde(rename = "Country")]
    country: &'a str,
    #[serde(rename = "Field")]
    field: &'a str,
    #[serde(rename = "Current_Value")]
    current_value: &'a str,
    #[serde(rename = "Standard_Value")]
    standard_value: &'a str,
    #[serde(rename = "Deviation_Details")]
    details: String,
    #[serde(rename = "Priority")]
    priority: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
}

#[derive(Serialize)]
struct AcceptedRow<'a> {
    #[serde(rename = "Row")]
    row: usize,
    #[serde(rename = "Hotel_Code")]
    hotel_code: &'a str,
    #[serde(rename = "Rate_Code")]
    rate_code: &'a str,
    #[serde(rename = "Rate_Name")]
    rate_name: &'a str,
    #[serde(rename = "Country")]
    country: &'a str,
    #[serde(rename = "Field")]
    field: &'a str,
    #[serde(rename = "Current_Value")]
    current_value: &'a str,
    #[serde(rename = "Standard_Value")]
    standard_value: &'a str,
    #[serde(rename = "Deviation_Details")]
    details: String,
    #[serde(rename = "Status")]
    status: &'a str,
    #[serde(rename = "Exception_Rule_Type")]
    rule_type: &'a str,
    #[serde(rename = "Exception_Reason")]
    reason: &'a str,
    #[serde(rename = "Approved_By")]
    approved_by: &'a str,
    #[serde(rename = "Priority")]
    priority: String,
    #[serde(rename = "Review_Date")]
    review_date: String,
    #[serde(rename = "Notes")]
    notes: &'a str,
}

/// Exceptions-sheet columns of a suggested rule, plus what it would cover.
#[derive(Serialize)]
struct SuggestionRow {
    #[serde(rename = "Rule_Type")]
    rule_type: &'static str,
    #[serde(rename = "Field")]
    field: &'static str,
    #[serde(rename = "Hotel_Code")]
    hotel_code: String,
    #[serde(rename = "Rate_Code")]
    rate_code: String,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Current_Value")]
    current_value: String,
    #[serde(rename = "Standard_Value")]
    standard_value: String,
    #[serde(rename = "Reason")]
    reason: String,
    #[serde(rename = "Approved_By")]
    approved_by: String,
    #[serde(rename = "Date_Added")]
    date_added: String,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Priority")]
    priority: String,
    #[serde(rename = "Occurrences")]
    occurrences: usize,
    #[serde(rename = "Affected_Hotels")]
    affected_hotels: String,
    #[serde(rename = "Affected_Rates")]
    affected_rates: String,
}

#[derive(Serialize)]
struct MetricRow {
    #[serde(rename = "Metric")]
    metric: &'static str,
    #[serde(rename = "Value")]
    value: String,
}

fn write_csv<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub(crate) fn summary_rows(report: &ComplianceReport) -> Vec<(&'static str, String)> {
    let summary = &report.summary;
    let top_countries = if summary.top_countries.is_empty() {
        "-".to_string()
    } else {
        summary
            .top_countries
            .iter()
            .map(|(country, count)| format!("{} ({})", country, count))
            .collect::<Vec<_>>()
            .join(", ")
    };

    vec![
        ("Total Rate Plans", summary.total_records.to_string()),
        ("Analyzed Rate Plans", summary.analyzed.to_string()),
        ("Perfect Compliance", summary.perfect_matches.to_string()),
        ("Accepted Deviations", summary.accepted_deviations.to_string()),
        ("Issues Needing Fix", summary.issues.to_string()),
        ("Rate Plans With Issues", summary.records_with_issues.to_string()),
        ("Compliance Rate (%)", format!("{:.1}%", summary.compliance_rate)),
        ("Low Priority City Tax Findings", summary.low_priority_city_tax.to_string()),
        ("Skipped Records", summary.skipped.to_string()),
        ("Excluded Records", summary.excluded.to_string()),
        ("Top Issue Type", summary.top_issue_type().unwrap_or_else(|| "-".to_string())),
        ("Countries with Most Issues", top_countries),
        ("Exceptions Needing Review", summary.exceptions_needing_review.to_string()),
        ("Suggested New Rules", summary.suggested_rules.to_string()),
    ]
}

/// Write the CSV reports (and the suggested rules as an exceptions TOML) into
/// `<output>/<timestamp>/`. Empty issue, accepted and suggestion lists produce
/// no file; the executive summary is always written.
pub fn write_reports(
    report: &ComplianceReport,
    output: &Path,
    timestamp: &str,
    today: NaiveDate,
) -> Result<ReportFiles> {
    let dir = output.join(timestamp);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut files = Vec::new();

    if !report.issues.is_empty() {
        let path = dir.join(format!("CRPM_Issues_To_Fix_PRIORITIZED_{}.csv", timestamp));
        let rows = report.prioritized_issues().into_iter().map(|issue| IssueRow {
            row: issue.row,
            hotel_code: &issue.hotel_code,
            rate_code: &issue.rate_code,
            rate_name: &issue.rate_name,
            country: &issue.country,
            field: issue.dimension.as_str(),
            current_value: &issue.observed,
            standard_value: &issue.expected,
            details: issue.describe(),
            priority: issue.priority.as_str(),
            status: "NEEDS_FIXING",
        });
        write_csv(&path, rows)?;
        info!(file = %path.display(), "issues to fix (prioritized)");
        files.push(path);
    }

    if !report.accepted.is_empty() {
        let path = dir.join(format!("CRPM_Accepted_Deviations_DETAILED_{}.csv", timestamp));
        let rows = report.accepted.iter().map(|accepted| {
            let deviation = &accepted.deviation;
            AcceptedRow {
                row: deviation.row,
                hotel_code: &deviation.hotel_code,
                rate_code: &deviation.rate_code,
                rate_name: &deviation.rate_name,
                country: &deviation.country,
                field: deviation.dimension.as_str(),
                current_value: &deviation.observed,
                standard_value: &deviation.expected,
                details: format!("{} (ACCEPTED)", deviation.describe()),
                status: "ACCEPTED",
                rule_type: accepted.rule.rule_type.as_str(),
                reason: &accepted.rule.reason,
                approved_by: &accepted.rule.approved_by,
                priority: accepted
                    .rule
                    .priority
                    .map(|priority| priority.to_string())
                    .unwrap_or_default(),
                review_date: accepted
                    .rule
                    .review_date
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                notes: &accepted.rule.notes,
            }
        });
        write_csv(&path, rows)?;
        info!(file = %path.display(), "accepted deviations (detailed)");
        files.push(path);
    }

    if !report.suggestions.is_empty() {
        let path = dir.join(format!("CRPM_Suggested_Exception_Rules_{}.csv", timestamp));
        let rows = report.suggestions.iter().map(|suggestion| {
            let rule = suggestion.to_exception(today);
            SuggestionRow {
                rule_type: rule.rule_type.as_str(),
                field: rule.field.as_str(),
                hotel_code: rule.hotel_code,
                rate_code: rule.rate_code,
                country: rule.country,
                current_value: rule.current_value,
                standard_value: rule.standard_value,
                reason: rule.reason,
                approved_by: rule.approved_by,
                date_added: rule
                    .date_added
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                status: rule.status.as_str(),
                priority: rule.priority.map(|p| p.to_string()).unwrap_or_default(),
                occurrences: suggestion.occurrences,
                affected_hotels: suggestion.hotels.join(","),
                affected_rates: suggestion.rate_codes.join(","),
            }
        });
        write_csv(&path, rows)?;
        info!(file = %path.display(), "suggested exception rules");
        files.push(path);

        let toml_path = dir.join(format!("CRPM_Suggested_Exception_Rules_{}.toml", timestamp));
        let proposed = ExceptionsFile {
            exceptions: report
                .suggestions
                .iter()
                .map(|suggestion| suggestion.to_exception(today))
                .collect(),
        };
        proposed.save_to_file(&toml_path)?;
        files.push(toml_path);
    }

    let path = dir.join(format!("CRPM_Executive_Summary_{}.csv", timestamp));
    let rows = summary_rows(report)
        .into_iter()
        .map(|(metric, value)| MetricRow { metric, value });
    write_csv(&path, rows)?;
    info!(file = %path.display(), "executive summary");
    files.push(path);

    Ok(ReportFiles { dir, files })
}
