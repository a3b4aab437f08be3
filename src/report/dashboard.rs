use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use super::{count_desc, country_label, ComplianceReport};
use crate::policy::Dimension;

const TOP_HOTELS: usize = 10;
const IMPACT_HOTELS: usize = 5;
const TOP_PATTERNS: usize = 5;
const TOP_COUNTRIES: usize = 5;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0; background: #f4f6f8; color: #222; }
header { background: #1f3b57; color: #fff; padding: 24px 32px; }
header h1 { margin: 0 0 4px 0; font-size: 24px; }
main { padding: 24px 32px; }
.metrics { display: flex; flex-wrap: wrap; gap: 16px; margin-bottom: 24px; }
.metric { background: #fff; border-radius: 6px; padding: 16px 20px; min-width: 160px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
.metric .value { font-size: 28px; font-weight: 600; }
.metric .label { font-size: 13px; color: #666; }
section { background: #fff; border-radius: 6px; padding: 16px 20px; margin-bottom: 24px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
section h2 { margin-top: 0; font-size: 18px; }
table { border-collapse: collapse; width: 100%; font-size: 14px; }
th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #e3e6ea; }
th { background: #f0f2f5; }
.high { color: #b00020; font-weight: 600; }
.medium { color: #b26a00; }
.low { color: #557; }
.note { color: #666; font-size: 13px; }
"#;

/// Escape text for interpolation into HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn metric(html: &mut String, value: &str, label: &str) {
    let _ = write!(
        html,
        "<div class=\"metric\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>",
        escape_html(value),
        escape_html(label)
    );
}

fn table_head(html: &mut String, columns: &[&str]) {
    html.push_str("<table><thead><tr>");
    for column in columns {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr></thead><tbody>");
}

fn table_row(html: &mut String, cells: &[String]) {
    html.push_str("<tr>");
    for cell in cells {
        let _ = write!(html, "<td>{}</td>", escape_html(cell));
    }
    html.push_str("</tr>");
}

fn top_hotels(html: &mut String, report: &ComplianceReport) {
    html.push_str("<section><h2>Top Problem Hotels</h2>");
    let hotels = report.issues_by_hotel();
    if hotels.is_empty() {
        html.push_str("<p>No open issues.</p></section>");
        return;
    }

    let total = report.issues.len();
    let top_five: usize = hotels.iter().take(IMPACT_HOTELS).map(|(_, count)| count).sum();
    let _ = write!(
        html,
        "<p class=\"note\">Fixing the top {} hotels resolves {:.1}% of all issues.</p>",
        IMPACT_HOTELS.min(hotels.len()),
        percent(top_five, total)
    );

    table_head(html, &["Hotel", "Issues", "VAT", "Subaccount", "City Tax", "Share"]);
    for (hotel, count) in hotels.iter().take(TOP_HOTELS) {
        let per_dimension = |dimension: Dimension| {
            report
                .issues
                .iter()
                .filter(|issue| &issue.hotel_code == hotel && issue.dimension == dimension)
                .count()
                .to_string()
        };
        table_row(
            html,
            &[
                hotel.clone(),
                count.to_string(),
                per_dimension(Dimension::Vat),
                per_dimension(Dimension::Subaccount),
                per_dimension(Dimension::CityTax),
                format!("{:.1}%", percent(*count, total)),
            ],
        );
    }
    html.push_str("</tbody></table></section>");
}

fn top_patterns(html: &mut String, report: &ComplianceReport) {
    html.push_str("<section><h2>Top Deviation Patterns</h2>");
    let patterns = count_desc(report.issues.iter().map(|issue| issue.describe()));
    if patterns.is_empty() {
        html.push_str("<p>No open issues.</p></section>");
        return;
    }

    table_head(html, &["Pattern", "Occurrences", "Hotels"]);
    for (pattern, count) in patterns.iter().take(TOP_PATTERNS) {
        let mut hotels: Vec<&str> = report
            .issues
            .iter()
            .filter(|issue| &issue.describe() == pattern)
            .map(|issue| issue.hotel_code.as_str())
            .collect();
        hotels.sort_unstable();
        hotels.dedup();
        table_row(html, &[pattern.clone(), count.to_string(), hotels.join(", ")]);
    }
    html.push_str("</tbody></table></section>");
}

fn exception_efficiency(html: &mut String, report: &ComplianceReport) {
    let accepted = report.accepted.len();
    let deviations = accepted + report.issues.len();
    let _ = write!(
        html,
        "<section><h2>Exception Efficiency</h2><p>{} of {} deviations ({:.1}%) are covered by approved exceptions.</p>",
        accepted,
        deviations,
        percent(accepted, deviations)
    );

    let by_rule = count_desc(
        report
            .accepted
            .iter()
            .map(|accepted| accepted.rule.rule_type.as_str().to_string()),
    );
    if !by_rule.is_empty() {
        table_head(html, &["Rule Type", "Accepted Deviations"]);
        for (rule_type, count) in &by_rule {
            table_row(html, &[rule_type.clone(), count.to_string()]);
        }
        html.push_str("</tbody></table>");
    }

    if report.summary.exceptions_needing_review > 0 {
        let _ = write!(
            html,
            "<p class=\"high\">{} exception rule(s) are past their review date.</p>",
            report.summary.exceptions_needing_review
        );
    }
    html.push_str("</section>");
}

fn country_focus(html: &mut String, report: &ComplianceReport) {
    html.push_str("<section><h2>Country Focus</h2>");
    let countries = count_desc(report.issues.iter().map(|issue| country_label(&issue.country)));
    if countries.is_empty() {
        html.push_str("<p>No open issues.</p></section>");
        return;
    }

    table_head(html, &["Country", "Issues", "Hotels"]);
    for (country, count) in countries.iter().take(TOP_COUNTRIES) {
        let mut hotels: Vec<&str> = report
            .issues
            .iter()
            .filter(|issue| &country_label(&issue.country) == country)
            .map(|issue| issue.hotel_code.as_str())
            .collect();
        hotels.sort_unstable();
        hotels.dedup();
        table_row(html, &[country.clone(), count.to_string(), hotels.len().to_string()]);
    }
    html.push_str("</tbody></table></section>");
}

fn suggestions(html: &mut String, report: &ComplianceReport) {
    html.push_str("<section><h2>Suggested Exception Rules</h2>");
    if report.suggestions.is_empty() {
        html.push_str("<p>No recurring patterns reached the suggestion threshold.</p></section>");
        return;
    }

    html.push_str("<p class=\"note\">Suggestions are inactive until approved.</p>");
    table_head(
        html,
        &["Rule Type", "Scope", "Field", "Current", "Standard", "Occurrences", "Priority"],
    );
    for suggestion in &report.suggestions {
        let scope = if suggestion.hotel_code.is_empty() {
            suggestion.country.clone()
        } else {
            suggestion.hotel_code.clone()
        };
        table_row(
            html,
            &[
                suggestion.rule_type.as_str().to_string(),
                scope,
                suggestion.field.label().to_string(),
                suggestion.current_value.clone(),
                suggestion.standard_value.clone(),
                suggestion.occurrences.to_string(),
                suggestion.priority.to_string(),
            ],
        );
    }
    html.push_str("</tbody></table></section>");
}

/// Render the self-contained HTML dashboard for one run.
pub fn render_dashboard(report: &ComplianceReport, timestamp: &str) -> String {
    let summary = &report.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(
        html,
        "<title>CRPM Compliance Dashboard {}</title>",
        escape_html(timestamp)
    );
    let _ = writeln!(html, "<style>{}</style>\n</head>\n<body>", STYLE);
    let _ = writeln!(
        html,
        "<header><h1>CRPM Compliance Dashboard</h1><div>Run {}</div></header>\n<main>",
        escape_html(timestamp)
    );

    html.push_str("<div class=\"metrics\">");
    metric(&mut html, &summary.total_records.to_string(), "Total Rate Plans");
    metric(&mut html, &summary.perfect_matches.to_string(), "Perfect Compliance");
    metric(&mut html, &summary.accepted_deviations.to_string(), "Accepted Deviations");
    metric(&mut html, &summary.issues.to_string(), "Issues Needing Fix");
    metric(&mut html, &format!("{:.1}%", summary.compliance_rate), "Compliance Rate");
    metric(&mut html, &summary.suggested_rules.to_string(), "Suggested Rules");
    html.push_str("</div>\n");

    top_hotels(&mut html, report);
    top_patterns(&mut html, report);
    exception_efficiency(&mut html, report);
    country_focus(&mut html, report);
    suggestions(&mut html, report);

    html.push_str("\n</main>\n</body>\n</html>\n");
    html
}

/// Write `CRPM_Dashboard_<timestamp>.html` into `dir`.
pub fn create_dashboard(report: &ComplianceReport, dir: &Path, timestamp: &str) -> Result<PathBuf> {
    let path = dir.join(format!("CRPM_Dashboard_{}.html", timestamp));
    fs::write(&path, render_dashboard(report, timestamp))
        .with_context(|| format!("Failed to write dashboard: {}", path.display()))?;
    Ok(path)
}

/// Open a file with the platform's default handler.
pub fn open_in_browser(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };

    let status = command
        .arg(path)
        .status()
        .with_context(|| format!("Failed to launch browser for {}", path.display()))?;
    if !status.success() {
        bail!("Browser launcher exited with {} for {}", status, path.display());
    }
    Ok(())
}
