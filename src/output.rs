use crate::policy::Deviation;
use crate::report::ComplianceReport;

/// Issues shown in the terminal table unless verbose.
const ISSUE_PREVIEW: usize = 20;

pub fn format_table_output(report: &ComplianceReport, verbose: bool) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    // Summary header
    output.push_str(&format!("📊 CRPM Compliance Summary ({} rate plans)\n", summary.total_records));
    output.push_str(&format!(
        "✅ {} compliant  🟢 {} accepted  🔧 {} issues  📈 {:.1}% compliance\n",
        summary.perfect_matches, summary.accepted_deviations, summary.issues, summary.compliance_rate
    ));
    if summary.excluded > 0 || summary.skipped > 0 {
        output.push_str(&format!(
            "⏭️  {} excluded  ⚠️ {} skipped\n",
            summary.excluded, summary.skipped
        ));
    }
    output.push('\n');

    if report.issues.is_empty() {
        output.push_str("✅ No issues found!\n");
    } else {
        let breakdown: Vec<String> = summary
            .issues_by_priority
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(priority, count)| format!("{} {}", count, priority))
            .collect();
        output.push_str(&format!("⚠️  Issues Found ({}):\n", breakdown.join(", ")));

        let issues = report.prioritized_issues();
        let shown = if verbose { issues.len() } else { ISSUE_PREVIEW.min(issues.len()) };
        output.push_str(&format_issue_table(&issues[..shown]));

        if shown < issues.len() {
            output.push_str(&format!("\n💡 Run with --verbose to see all {} issues\n", issues.len()));
        }
    }

    if !report.suggestions.is_empty() {
        output.push_str(&format!(
            "\n💡 {} new exception rule(s) suggested; review the Suggested_Exception_Rules report\n",
            report.suggestions.len()
        ));
    }
    if summary.exceptions_needing_review > 0 {
        output.push_str(&format!(
            "⏰ {} exception rule(s) past their review date\n",
            summary.exceptions_needing_review
        ));
    }

    output
}

fn format_issue_table(issues: &[&Deviation]) -> String {
    let mut output = String::new();

    // Table header
    output.push_str("┌────────┬─────────────┬────────────┬────────────────┬────────────────┬──────────┐\n");
    output.push_str("│ Hotel  │ Rate        │ Field      │ Current        │ Standard       │ Priority │\n");
    output.push_str("├────────┼─────────────┼────────────┼────────────────┼────────────────┼──────────┤\n");

    // Table rows
    for issue in issues {
        output.push_str(&format!(
            "│ {:<6} │ {:<11} │ {:<10} │ {:<14} │ {:<14} │ {:<8} │\n",
            truncate(&issue.hotel_code, 6),
            truncate(&issue.rate_code, 11),
            issue.dimension.label(),
            truncate(&issue.observed, 14),
            truncate(&issue.expected, 14),
            issue.priority.as_str(),
        ));
    }

    // Table footer
    output.push_str("└────────┴─────────────┴────────────┴────────────────┴────────────────┴──────────┘\n");

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{}…", kept)
    }
}
