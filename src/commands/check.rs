use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use crate::cli::{CheckArgs, OutputFormat};
use crpm_check::config::{load_config, DEFAULT_EXCEPTIONS, DEFAULT_INPUT, DEFAULT_OUTPUT};
use crpm_check::exceptions::load_exceptions;
use crpm_check::output::format_table_output;
use crpm_check::policy::{ComplianceStandards, Priority};
use crpm_check::records::{load_dataset, DatasetSource};
use crpm_check::report::{create_dashboard, open_in_browser, write_reports};
use crpm_check::{run_pipeline, PipelineOptions};

/// Skipped records logged one by one; the rest are summarised.
const SKIPPED_DETAIL_LIMIT: usize = 10;

pub fn handle_check(args: CheckArgs, quiet: bool, verbose: bool) -> Result<()> {
    // Load configuration from crpm.toml
    let config = load_config(args.config.as_deref())?;

    // CLI arguments override config values
    let input = args
        .input
        .or(config.input)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
    let exceptions_path = args
        .exceptions
        .or(config.exceptions)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXCEPTIONS));
    let standards_path = args.standards.or(config.standards);
    let output_dir = args
        .output
        .or(config.output)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let create_dashboard_file = !args.no_dashboard && config.create_dashboard.unwrap_or(true);
    let auto_open = !args.no_open && config.auto_open_dashboard.unwrap_or(true);

    let now = Local::now();
    let today = now.date_naive();
    let timestamp = now.format("%Y-%m-%d_%H%M").to_string();

    // Input data problems are fatal
    let source = DatasetSource::resolve(&input, standards_path.as_deref())?;
    let dataset = load_dataset(&source)
        .with_context(|| format!("Failed to load rate-plan data from {}", input.display()))?;

    let exceptions = load_exceptions(&exceptions_path, today)?;

    let standards = ComplianceStandards::new(dataset.standards)
        .with_city_tax_hotels(config.city_tax_hotels.unwrap_or_default())
        .with_excluded_hotels(config.excluded_hotels.unwrap_or_default());
    for hotel in standards.duplicate_hotels() {
        warn!(hotel = %hotel, "duplicate hotel standard; keeping the first");
    }
    debug!(hotels = standards.hotel_count(), "hotel standards ready");

    let mut options = PipelineOptions::new(today);
    if let Some(min_occurrences) = args.min_occurrences.or(config.min_occurrences) {
        options.min_occurrences = min_occurrences;
    }

    let report = run_pipeline(&dataset.records, &standards, &exceptions, &options);

    for skipped in report.skipped.iter().take(SKIPPED_DETAIL_LIMIT) {
        warn!(row = skipped.row, hotel = %skipped.hotel_code, "skipped record: {}", skipped.reason);
    }
    if report.skipped.len() > SKIPPED_DETAIL_LIMIT {
        warn!(
            "{} more records skipped",
            report.skipped.len() - SKIPPED_DETAIL_LIMIT
        );
    }

    let summary = &report.summary;
    info!(
        analyzed = summary.analyzed,
        compliant = summary.perfect_matches,
        accepted = summary.accepted_deviations,
        issues = summary.issues,
        suggestions = summary.suggested_rules,
        "compliance check finished ({:.1}% compliant)",
        summary.compliance_rate
    );

    let files = write_reports(&report, &output_dir, &timestamp, today)?;
    info!(dir = %files.dir.display(), files = files.files.len(), "reports written");

    if create_dashboard_file {
        match create_dashboard(&report, &files.dir, &timestamp) {
            Ok(path) => {
                info!(file = %path.display(), "dashboard written");
                if auto_open {
                    if let Err(e) = open_in_browser(&path) {
                        warn!("Could not open dashboard: {:#}", e);
                    }
                }
            }
            Err(e) => warn!("Could not create dashboard: {:#}", e),
        }
    }

    // Determine output format
    let format = args.format.unwrap_or_else(|| match config.format.as_deref() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Table,
    });

    let output_content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Table => format_table_output(&report, verbose),
    };
    if !quiet {
        println!("{}", output_content);
    }

    let high_issues = report
        .issues
        .iter()
        .filter(|issue| issue.priority == Priority::High)
        .count();
    if high_issues > 0 && !args.exit_zero && config.fail_on_issues.unwrap_or(false) {
        eprintln!("Exiting with error due to {} High priority issues", high_issues);
        std::process::exit(1);
    }

    Ok(())
}
