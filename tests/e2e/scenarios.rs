use super::helpers::{dump, TestProject};

const ROWS: [&str; 8] = [
    "AMS,BAR,Best available,NL,Without,108000,Yes",
    "AMS,FLEX,Flexible,NL,Without,108000,Yes",
    "AMS,PKG,Package,NL,Without,108000,Yes",
    "AMS,COMP,Complimentary,NL,Reduced,108000,Yes",
    "RTM,BAR,Best available,NL,Reduced,108000A,Yes",
    "LON,BAR,Best available,UK,Normal,208000,No",
    "ITA,BAR,Best available,IT,Zero,999,No",
    ",ORPHAN,No hotel,NL,Reduced,108000,Yes",
];

const EXCEPTIONS: &str = r#"
[[exceptions]]
rule_type = "Hotel_Rate_Specific"
field = "VAT"
hotel_code = "AMS"
rate_code = "BAR"
current_value = "Without"
standard_value = "Reduced"
reason = "Zero-rated corporate contract"
approved_by = "Finance"
"#;

fn project() -> TestProject {
    let project = TestProject::new();
    project.write_rates(&ROWS);
    project.write_file("data/exceptions.toml", EXCEPTIONS);
    project
}

#[test]
fn test_check_writes_reports() {
    let project = project();

    let output = project.run_check(&["--exceptions", "data/exceptions.toml"]);
    if !output.status.success() {
        dump(&output);
    }
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CRPM Compliance Summary (8 rate plans)"));
    assert!(stdout.contains("1 accepted"));
    assert!(stdout.contains("3 issues"));
    assert!(stdout.contains("50.0% compliance"));

    let files = project.report_files();
    assert_eq!(files.len(), 4);
    assert!(files[0].starts_with("CRPM_Accepted_Deviations_DETAILED_"));
    assert!(files[1].starts_with("CRPM_Dashboard_") && files[1].ends_with(".html"));
    assert!(files[2].starts_with("CRPM_Executive_Summary_"));
    assert!(files[3].starts_with("CRPM_Issues_To_Fix_PRIORITIZED_"));

    let issues = project.read_report("CRPM_Issues_To_Fix_PRIORITIZED_");
    let lines: Vec<&str> = issues.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains("AMS,FLEX") && lines[1].contains("High"));
    assert!(lines[3].contains("RTM,BAR") && lines[3].contains("Medium"));

    let accepted = project.read_report("CRPM_Accepted_Deviations_DETAILED_");
    assert!(accepted.contains("Zero-rated corporate contract"));
    assert!(accepted.contains("Hotel_Rate_Specific"));
}

#[test]
fn test_json_output() {
    let project = project();

    let output = project.run_check(&["--exceptions", "data/exceptions.toml", "--format", "json", "--no-dashboard"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_records"], 8);
    assert_eq!(report["summary"]["analyzed"], 6);
    assert_eq!(report["summary"]["excluded"], 1);
    assert_eq!(report["summary"]["skipped"], 1);
    assert_eq!(report["summary"]["issues"], 3);
    assert_eq!(report["summary"]["accepted_deviations"], 1);
    assert_eq!(report["issues"].as_array().unwrap().len(), 3);

    assert!(!project.report_files().iter().any(|name| name.starts_with("CRPM_Dashboard_")));
}

#[test]
fn test_missing_exceptions_file_is_a_warning() {
    let project = project();

    let output = project.run_check(&["--no-dashboard"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exceptions file not found"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("4 issues"));
}

#[test]
fn test_missing_input_is_fatal() {
    let project = TestProject::new();

    let output = project.run(&["check", "--input", "data/missing.csv", "--no-open"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.csv"));
    assert!(!project.path("output").exists());
}

#[test]
fn test_missing_required_column_is_fatal() {
    let project = TestProject::new();
    project.write_file(
        "data/rates.csv",
        "Hotel code,Code,Sub account current,Is subject to city tax current\nAMS,BAR,108000,Yes\n",
    );
    project.write_file("data/standard.csv", super::helpers::STANDARD_CSV);

    let output = project.run_check(&[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Vat type current"));
}

#[test]
fn test_fail_on_issues() {
    let project = project();
    project.write_file("crpm.toml", "fail_on_issues = true\ncreate_dashboard = false\n");

    let output = project.run_check(&["--exceptions", "data/exceptions.toml", "--quiet"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("High priority issues"));

    let output = project.run_check(&["--exceptions", "data/exceptions.toml", "--exit-zero", "--quiet"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_init_and_config() {
    let project = TestProject::new();

    let output = project.run(&["init"]);
    assert!(output.status.success());
    assert!(project.path("crpm.toml").exists());
    assert!(project.path("source/source_CRPM_exceptions.toml").exists());

    let output = project.run(&["config", "--validate"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration is valid"));

    let output = project.run(&["config", "--show"]);
    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["exceptions"], "source/source_CRPM_exceptions.toml");
    assert_eq!(config["excluded_hotels"][0], "ITA");

    let output = project.run(&["init"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));

    let output = project.run(&["init", "--force"]);
    assert!(output.status.success());
}

#[test]
fn test_invalid_config_fails_validation() {
    let project = TestProject::new();
    project.write_file("crpm.toml", "format = \"xml\"\n");

    let output = project.run(&["config", "--validate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("validation failed"));

    let output = project.run(&["config"]);
    assert!(!output.status.success());
}
