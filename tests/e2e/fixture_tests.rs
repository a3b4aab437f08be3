use super::helpers::{dump, TestProject};
use crpm_check::ExceptionsFile;

#[test]
fn test_recurring_issues_are_suggested() {
    let project = TestProject::new();
    project.write_rates(&[
        "AMS,MRY1,Member rate,NL,Without,108000,Yes",
        "AMS,MRY2,Member rate,NL,Without,108000,Yes",
        "AMS,MRY3,Member rate,NL,Without,108000,Yes",
        "RTM,CORP,Corporate,NL,Reduced,108000,No",
    ]);

    let output = project.run_check(&["--no-dashboard", "--exceptions", "data/none.toml"]);
    if !output.status.success() {
        dump(&output);
    }
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 new exception rule(s) suggested"));

    let suggestions = project.read_report("CRPM_Suggested_Exception_Rules_");
    assert!(suggestions.contains("Hotel_Specific,VAT,AMS,,,Without,Reduced"));
    assert!(suggestions.contains(",3,AMS,\"MRY1,MRY2,MRY3\""));
    assert!(suggestions.contains("[TO_BE_APPROVED]"));
    assert!(suggestions.contains("Inactive"));

    // The proposed rules load as an exceptions file but stay inactive
    let runs: Vec<_> = std::fs::read_dir(project.path("output")).unwrap().collect();
    let run_dir = runs[0].as_ref().unwrap().path();
    let toml_file = std::fs::read_dir(&run_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|path| path.extension().map_or(false, |ext| ext == "toml"))
        .unwrap();
    let proposed = ExceptionsFile::load_from_file(&toml_file).unwrap();
    assert_eq!(proposed.len(), 1);
    assert_eq!(proposed.active_count(), 0);

    let summary = project.read_report("CRPM_Executive_Summary_");
    assert!(summary.contains("Suggested New Rules,1"));
    assert!(summary.contains("Top Issue Type,VAT (3 cases)"));
}

#[test]
fn test_csv_exceptions_with_patterns() {
    let project = TestProject::new();
    project.write_rates(&[
        "AMS,MRY1,Member rate,NL,Without,108000,Yes",
        "AMS,MRY2,Member rate,NL,Without,108000,Yes",
        "RTM,MRY1,Member rate,NL,Without,108000,Yes",
        "RTM,BAR,Best available,NL,Reduced,108000,No",
    ]);
    project.write_file(
        "data/exceptions.csv",
        "\
Rule_Type,Field,Hotel_Code,Rate_Code,Country,Current_Value,Standard_Value,Reason,Approved_By,Date_Added,Status,Priority,Review_Date,Notes
Hotel_Rate_Pattern,VAT,\"AMS,RTM\",MRY*,,without,,Member rates are zero-rated,Finance,2024-01-15,Active,Medium,,
Country_Pattern,City Tax,,,NL,No,,Pending review,Finance,2024-01-15,Inactive,,,
",
    );

    let output = project.run_check(&["--exceptions", "data/exceptions.csv", "--format", "json", "--no-dashboard"]);
    if !output.status.success() {
        dump(&output);
    }
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["accepted_deviations"], 3);
    assert_eq!(report["summary"]["issues"], 1);
    assert_eq!(report["issues"][0]["dimension"], "CityTax");
    assert_eq!(report["issues"][0]["priority"], "High");
}

#[test]
fn test_city_tax_outside_listed_hotels_is_low_priority() {
    let project = TestProject::new();
    project.write_rates(&["LON,BAR,Best available,UK,Normal,208000,Yes"]);

    let output = project.run_check(&["--no-dashboard", "--format", "json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["issues"][0]["priority"], "Low");
    assert_eq!(report["summary"]["low_priority_city_tax"], 1);
}

#[test]
fn test_default_workbook_inputs() {
    let project = TestProject::new();
    project.copy_fixture("crpm_check.xlsx", "source/source_CRPM_check.xlsx");
    project.copy_fixture("crpm_exceptions.xlsx", "source/source_CRPM_exceptions.xlsx");

    let output = project.run(&["check", "--no-open", "--no-dashboard", "--format", "json"]);
    if !output.status.success() {
        dump(&output);
    }
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_records"], 3);
    assert_eq!(report["summary"]["analyzed"], 3);
    assert_eq!(report["summary"]["issues"], 0);
    assert_eq!(report["summary"]["accepted_deviations"], 1);
    assert_eq!(report["accepted"][0]["deviation"]["hotel_code"], "RTM");
    assert_eq!(report["accepted"][0]["deviation"]["row"], 3);
}
