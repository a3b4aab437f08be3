use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use super::models::{ExceptionRule, ExceptionsFile, RuleStatus, RuleType};
use crate::error::LoadError;
use crate::policy::{Dimension, Priority};
use crate::records::{Row, SourceKind, Table};

pub const EXCEPTION_COLUMNS: [&str; 14] = [
    "Rule_Type",
    "Field",
    "Hotel_Code",
    "Rate_Code",
    "Country",
    "Current_Value",
    "Standard_Value",
    "Reason",
    "Approved_By",
    "Date_Added",
    "Status",
    "Priority",
    "Review_Date",
    "Notes",
];

const REQUIRED_EXCEPTION_COLUMNS: [&str; 3] = ["Rule_Type", "Field", "Current_Value"];

impl ExceptionsFile {
    /// Load rules from a TOML, CSV or workbook file (first sheet).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        match SourceKind::from_path(path)? {
            SourceKind::Toml => {
                let content = fs::read_to_string(path).map_err(|source| {
                    if source.kind() == std::io::ErrorKind::NotFound {
                        LoadError::NotFound { path: path.to_path_buf() }
                    } else {
                        LoadError::Io { path: path.to_path_buf(), source }
                    }
                })?;
                toml::from_str(&content).map_err(|source| LoadError::Toml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            SourceKind::Csv => Self::from_table(&Table::from_csv_path(path, "exceptions")?),
            SourceKind::Workbook => Self::from_table(&Table::from_first_sheet(path)?),
        }
    }

    /// Build rules from an exceptions sheet. Rows with an unknown rule type
    /// or field are skipped with a warning.
    pub fn from_table(table: &Table) -> Result<Self, LoadError> {
        table.require_columns(&REQUIRED_EXCEPTION_COLUMNS)?;

        let mut exceptions = ExceptionsFile::new();
        for row in table.rows() {
            match rule_from_row(&row) {
                Ok(rule) => exceptions.add_exception(rule),
                Err(reason) => warn!(row = row.number, %reason, "skipping exception rule"),
            }
        }

        Ok(exceptions)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize exceptions")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write exceptions file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Example rules covering every scope kind, all inactive.
    pub fn template() -> Self {
        let added = NaiveDate::from_ymd_opt(2024, 1, 15);
        let review = NaiveDate::from_ymd_opt(2025, 1, 15);
        let examples = vec![
            ExceptionRule::new(RuleType::HotelSpecific, Dimension::Vat, "Without")
                .hotels("HOTEL001")
                .expecting("Reduced"),
            ExceptionRule::new(RuleType::CountryPattern, Dimension::Vat, "Without")
                .in_country("UK")
                .expecting("Reduced"),
            ExceptionRule::new(RuleType::HotelPattern, Dimension::Subaccount, "108000A")
                .hotels("NYB,NYT")
                .expecting("108000"),
            ExceptionRule::new(RuleType::CountryRatePattern, Dimension::Vat, "Without")
                .in_country("UK")
                .rates("MRYC,MRYE,MRYF,MRYA,MRYG")
                .expecting("Normal"),
            ExceptionRule::new(RuleType::HotelRateSpecific, Dimension::Subaccount, "108000A")
                .hotels("HOTEL001")
                .rates("SPECIAL_RATE")
                .expecting("108000"),
            ExceptionRule::new(RuleType::HotelRatePattern, Dimension::Subaccount, "108000A")
                .hotels("NYB,NYT")
                .rates("MRY*")
                .expecting("108000"),
        ];
        let reasons = [
            "Local regulation",
            "UK hotels can use Without VAT",
            "NYB/NYT use special subaccount for ALL rates",
            "UK special rates approved for Without VAT",
            "This hotel-rate combo uses special subaccount",
            "NYB/NYT use special subaccount for MRY rates only",
        ];

        let exceptions = examples
            .into_iter()
            .zip(reasons)
            .map(|(mut rule, reason)| {
                rule.reason = reason.to_string();
                rule.approved_by = "Manager".to_string();
                rule.date_added = added;
                rule.review_date = review;
                rule.priority = Some(Priority::Medium);
                rule.status = RuleStatus::Inactive;
                rule
            })
            .collect();

        Self { exceptions }
    }
}

fn rule_from_row(row: &Row<'_>) -> Result<ExceptionRule, String> {
    let rule_type: RuleType = row.get("Rule_Type").parse()?;
    let field: Dimension = row.get("Field").parse()?;

    let current_value = row.get("Current_Value");
    if current_value.is_empty() {
        return Err("blank Current_Value".to_string());
    }

    let priority = match row.get("Priority") {
        "" => None,
        value => match value.parse::<Priority>() {
            Ok(priority) => Some(priority),
            Err(e) => {
                warn!(row = row.number, error = %e, "ignoring exception priority");
                None
            }
        },
    };

    Ok(ExceptionRule {
        rule_type,
        field,
        hotel_code: row.get("Hotel_Code").to_string(),
        rate_code: row.get("Rate_Code").to_string(),
        country: row.get("Country").to_string(),
        current_value: current_value.to_string(),
        standard_value: row.get("Standard_Value").to_string(),
        reason: row.get("Reason").to_string(),
        approved_by: row.get("Approved_By").to_string(),
        date_added: parse_date(row, "Date_Added"),
        status: RuleStatus::parse(row.get("Status")),
        priority,
        review_date: parse_date(row, "Review_Date"),
        notes: row.get("Notes").to_string(),
    })
}

fn parse_date(row: &Row<'_>, column: &str) -> Option<NaiveDate> {
    let value = row.get(column);
    if value.is_empty() {
        return None;
    }

    // workbook cells may carry a time part
    let date_part = value.split_whitespace().next().unwrap_or(value);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(row = row.number, column, value, "ignoring unparseable date");
            None
        }
    }
}

/// Load the exceptions file, or an empty rule set when it does not exist.
pub fn load_exceptions(path: &Path, today: NaiveDate) -> Result<ExceptionsFile> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "exceptions file not found, continuing without exceptions (run `crpm-check init` for a template)"
        );
        return Ok(ExceptionsFile::new());
    }

    let exceptions = ExceptionsFile::load_from_file(path)
        .with_context(|| format!("Failed to load exceptions from {}", path.display()))?;

    let active = exceptions.active_count();
    info!(total = exceptions.len(), active, inactive = exceptions.len() - active, "loaded exceptions");

    for rule in exceptions.exceptions.iter().filter(|rule| !rule.is_active()).take(3) {
        info!(
            rule_type = %rule.rule_type,
            field = %rule.field,
            hotel = %rule.hotel_code,
            reason = %rule.reason,
            "inactive exception will be ignored"
        );
    }

    let review_needed = exceptions.needs_review_count(today);
    if review_needed > 0 {
        warn!(count = review_needed, "active exceptions are past their review date");
    }

    Ok(exceptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SHEET: &str = "\
Rule_Type,Field,Hotel_Code,Rate_Code,Country,Current_Value,Standard_Value,Reason,Approved_By,Date_Added,Status,Priority,Review_Date,Notes
Hotel_Specific,VAT,AMS,,,Without,Reduced,Local regulation,Manager,2024-01-15,Active,High,2025-01-15,
Hotel_Pattern,Subaccount,\"NYB,NYT\",,,108000A,108000,Special subaccount,Manager,2024-01-15,,Low,,
Country_Pattern,City Tax,,,UK,No,,Exempt,Manager,2024-01-15,Inactive,,,
Mystery_Rule,VAT,AMS,,,Without,,,,,,,,
Hotel_Specific,Currency,AMS,,,EUR,,,,,,,,
Rate_Pattern,VAT,,MRY*,,Without,,,,not-a-date,,,,
";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_from_table_parses_rules() {
        let table = Table::from_csv_reader("exceptions", SHEET.as_bytes()).unwrap();
        let exceptions = ExceptionsFile::from_table(&table).unwrap();

        // unknown rule type and unknown field are skipped
        assert_eq!(exceptions.len(), 4);

        let first = &exceptions.exceptions[0];
        assert_eq!(first.rule_type, RuleType::HotelSpecific);
        assert_eq!(first.field, Dimension::Vat);
        assert_eq!(first.priority, Some(Priority::High));
        assert_eq!(first.review_date, NaiveDate::from_ymd_opt(2025, 1, 15));

        let second = &exceptions.exceptions[1];
        assert_eq!(second.hotel_code, "NYB,NYT");
        assert_eq!(second.status, RuleStatus::Active);

        assert_eq!(exceptions.exceptions[2].field, Dimension::CityTax);
        assert!(!exceptions.exceptions[2].is_active());

        assert_eq!(exceptions.exceptions[3].date_added, None);
        assert_eq!(exceptions.active_count(), 3);
        assert_eq!(exceptions.needs_review_count(today()), 1);
    }

    #[test]
    fn test_table_without_required_columns_is_fatal() {
        let table = Table::from_csv_reader("exceptions", "Rule_Type,Reason\nGlobal,x\n".as_bytes()).unwrap();
        assert!(matches!(
            ExceptionsFile::from_table(&table),
            Err(LoadError::MissingColumns { .. })
        ));
    }

    #[test]
    fn test_file_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("exceptions.toml");

        let template = ExceptionsFile::template();
        template.save_to_file(&file_path).unwrap();
        assert!(file_path.exists());

        let loaded = ExceptionsFile::load_from_file(&file_path).unwrap();
        assert_eq!(loaded, template);
        assert_eq!(loaded.active_count(), 0);
    }

    #[test]
    fn test_load_toml_by_hand() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("exceptions.toml");
        fs::write(
            &file_path,
            r#"
[[exceptions]]
rule_type = "Hotel_Rate_Specific"
field = "Subaccount"
hotel_code = "AMS"
rate_code = "BAR"
current_value = "108000A"
reason = "Legacy mapping"
review_date = "2030-01-01"
"#,
        )
        .unwrap();

        let loaded = ExceptionsFile::load_from_file(&file_path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.exceptions[0].is_active());
        assert_eq!(loaded.exceptions[0].standard_value, "");
        assert_eq!(loaded.needs_review_count(today()), 0);
    }

    #[test]
    fn test_load_csv_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("exceptions.csv");
        fs::write(&file_path, SHEET).unwrap();

        let exceptions = load_exceptions(&file_path, today()).unwrap();
        assert_eq!(exceptions.len(), 4);
    }

    #[test]
    fn test_load_workbook_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/crpm_exceptions.xlsx");

        let exceptions = load_exceptions(&path, today()).unwrap();

        assert_eq!(exceptions.len(), 2);
        let first = &exceptions.exceptions[0];
        assert_eq!(first.rule_type, RuleType::HotelSpecific);
        assert_eq!(first.hotel_code, "RTM");
        assert_eq!(first.date_added, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(first.review_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(first.priority, Some(Priority::High));

        // numeric Current_Value cell
        let second = &exceptions.exceptions[1];
        assert_eq!(second.rate_code, "MRY*");
        assert_eq!(second.current_value, "208000");
        assert!(!second.is_active());
        assert_eq!(exceptions.needs_review_count(today()), 1);
    }

    #[test]
    fn test_missing_exceptions_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let exceptions = load_exceptions(&temp_dir.path().join("nope.xlsx"), today()).unwrap();
        assert!(exceptions.is_empty());
    }

    #[test]
    fn test_broken_toml_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("exceptions.toml");
        fs::write(&file_path, "[[exceptions]]\nrule_type = 42\n").unwrap();

        assert!(load_exceptions(&file_path, today()).is_err());
    }
}
