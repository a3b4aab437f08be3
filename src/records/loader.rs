use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::table::{SourceKind, Table};
use super::{Dataset, HotelStandard, RatePlanRecord, TaxFlag};
use crate::error::LoadError;

pub const DATA_SHEET: &str = "data";
pub const STANDARD_SHEET: &str = "standard";

pub const REQUIRED_DATA_COLUMNS: [&str; 4] = [
    "Hotel code",
    "Is subject to city tax current",
    "Sub account current",
    "Vat type current",
];

pub const REQUIRED_STANDARD_COLUMNS: [&str; 4] = [
    "Hotel code",
    "Standard subaccount",
    "Standard VAT",
    "Standard City tax",
];

/// Where the rate plans and the hotel standards come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// One workbook holding a `data` and a `standard` sheet.
    Workbook(PathBuf),
    /// Two CSV files.
    Csv { data: PathBuf, standards: PathBuf },
}

impl DatasetSource {
    /// A CSV input without an explicit standards file pairs with `standard.csv`
    /// in the same directory.
    pub fn resolve(input: &Path, standards: Option<&Path>) -> Result<Self, LoadError> {
        match SourceKind::from_path(input)? {
            SourceKind::Workbook => Ok(DatasetSource::Workbook(input.to_path_buf())),
            SourceKind::Csv => {
                let standards = match standards {
                    Some(path) => path.to_path_buf(),
                    None => input
                        .parent()
                        .unwrap_or_else(|| Path::new("."))
                        .join("standard.csv"),
                };
                Ok(DatasetSource::Csv {
                    data: input.to_path_buf(),
                    standards,
                })
            }
            SourceKind::Toml => Err(LoadError::UnsupportedFormat {
                path: input.to_path_buf(),
            }),
        }
    }
}

pub fn load_dataset(source: &DatasetSource) -> Result<Dataset, LoadError> {
    let (data, standard) = match source {
        DatasetSource::Workbook(path) => {
            debug!(path = %path.display(), "reading workbook");
            (
                Table::from_sheet(path, DATA_SHEET)?,
                Table::from_sheet(path, STANDARD_SHEET)?,
            )
        }
        DatasetSource::Csv { data, standards } => {
            debug!(data = %data.display(), standards = %standards.display(), "reading CSV input");
            (
                Table::from_csv_path(data, DATA_SHEET)?,
                Table::from_csv_path(standards, STANDARD_SHEET)?,
            )
        }
    };

    let dataset = load_dataset_from_tables(&data, &standard)?;
    info!(
        rate_plans = dataset.records.len(),
        hotel_standards = dataset.standards.len(),
        "loaded input data"
    );
    Ok(dataset)
}

/// Convert already-read tables into typed records. Fails only when a
/// required column is absent; blank cells are left for the evaluator to judge.
pub fn load_dataset_from_tables(data: &Table, standard: &Table) -> Result<Dataset, LoadError> {
    data.require_columns(&REQUIRED_DATA_COLUMNS)?;
    standard.require_columns(&REQUIRED_STANDARD_COLUMNS)?;

    let records = data
        .rows()
        .map(|row| RatePlanRecord {
            row: row.number,
            hotel_code: row.get("Hotel code").to_string(),
            rate_code: row.get("Code").to_string(),
            rate_name: row.get("Name").to_string(),
            country: row.get("Country").to_string(),
            vat_type: row.get("Vat type current").to_string(),
            subaccount: row.get("Sub account current").to_string(),
            city_tax: TaxFlag::normalize(row.get("Is subject to city tax current")),
            service_type: row.get("Service type current").to_string(),
            valid_from: row.get("Valid from current").to_string(),
        })
        .collect();

    let standards = standard
        .rows()
        .filter(|row| {
            let usable = !row.get("Hotel code").is_empty() && !row.get("Standard subaccount").is_empty();
            if !usable {
                debug!(row = row.number, "ignoring standard row without hotel code or subaccount");
            }
            usable
        })
        .map(|row| HotelStandard {
            hotel_code: row.get("Hotel code").to_string(),
            subaccount: row.get("Standard subaccount").to_string(),
            vat_type: row.get("Standard VAT").to_string(),
            city_tax: TaxFlag::normalize(row.get("Standard City tax")),
        })
        .collect();

    Ok(Dataset { records, standards })
}
