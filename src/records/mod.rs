use serde::{Deserialize, Serialize};
use std::fmt;

pub mod loader;
pub mod table;

pub use loader::{load_dataset, load_dataset_from_tables, DatasetSource};
pub use table::{Row, SourceKind, Table};

/// Normalised yes/no cell, as used for the city tax columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxFlag {
    Yes,
    No,
    Unknown,
}

impl TaxFlag {
    /// Blank and "nan" cells count as No.
    pub fn normalize(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "1.0" | "yes" | "y" => TaxFlag::Yes,
            "false" | "0" | "0.0" | "no" | "n" | "nan" | "none" | "" => TaxFlag::No,
            _ => TaxFlag::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxFlag::Yes => "Yes",
            TaxFlag::No => "No",
            TaxFlag::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TaxFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the `data` sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePlanRecord {
    pub row: usize,
    pub hotel_code: String,
    pub rate_code: String,
    pub rate_name: String,
    pub country: String,
    pub vat_type: String,
    pub subaccount: String,
    pub city_tax: TaxFlag,
    pub service_type: String,
    pub valid_from: String,
}

impl RatePlanRecord {
    /// Name of the first required field that is blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.hotel_code.is_empty() {
            Some("Hotel code")
        } else if self.vat_type.is_empty() {
            Some("Vat type current")
        } else if self.subaccount.is_empty() {
            Some("Sub account current")
        } else {
            None
        }
    }
}

/// One row of the `standard` sheet: what every rate plan of a hotel should carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelStandard {
    pub hotel_code: String,
    pub subaccount: String,
    pub vat_type: String,
    pub city_tax: TaxFlag,
}

/// Rate plans and hotel standards as loaded from the input.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<RatePlanRecord>,
    pub standards: Vec<HotelStandard>,
}
