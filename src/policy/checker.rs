use serde::{Deserialize, Serialize};
use super::config::ComplianceStandards;
use super::matcher::{Dimension, Priority};
use crate::records::{HotelStandard, RatePlanRecord};

/// A rate plan value that differs from its hotel standard in one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deviation {
    pub row: usize,
    pub hotel_code: String,
    pub rate_code: String,
    pub rate_name: String,
    pub country: String,
    pub dimension: Dimension,
    pub observed: String,
    pub expected: String,
    pub priority: Priority,
}

impl Deviation {
    /// e.g. `VAT: 'Without' → 'Reduced'`
    pub fn describe(&self) -> String {
        format!("{}: '{}' → '{}'", self.dimension.label(), self.observed, self.expected)
    }
}

/// A record the evaluator could not judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub row: usize,
    pub hotel_code: String,
    pub reason: String,
}

/// Result of checking a whole record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub deviations: Vec<Deviation>,
    /// Records that had a standard and were checked.
    pub analyzed: usize,
    /// Records with no deviation in any dimension.
    pub compliant: usize,
    /// Records of excluded hotels.
    pub excluded: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl ComplianceStandards {
    /// Check every record against its hotel standard.
    ///
    /// Records with a blank required field or without a hotel standard are
    /// listed in `skipped` and never produce deviations.
    pub fn evaluate(&self, records: &[RatePlanRecord]) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for record in records {
            if let Some(field) = record.missing_field() {
                evaluation.skipped.push(SkippedRecord {
                    row: record.row,
                    hotel_code: record.hotel_code.clone(),
                    reason: format!("missing required field '{}'", field),
                });
                continue;
            }

            if self.is_excluded(&record.hotel_code) {
                evaluation.excluded += 1;
                continue;
            }

            let standard = match self.standard_for(&record.hotel_code) {
                Some(standard) => standard,
                None => {
                    evaluation.skipped.push(SkippedRecord {
                        row: record.row,
                        hotel_code: record.hotel_code.clone(),
                        reason: "no hotel standard".to_string(),
                    });
                    continue;
                }
            };

            let deviations = self.evaluate_record(record, standard);
            evaluation.analyzed += 1;
            if deviations.is_empty() {
                evaluation.compliant += 1;
            }
            evaluation.deviations.extend(deviations);
        }

        evaluation
    }

    /// At most one deviation per dimension, in `Dimension::ALL` order.
    pub fn evaluate_record(&self, record: &RatePlanRecord, standard: &HotelStandard) -> Vec<Deviation> {
        let city_tax_applicable = self.is_city_tax_hotel(&record.hotel_code);

        Dimension::ALL
            .iter()
            .filter_map(|&dimension| {
                let (observed, expected) = match dimension {
                    Dimension::Vat => (record.vat_type.clone(), standard.vat_type.clone()),
                    Dimension::Subaccount => (record.subaccount.clone(), standard.subaccount.clone()),
                    Dimension::CityTax => (record.city_tax.to_string(), standard.city_tax.to_string()),
                };

                if dimension.values_match(&observed, &expected) {
                    return None;
                }

                Some(Deviation {
                    row: record.row,
                    hotel_code: record.hotel_code.clone(),
                    rate_code: record.rate_code.clone(),
                    rate_name: record.rate_name.clone(),
                    country: record.country.clone(),
                    dimension,
                    observed,
                    expected,
                    priority: Priority::for_deviation(dimension, city_tax_applicable),
                })
            })
            .collect()
    }
}
