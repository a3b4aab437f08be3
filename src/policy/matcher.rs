use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::records::TaxFlag;

/// Compliance dimension checked on every rate plan.
///
/// Declaration order is also the ranking order used to break ties (VAT first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "VAT", alias = "Vat", alias = "vat")]
    Vat,
    #[serde(alias = "subaccount")]
    Subaccount,
    #[serde(alias = "City Tax", alias = "city_tax", alias = "citytax")]
    CityTax,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Vat, Dimension::Subaccount, Dimension::CityTax];

    /// Field name as written in exception files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Vat => "VAT",
            Dimension::Subaccount => "Subaccount",
            Dimension::CityTax => "CityTax",
        }
    }

    /// Human label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Vat => "VAT",
            Dimension::Subaccount => "Subaccount",
            Dimension::CityTax => "City Tax",
        }
    }

    /// Whether an observed value satisfies the expected one.
    pub fn values_match(&self, observed: &str, expected: &str) -> bool {
        match self {
            Dimension::Subaccount => observed.trim() == expected.trim(),
            Dimension::Vat => observed.trim().to_lowercase() == expected.trim().to_lowercase(),
            Dimension::CityTax => TaxFlag::normalize(observed) == TaxFlag::normalize(expected),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();

        match normalized.as_str() {
            "vat" => Ok(Dimension::Vat),
            "subaccount" => Ok(Dimension::Subaccount),
            "citytax" => Ok(Dimension::CityTax),
            _ => Err(format!("unknown field '{}'", s.trim())),
        }
    }
}

/// Urgency of a finding. Ordered so that `High` sorts last; use `Reverse` for
/// most-urgent-first listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn for_deviation(dimension: Dimension, city_tax_applicable: bool) -> Self {
        match dimension {
            Dimension::Vat => Priority::High,
            Dimension::Subaccount => Priority::Medium,
            Dimension::CityTax if city_tax_applicable => Priority::High,
            Dimension::CityTax => Priority::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("unknown priority '{}'", s.trim())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_by_dimension() {
        assert_eq!(Priority::for_deviation(Dimension::Vat, false), Priority::High);
        assert_eq!(Priority::for_deviation(Dimension::Subaccount, true), Priority::Medium);
        assert_eq!(Priority::for_deviation(Dimension::CityTax, true), Priority::High);
        assert_eq!(Priority::for_deviation(Dimension::CityTax, false), Priority::Low);
    }

    #[test]
    fn test_values_match_per_dimension() {
        assert!(Dimension::Vat.values_match(" reduced", "Reduced"));
        assert!(!Dimension::Subaccount.values_match("108000a", "108000A"));
        assert!(Dimension::Subaccount.values_match("108000 ", "108000"));
        assert!(Dimension::CityTax.values_match("1", "Yes"));
        assert!(!Dimension::CityTax.values_match("maybe", "No"));
    }

    #[test]
    fn test_dimension_parsing() {
        assert_eq!("VAT".parse::<Dimension>().unwrap(), Dimension::Vat);
        assert_eq!("subaccount".parse::<Dimension>().unwrap(), Dimension::Subaccount);
        assert_eq!("City Tax".parse::<Dimension>().unwrap(), Dimension::CityTax);
        assert_eq!("CityTax".parse::<Dimension>().unwrap(), Dimension::CityTax);
        assert!("Currency".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Dimension::Vat < Dimension::Subaccount);
        assert!(Dimension::Subaccount < Dimension::CityTax);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }
}
