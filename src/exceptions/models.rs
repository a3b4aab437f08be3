use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::policy::{Dimension, Priority};

/// Scope kind of an exception rule, named as in the exceptions sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleType {
    #[serde(rename = "Global")]
    Global,
    #[serde(rename = "Country_Pattern")]
    CountryPattern,
    #[serde(rename = "Rate_Pattern")]
    RatePattern,
    #[serde(rename = "Country_Rate_Pattern")]
    CountryRatePattern,
    #[serde(rename = "Hotel_Specific")]
    HotelSpecific,
    #[serde(rename = "Hotel_Pattern")]
    HotelPattern,
    #[serde(rename = "Hotel_Rate_Specific")]
    HotelRateSpecific,
    #[serde(rename = "Hotel_Rate_Pattern")]
    HotelRatePattern,
}

/// How narrowly a rule is scoped. Higher wins when several rules match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Specificity {
    Global,
    Country,
    Rate,
    CountryRate,
    Hotel,
    HotelRate,
}

impl RuleType {
    pub const ALL: [RuleType; 8] = [
        RuleType::Global,
        RuleType::CountryPattern,
        RuleType::RatePattern,
        RuleType::CountryRatePattern,
        RuleType::HotelSpecific,
        RuleType::HotelPattern,
        RuleType::HotelRateSpecific,
        RuleType::HotelRatePattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Global => "Global",
            RuleType::CountryPattern => "Country_Pattern",
            RuleType::RatePattern => "Rate_Pattern",
            RuleType::CountryRatePattern => "Country_Rate_Pattern",
            RuleType::HotelSpecific => "Hotel_Specific",
            RuleType::HotelPattern => "Hotel_Pattern",
            RuleType::HotelRateSpecific => "Hotel_Rate_Specific",
            RuleType::HotelRatePattern => "Hotel_Rate_Pattern",
        }
    }

    pub fn specificity(&self) -> Specificity {
        match self {
            RuleType::Global => Specificity::Global,
            RuleType::CountryPattern => Specificity::Country,
            RuleType::RatePattern => Specificity::Rate,
            RuleType::CountryRatePattern => Specificity::CountryRate,
            RuleType::HotelSpecific | RuleType::HotelPattern => Specificity::Hotel,
            RuleType::HotelRateSpecific | RuleType::HotelRatePattern => Specificity::HotelRate,
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RuleType::ALL
            .iter()
            .copied()
            .find(|rule_type| rule_type.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown rule type '{}'", wanted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

impl RuleStatus {
    /// Blank means Active; anything that is not "active" disables the rule.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("active") {
            RuleStatus::Active
        } else {
            RuleStatus::Inactive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Active => "Active",
            RuleStatus::Inactive => "Inactive",
        }
    }
}

/// An approved, scoped override permitting a specific deviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRule {
    pub rule_type: RuleType,
    pub field: Dimension,
    /// Comma-separated hotel codes or glob patterns.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hotel_code: String,
    /// Comma-separated rate codes or glob patterns.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rate_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    /// The observed value this rule approves.
    pub current_value: String,
    /// Blank matches any expected value.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub standard_value: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub approved_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<NaiveDate>,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl ExceptionRule {
    pub fn new(rule_type: RuleType, field: Dimension, current_value: impl Into<String>) -> Self {
        Self {
            rule_type,
            field,
            hotel_code: String::new(),
            rate_code: String::new(),
            country: String::new(),
            current_value: current_value.into(),
            standard_value: String::new(),
            reason: String::new(),
            approved_by: String::new(),
            date_added: None,
            status: RuleStatus::Active,
            priority: None,
            review_date: None,
            notes: String::new(),
        }
    }

    pub fn hotels(mut self, hotel_code: impl Into<String>) -> Self {
        self.hotel_code = hotel_code.into();
        self
    }

    pub fn rates(mut self, rate_code: impl Into<String>) -> Self {
        self.rate_code = rate_code.into();
        self
    }

    pub fn in_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn expecting(mut self, standard_value: impl Into<String>) -> Self {
        self.standard_value = standard_value.into();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    pub fn specificity(&self) -> Specificity {
        self.rule_type.specificity()
    }

    /// Review date reached or passed.
    pub fn needs_review(&self, today: NaiveDate) -> bool {
        self.review_date.map_or(false, |date| date <= today)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionsFile {
    #[serde(default)]
    pub exceptions: Vec<ExceptionRule>,
}

impl ExceptionsFile {
    pub fn new() -> Self {
        Self {
            exceptions: Vec::new(),
        }
    }

    pub fn add_exception(&mut self, exception: ExceptionRule) {
        self.exceptions.push(exception);
    }

    pub fn len(&self) -> usize {
        self.exceptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exceptions.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.exceptions.iter().filter(|rule| rule.is_active()).count()
    }

    pub fn needs_review_count(&self, today: NaiveDate) -> usize {
        self.exceptions
            .iter()
            .filter(|rule| rule.is_active() && rule.needs_review(today))
            .count()
    }
}
