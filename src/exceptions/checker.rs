use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use glob::Pattern;

use super::models::{ExceptionRule, ExceptionsFile, RuleType};
use crate::policy::{Deviation, Dimension, Priority};
use crate::records::TaxFlag;

/// Metadata of the rule that accepted a deviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRule {
    /// Position of the rule in the exceptions file.
    pub index: usize,
    pub rule_type: RuleType,
    pub reason: String,
    pub approved_by: String,
    pub priority: Option<Priority>,
    pub review_date: Option<NaiveDate>,
    pub notes: String,
}

impl AppliedRule {
    fn from_rule(index: usize, rule: &ExceptionRule) -> Self {
        Self {
            index,
            rule_type: rule.rule_type,
            reason: rule.reason.clone(),
            approved_by: rule.approved_by.clone(),
            priority: rule.priority,
            review_date: rule.review_date,
            notes: rule.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedDeviation {
    pub deviation: Deviation,
    pub rule: AppliedRule,
}

/// Deviations split into those covered by an exception and those needing action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub accepted: Vec<AcceptedDeviation>,
    pub issues: Vec<Deviation>,
}

/// True when one entry of a comma-separated list equals `code` or matches it
/// as a glob pattern. An empty list matches nothing.
fn code_list_matches(list: &str, code: &str) -> bool {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .any(|entry| {
            if entry == code {
                return true;
            }
            if entry.contains(['*', '?', '[']) {
                if let Ok(pattern) = Pattern::new(entry) {
                    return pattern.matches(code);
                }
            }
            false
        })
}

/// Comparison form of a value: case-insensitive, city tax as Yes/No/Unknown.
pub(crate) fn normalize_value(dimension: Dimension, value: &str) -> String {
    match dimension {
        Dimension::CityTax => TaxFlag::normalize(value).as_str().to_lowercase(),
        _ => value.trim().to_lowercase(),
    }
}

impl ExceptionRule {
    /// Whether the rule's scope covers the deviation's hotel, rate and country.
    pub fn scope_matches(&self, deviation: &Deviation) -> bool {
        let hotel = || code_list_matches(&self.hotel_code, &deviation.hotel_code);
        let rate = || code_list_matches(&self.rate_code, &deviation.rate_code);
        let country = || {
            !self.country.is_empty() && self.country.trim().eq_ignore_ascii_case(deviation.country.trim())
        };

        match self.rule_type {
            RuleType::Global => true,
            RuleType::CountryPattern => country(),
            RuleType::RatePattern => rate(),
            RuleType::CountryRatePattern => country() && rate(),
            RuleType::HotelSpecific | RuleType::HotelPattern => hotel(),
            RuleType::HotelRateSpecific | RuleType::HotelRatePattern => hotel() && rate(),
        }
    }

    /// Observed value must equal the approved one; the expected value is only
    /// checked when the rule names it.
    pub fn value_matches(&self, deviation: &Deviation) -> bool {
        let dimension = deviation.dimension;
        if normalize_value(dimension, &self.current_value) != normalize_value(dimension, &deviation.observed) {
            return false;
        }

        self.standard_value.trim().is_empty()
            || normalize_value(dimension, &self.standard_value) == normalize_value(dimension, &deviation.expected)
    }

    pub fn matches(&self, deviation: &Deviation) -> bool {
        self.is_active()
            && self.field == deviation.dimension
            && self.value_matches(deviation)
            && self.scope_matches(deviation)
    }
}

impl ExceptionsFile {
    /// The rule that accepts a deviation: the most specific matching rule,
    /// and among equally specific ones the first declared.
    pub fn find_rule(&self, deviation: &Deviation) -> Option<(usize, &ExceptionRule)> {
        self.exceptions
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(deviation))
            .min_by_key(|(index, rule)| (Reverse(rule.specificity()), *index))
    }

    pub fn is_accepted(&self, deviation: &Deviation) -> bool {
        self.find_rule(deviation).is_some()
    }

    /// Split deviations into accepted ones and issues, preserving input order.
    pub fn match_deviations<I>(&self, deviations: I) -> MatchOutcome
    where
        I: IntoIterator<Item = Deviation>,
    {
        let mut outcome = MatchOutcome::default();

        for deviation in deviations {
            match self.find_rule(&deviation) {
                Some((index, rule)) => {
                    let rule = AppliedRule::from_rule(index, rule);
                    outcome.accepted.push(AcceptedDeviation { deviation, rule });
                }
                None => outcome.issues.push(deviation),
            }
        }

        outcome
    }
}
