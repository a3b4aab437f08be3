//! Best-effort suggestion of new exception rules from recurring issues.
//!
//! Issues are grouped by (hotel, dimension, observed value). Every group that
//! reaches the occurrence threshold becomes a hotel-wide candidate. Issues are
//! also grouped by country, and a country-wide candidate is proposed when the
//! same deviation recurs across more than one hotel of that country. This is a
//! grouping heuristic, not an optimal clustering.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use super::checker::normalize_value;
use super::models::{ExceptionRule, RuleStatus, RuleType};
use crate::policy::{Deviation, Dimension, Priority};

pub const DEFAULT_MIN_OCCURRENCES: usize = 3;

/// Occurrence count above which a suggestion is marked High.
const HIGH_PRIORITY_OCCURRENCES: usize = 10;

pub const PENDING_APPROVER: &str = "[TO_BE_APPROVED]";

/// A candidate exception rule awaiting human approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedRule {
    pub rule_type: RuleType,
    pub field: Dimension,
    /// Set for hotel-wide suggestions.
    pub hotel_code: String,
    /// Set for country-wide suggestions.
    pub country: String,
    pub hotels: Vec<String>,
    pub rate_codes: Vec<String>,
    pub current_value: String,
    /// Blank when members disagree on the expected value.
    pub standard_value: String,
    pub occurrences: usize,
    pub priority: Priority,
    pub reason: String,
}

impl SuggestedRule {
    fn scope(&self) -> &str {
        if self.hotel_code.is_empty() {
            &self.country
        } else {
            &self.hotel_code
        }
    }

    /// The rule in exceptions-file form, inactive until someone approves it.
    pub fn to_exception(&self, today: NaiveDate) -> ExceptionRule {
        ExceptionRule {
            rule_type: self.rule_type,
            field: self.field,
            hotel_code: self.hotel_code.clone(),
            rate_code: String::new(),
            country: self.country.clone(),
            current_value: self.current_value.clone(),
            standard_value: self.standard_value.clone(),
            reason: self.reason.clone(),
            approved_by: PENDING_APPROVER.to_string(),
            date_added: Some(today),
            status: RuleStatus::Inactive,
            priority: Some(self.priority),
            review_date: None,
            notes: format!("{} occurrences; rates: {}", self.occurrences, self.rate_codes.join(",")),
        }
    }
}

type GroupKey = (String, Dimension, String);

fn group_by<'a, F>(issues: &'a [Deviation], scope: F) -> BTreeMap<GroupKey, Vec<&'a Deviation>>
where
    F: Fn(&Deviation) -> Option<String>,
{
    let mut groups: BTreeMap<GroupKey, Vec<&Deviation>> = BTreeMap::new();
    for issue in issues {
        if let Some(scope) = scope(issue) {
            groups
                .entry((scope, issue.dimension, normalize_value(issue.dimension, &issue.observed)))
                .or_default()
                .push(issue);
        }
    }
    groups
}

/// `current_value` keeps the first member's spelling.
fn build(rule_type: RuleType, (scope, field, _): GroupKey, members: &[&Deviation]) -> SuggestedRule {
    let current_value = members
        .first()
        .map(|d| d.observed.trim().to_string())
        .unwrap_or_default();
    let hotels: BTreeSet<&str> = members.iter().map(|d| d.hotel_code.as_str()).collect();
    let rate_codes: BTreeSet<&str> = members
        .iter()
        .map(|d| d.rate_code.as_str())
        .filter(|rate| !rate.is_empty())
        .collect();
    let expected: BTreeSet<String> = members
        .iter()
        .map(|d| normalize_value(field, &d.expected))
        .collect();

    let occurrences = members.len();
    let standard_value = if expected.len() == 1 {
        members
            .first()
            .map(|d| d.expected.trim().to_string())
            .unwrap_or_default()
    } else {
        String::new()
    };

    let (hotel_code, country, reason) = match rule_type {
        RuleType::CountryPattern => (
            String::new(),
            scope.clone(),
            format!(
                "Multiple {} hotels with {} '{}' ({} instances)",
                scope,
                field.label(),
                current_value,
                occurrences
            ),
        ),
        _ => (
            scope.clone(),
            String::new(),
            format!(
                "{} rate plans repeatedly use {} '{}' ({} instances)",
                scope,
                field.label(),
                current_value,
                occurrences
            ),
        ),
    };

    SuggestedRule {
        rule_type,
        field,
        hotel_code,
        country,
        hotels: hotels.into_iter().map(str::to_string).collect(),
        rate_codes: rate_codes.into_iter().map(str::to_string).collect(),
        current_value,
        standard_value,
        occurrences,
        priority: if occurrences > HIGH_PRIORITY_OCCURRENCES {
            Priority::High
        } else {
            Priority::Medium
        },
        reason,
    }
}

/// Propose exception rules for issues that recur at least `min_occurrences`
/// times. Ranked by occurrences (descending), then dimension (VAT first),
/// then hotel-wide before country-wide, then scope and value.
pub fn suggest_rules(issues: &[Deviation], min_occurrences: usize) -> Vec<SuggestedRule> {
    let min_occurrences = min_occurrences.max(1);
    let mut suggestions = Vec::new();

    for (key, members) in group_by(issues, |d| Some(d.hotel_code.clone())) {
        if members.len() >= min_occurrences {
            suggestions.push(build(RuleType::HotelSpecific, key, &members));
        }
    }

    let by_country = group_by(issues, |d| {
        let country = d.country.trim();
        (!country.is_empty()).then(|| country.to_string())
    });
    for (key, members) in by_country {
        let hotels: BTreeSet<&str> = members.iter().map(|d| d.hotel_code.as_str()).collect();
        if hotels.len() > 1 && members.len() >= min_occurrences {
            suggestions.push(build(RuleType::CountryPattern, key, &members));
        }
    }

    suggestions.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then(a.field.cmp(&b.field))
            .then(b.rule_type.specificity().cmp(&a.rule_type.specificity()))
            .then_with(|| a.scope().cmp(b.scope()))
            .then_with(|| a.current_value.cmp(&b.current_value))
    });

    suggestions
}
