//! Filter building for payout listings
//!
//! [`build_filter`] turns listing parameters into a [`Filter`]: a conjunction
//! of per-field conditions. A filter with no conditions matches everything.
//! The filter serializes to the operator form document stores expect
//! (`{"created": {"$gte": ...}, "status": {"$in": [...]}}`) and can also be
//! evaluated directly against a [`Document`].

use crate::types::{Document, PayoutQueryParams};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive timestamp bounds
///
/// Never empty: at least one bound is always set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    gte: Option<DateTime<Utc>>,
    lte: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Build a range, or `None` when neither bound is present
    pub fn new(gte: Option<DateTime<Utc>>, lte: Option<DateTime<Utc>>) -> Option<Self> {
        if gte.is_none() && lte.is_none() {
            None
        } else {
            Some(DateRange { gte, lte })
        }
    }

    pub fn gte(&self) -> Option<DateTime<Utc>> {
        self.gte
    }

    pub fn lte(&self) -> Option<DateTime<Utc>> {
        self.lte
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.gte.map_or(true, |lower| instant >= lower)
            && self.lte.map_or(true, |upper| instant <= upper)
    }
}

/// Constraint on a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value
    ///
    /// Scalars compare by their text, so `"2"` matches a field holding `2`.
    Equals(Value),
    /// Field is a scalar whose text is one of the values
    OneOf(BTreeSet<String>),
    /// Field is a timestamp inside the range
    Range(DateRange),
}

impl Condition {
    fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Condition::Equals(expected), Some(actual)) => {
                expected == actual
                    || matches!(
                        (scalar_text(expected), scalar_text(actual)),
                        (Some(a), Some(b)) if a == b
                    )
            }
            (Condition::OneOf(allowed), Some(actual)) => {
                scalar_text(actual).is_some_and(|text| allowed.contains(text.as_ref()))
            }
            (Condition::Range(range), Some(Value::String(raw))) => DateTime::parse_from_rfc3339(raw)
                .map(|instant| range.contains(instant.with_timezone(&Utc)))
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Text form of a string, number or boolean
fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text)),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
        _ => None,
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Condition::Equals(value) => value.serialize(serializer),
            Condition::OneOf(values) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$in", values)?;
                map.end()
            }
            Condition::Range(range) => {
                let mut map = serializer.serialize_map(None)?;
                if let Some(gte) = &range.gte {
                    map.serialize_entry("$gte", gte)?;
                }
                if let Some(lte) = &range.lte {
                    map.serialize_entry("$lte", lte)?;
                }
                map.end()
            }
        }
    }
}

/// Conjunction of field conditions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    /// A filter that matches everything
    pub fn new() -> Self {
        Filter::default()
    }

    /// Add (or replace) the condition on `field`
    pub fn with(mut self, field: &str, condition: Condition) -> Self {
        self.conditions.insert(field.to_string(), condition);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.conditions.get(field)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `document` satisfies every condition
    ///
    /// A missing field never satisfies a condition.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(document.get(field)))
    }
}

/// Build the listing filter for `params`
///
/// Only the sub-filters whose parameters are present are emitted. `page` is
/// not a filter parameter and is ignored here.
pub fn build_filter(params: &PayoutQueryParams) -> Filter {
    let mut filter = Filter::new();

    if let Some(range) = DateRange::new(params.start_date, params.end_date) {
        filter = filter.with("created", Condition::Range(range));
    }
    if let Some(range) = DateRange::new(params.payment_start_date, params.payment_end_date) {
        filter = filter.with("payment_date", Condition::Range(range));
    }

    if let Some(user_type) = params.user_type.as_deref().filter(|t| !t.is_empty()) {
        filter = filter.with("user_type", Condition::Equals(Value::from(user_type)));
    }

    if let Some(statuses) = params.statuses.as_deref() {
        let statuses: BTreeSet<String> = statuses
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if !statuses.is_empty() {
            filter = filter.with("status", Condition::OneOf(statuses));
        }
    }

    filter
}
