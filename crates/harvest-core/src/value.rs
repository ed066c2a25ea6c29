use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw value handed back by a driver for one locator: a single string for
/// `if_list: first`, every match for `if_list: all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolved {
    One(String),
    Many(Vec<String>),
}

impl Resolved {
    /// The first string, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Resolved::One(s) => Some(s.as_str()),
            Resolved::Many(items) => items.first().map(String::as_str),
        }
    }

    /// Every string, in match order.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Resolved::One(s) => vec![s],
            Resolved::Many(items) => items,
        }
    }
}

/// A normalized field value as stored on a [`crate::Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Text(String),
    List(Vec<String>),
    /// Only produced by the `price` normalizer; serialized as a string.
    Decimal(Decimal),
}

impl FieldValue {
    /// Scalar rendering used for identifiers (`supplier_id`, `sku`). Lists and
    /// booleans have no plain form.
    #[must_use]
    pub fn as_plain_string(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Decimal(d) => Some(d.to_string()),
            FieldValue::Bool(_) | FieldValue::List(_) => None,
        }
    }

    /// Re-expresses the value in driver terms so it can be run through a
    /// normalizer (used to coerce catalog defaults).
    #[must_use]
    pub fn to_resolved(&self) -> Resolved {
        match self {
            FieldValue::Text(s) => Resolved::One(s.clone()),
            FieldValue::Integer(i) => Resolved::One(i.to_string()),
            FieldValue::Decimal(d) => Resolved::One(d.to_string()),
            FieldValue::Bool(b) => Resolved::One(b.to_string()),
            FieldValue::List(items) => Resolved::Many(items.clone()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}
