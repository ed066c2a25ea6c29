//! Field normalizers.
//!
//! Every [`crate::FieldDefinition`] names one normalizer. It turns the raw
//! strings a driver returns into a typed [`FieldValue`], or rejects them; a
//! rejection is handled by the extractor exactly like a locator miss.
//!
//! Parsing uses manual scanning rather than `regex` to keep this crate
//! dependency-light.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::record::normalize_sku;
use crate::value::{FieldValue, Resolved};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    /// Pass the first value through untouched (or every value, for lists).
    Raw,
    /// Collapse whitespace; multiple matches are joined with a space.
    #[default]
    Text,
    /// Decimal price; currency symbols and thousands separators dropped.
    Price,
    /// First run of digits, e.g. `"12 in stock"` → `12`.
    Integer,
    /// Identifier cleanup shared with `product_id` derivation.
    Sku,
    /// Trimmed, whitespace-free URL.
    Url,
    /// Yes/no style availability flags.
    Bool,
    /// Trimmed, de-duplicated list of non-empty strings.
    List,
}

impl Normalizer {
    /// Applies the normalizer to a resolved value.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the input is empty or cannot be
    /// interpreted (e.g. a price with no digits).
    pub fn apply(self, resolved: Resolved) -> Result<FieldValue, String> {
        match self {
            Normalizer::Raw => Ok(match resolved {
                Resolved::One(s) => FieldValue::Text(s),
                Resolved::Many(items) => FieldValue::List(items),
            }),
            Normalizer::Text => {
                let joined = resolved
                    .into_vec()
                    .iter()
                    .map(|s| collapse_whitespace(s))
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.is_empty() {
                    Err("empty text".to_string())
                } else {
                    Ok(FieldValue::Text(joined))
                }
            }
            Normalizer::Price => {
                let raw = first_non_empty(resolved).ok_or("empty price")?;
                parse_price(&raw)
                    .map(FieldValue::Decimal)
                    .ok_or_else(|| format!("unparseable price \"{raw}\""))
            }
            Normalizer::Integer => {
                let raw = first_non_empty(resolved).ok_or("empty integer")?;
                parse_integer(&raw)
                    .map(FieldValue::Integer)
                    .ok_or_else(|| format!("no integer in \"{raw}\""))
            }
            Normalizer::Sku => {
                let raw = first_non_empty(resolved).ok_or("empty sku")?;
                let sku = normalize_sku(&raw);
                if sku.is_empty() {
                    Err(format!("sku \"{raw}\" has no usable characters"))
                } else {
                    Ok(FieldValue::Text(sku))
                }
            }
            Normalizer::Url => {
                let raw = first_non_empty(resolved).ok_or("empty url")?;
                let url: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
                Ok(FieldValue::Text(url))
            }
            Normalizer::Bool => {
                let raw = first_non_empty(resolved).ok_or("empty flag")?;
                parse_flag(&raw)
                    .map(FieldValue::Bool)
                    .ok_or_else(|| format!("unrecognised flag \"{raw}\""))
            }
            Normalizer::List => {
                let mut items: Vec<String> = Vec::new();
                for item in resolved.into_vec() {
                    let item = collapse_whitespace(&item);
                    if !item.is_empty() && !items.contains(&item) {
                        items.push(item);
                    }
                }
                if items.is_empty() {
                    Err("empty list".to_string())
                } else {
                    Ok(FieldValue::List(items))
                }
            }
        }
    }

    /// Runs a catalog default through the normalizer so defaults carry the
    /// same type as extracted values.
    ///
    /// # Errors
    ///
    /// Same as [`Normalizer::apply`].
    pub fn coerce(self, value: &FieldValue) -> Result<FieldValue, String> {
        self.apply(value.to_resolved())
    }
}

fn first_non_empty(resolved: Resolved) -> Option<String> {
    resolved
        .into_vec()
        .into_iter()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a price string into a [`Decimal`].
///
/// Rules:
/// - Everything except digits, `,`, `.` and a leading `-` is dropped
///   (currency symbols, spaces, NBSP).
/// - When both `,` and `.` appear, the last one is the decimal separator.
/// - A lone separator kind appearing more than once is a thousands separator.
/// - A single `,` followed by exactly three digits is a thousands separator;
///   otherwise it is the decimal separator. A single `.` is always decimal.
#[must_use]
pub(crate) fn parse_price(raw: &str) -> Option<Decimal> {
    let negative = raw.trim_start().starts_with('-');
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let kept = kept.trim_matches(|c| c == ',' || c == '.');
    if !kept.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let commas = kept.matches(',').count();
    let dots = kept.matches('.').count();

    let canonical = match (commas, dots) {
        (0, 0) => kept.to_string(),
        (_, 0) if commas > 1 => kept.replace(',', ""),
        (0, _) if dots > 1 => kept.replace('.', ""),
        (1, 0) => {
            let frac_len = kept.len() - kept.find(',')? - 1;
            if frac_len == 3 {
                kept.replace(',', "")
            } else {
                kept.replace(',', ".")
            }
        }
        (0, 1) => kept.to_string(),
        _ => {
            let last_comma = kept.rfind(',')?;
            let last_dot = kept.rfind('.')?;
            if last_comma > last_dot {
                kept.replace('.', "").replace(',', ".")
            } else {
                kept.replace(',', "")
            }
        }
    };

    let value = Decimal::from_str(&canonical).ok()?;
    Some(if negative { -value } else { value })
}

/// Extracts the first run of ASCII digits as an integer.
#[must_use]
pub(crate) fn parse_integer(raw: &str) -> Option<i64> {
    let bytes = raw.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let end = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |offset| start + offset);
    let negative = start > 0 && bytes[start - 1] == b'-';
    let value = raw[start..end].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

fn parse_flag(raw: &str) -> Option<bool> {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "1" | "true" | "yes" | "y" | "on" | "in stock" | "available" | "instock" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "out of stock" | "unavailable" | "outofstock" => {
            Some(false)
        }
        _ => None,
    }
}
