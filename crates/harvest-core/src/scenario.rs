//! Scenario descriptors and their serialized form.
//!
//! ## Entry shape
//!
//! ```json
//! {
//!   "url": "https://supplier.test/category/kettles",
//!   "presta_categories": {
//!     "default_category": 11,
//!     "additional_categories": ["12", 13]
//!   }
//! }
//! ```
//!
//! Unknown keys are ignored. Category ids may be numbers or numeric strings;
//! `additional_categories` may also be a single id.
//!
//! ## Document shapes
//!
//! A scenario document is one entry, a list of entries, or an object with a
//! `scenarios` map of `name → entry`. Each entry is validated on its own so a
//! bad entry never hides its valid siblings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScenarioError;

pub type CategoryId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioOrigin {
    Inline,
    Discovered,
}

/// One listing page plus the category metadata its items inherit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    /// Label for logs: the map key, file stem, or list position.
    pub name: String,
    pub source_url: String,
    pub default_category_id: Option<CategoryId>,
    /// Deduplicated, excludes `default_category_id`, keeps first-seen order.
    pub additional_category_ids: Vec<CategoryId>,
    pub origin: ScenarioOrigin,
}

impl ScenarioDescriptor {
    /// Default category followed by the additional ones; no duplicates.
    #[must_use]
    pub fn category_ids(&self) -> Vec<CategoryId> {
        let mut ids: Vec<CategoryId> = self.default_category_id.into_iter().collect();
        for id in &self.additional_category_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }

    /// Validates one serialized entry.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] when the entry is not an object, has no
    /// usable `url`, or carries a category id that is not a non-negative
    /// integer.
    pub fn from_value(
        value: &Value,
        name: &str,
        origin: ScenarioOrigin,
    ) -> Result<Self, ScenarioError> {
        if !value.is_object() {
            return Err(ScenarioError::NotAnObject {
                entry: name.to_string(),
            });
        }

        let raw: RawScenario =
            serde_json::from_value(value.clone()).map_err(|e| ScenarioError::Malformed {
                entry: name.to_string(),
                reason: e.to_string(),
            })?;

        let url = raw
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ScenarioError::MissingUrl {
                entry: name.to_string(),
            })?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ScenarioError::InvalidUrl {
                entry: name.to_string(),
                url,
            });
        }

        let categories = raw.presta_categories.unwrap_or_default();
        let default_category_id = categories
            .default_category
            .as_ref()
            .map(|v| category_id(v, name))
            .transpose()?;

        let additional: Vec<&Value> = match &categories.additional_categories {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
        };

        let mut additional_category_ids = Vec::new();
        for v in additional {
            let id = category_id(v, name)?;
            if Some(id) != default_category_id && !additional_category_ids.contains(&id) {
                additional_category_ids.push(id);
            }
        }

        Ok(Self {
            name: name.to_string(),
            source_url: url,
            default_category_id,
            additional_category_ids,
            origin,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawScenario {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    presta_categories: Option<RawCategories>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCategories {
    #[serde(default)]
    default_category: Option<Value>,
    #[serde(default)]
    additional_categories: Option<Value>,
}

fn category_id(value: &Value, entry: &str) -> Result<CategoryId, ScenarioError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| CategoryId::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<CategoryId>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ScenarioError::InvalidCategory {
        entry: entry.to_string(),
        reason: format!("{value} is not a category id"),
    })
}

/// Splits a scenario document into valid descriptors and per-entry
/// rejections. `label` prefixes entry names (a file stem, or `"inline"`).
#[must_use]
pub fn parse_scenario_document(
    document: &Value,
    label: &str,
    origin: ScenarioOrigin,
) -> (Vec<ScenarioDescriptor>, Vec<ScenarioError>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    let mut push = |value: &Value, name: String| {
        match ScenarioDescriptor::from_value(value, &name, origin) {
            Ok(d) => accepted.push(d),
            Err(e) => rejected.push(e),
        }
    };

    match document {
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                push(item, format!("{label}[{idx}]"));
            }
        }
        Value::Object(map) => match map.get("scenarios") {
            Some(Value::Object(named)) => {
                for (key, item) in named {
                    push(item, format!("{label}/{key}"));
                }
            }
            Some(Value::Array(items)) => {
                for (idx, item) in items.iter().enumerate() {
                    push(item, format!("{label}[{idx}]"));
                }
            }
            _ => push(document, label.to_string()),
        },
        other => push(other, label.to_string()),
    }

    (accepted, rejected)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_full_entry() {
        let value = json!({
            "url": "https://supplier.test/c/kettles",
            "presta_categories": {
                "default_category": 11,
                "additional_categories": ["12", 13]
            },
            "checkbox": false
        });
        let d = ScenarioDescriptor::from_value(&value, "kettles", ScenarioOrigin::Inline).unwrap();
        assert_eq!(d.source_url, "https://supplier.test/c/kettles");
        assert_eq!(d.default_category_id, Some(11));
        assert_eq!(d.additional_category_ids, vec![12, 13]);
        assert_eq!(d.origin, ScenarioOrigin::Inline);
    }

    #[test]
    fn additional_ids_drop_default_and_repeats() {
        let value = json!({
            "url": "https://supplier.test/c",
            "presta_categories": {
                "default_category": "3",
                "additional_categories": [3, "5", 5, 3]
            }
        });
        let d = ScenarioDescriptor::from_value(&value, "c", ScenarioOrigin::Inline).unwrap();
        assert_eq!(d.additional_category_ids, vec![5]);
        assert_eq!(d.category_ids(), vec![3, 5]);
    }

    #[test]
    fn single_additional_category_is_accepted() {
        let value = json!({
            "url": "https://supplier.test/c",
            "presta_categories": { "additional_categories": 9 }
        });
        let d = ScenarioDescriptor::from_value(&value, "c", ScenarioOrigin::Inline).unwrap();
        assert_eq!(d.default_category_id, None);
        assert_eq!(d.category_ids(), vec![9]);
    }

    #[test]
    fn missing_url_is_rejected() {
        let value = json!({ "presta_categories": { "default_category": 1 } });
        let err = ScenarioDescriptor::from_value(&value, "x", ScenarioOrigin::Inline).unwrap_err();
        assert!(matches!(err, ScenarioError::MissingUrl { .. }));
    }

    #[test]
    fn non_http_url_is_rejected() {
        let value = json!({ "url": "ftp://supplier.test" });
        let err = ScenarioDescriptor::from_value(&value, "x", ScenarioOrigin::Inline).unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidUrl { .. }));
    }

    #[test]
    fn bad_category_is_rejected() {
        let value = json!({
            "url": "https://supplier.test",
            "presta_categories": { "default_category": "kitchen" }
        });
        let err = ScenarioDescriptor::from_value(&value, "x", ScenarioOrigin::Inline).unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidCategory { .. }));
    }

    #[test]
    fn non_string_url_is_malformed() {
        let value = json!({ "url": 42 });
        let err = ScenarioDescriptor::from_value(&value, "x", ScenarioOrigin::Inline).unwrap_err();
        assert!(matches!(err, ScenarioError::Malformed { .. }));
    }

    #[test]
    fn document_list_keeps_valid_entries() {
        let doc = json!([
            { "url": "https://a.test" },
            "not an object",
            { "url": "https://b.test" }
        ]);
        let (ok, bad) = parse_scenario_document(&doc, "inline", ScenarioOrigin::Inline);
        assert_eq!(ok.len(), 2);
        assert_eq!(bad.len(), 1);
        assert_eq!(ok[0].name, "inline[0]");
        assert_eq!(ok[1].name, "inline[2]");
    }

    #[test]
    fn document_scenarios_map_uses_keys_as_names() {
        let doc = json!({
            "scenarios": {
                "kettles": { "url": "https://a.test/kettles" },
                "toasters": { "url": "https://a.test/toasters" }
            }
        });
        let (ok, bad) = parse_scenario_document(&doc, "kitchen", ScenarioOrigin::Discovered);
        assert!(bad.is_empty());
        let names: Vec<_> = ok.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["kitchen/kettles", "kitchen/toasters"]);
    }

    #[test]
    fn document_single_object() {
        let doc = json!({ "url": "https://a.test" });
        let (ok, bad) = parse_scenario_document(&doc, "one", ScenarioOrigin::Inline);
        assert_eq!(ok.len(), 1);
        assert!(bad.is_empty());
        assert_eq!(ok[0].name, "one");
    }
}
