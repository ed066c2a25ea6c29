//! Extracted records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fields::FieldName;
use crate::scenario::CategoryId;
use crate::value::FieldValue;

/// All extracted fields for one item page.
///
/// `product_id` is owned by the record: it is recomputed from `supplier_id`
/// and `sku` every time either changes (and removed when they no longer
/// derive one). Direct assignment is ignored once both inputs are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Item page the record was extracted from.
    pub source_url: String,
    pub values: BTreeMap<FieldName, FieldValue>,
    /// Default category first, then additional ones; never contains duplicates.
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    /// Required fields that could not be resolved. Non-empty means the record
    /// is flagged invalid but still eligible for persistence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<FieldName>,
}

impl Record {
    #[must_use]
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            values: BTreeMap::new(),
            category_ids: Vec::new(),
            missing_required: Vec::new(),
        }
    }

    /// Stores a field value and refreshes the derived `product_id`.
    pub fn set(&mut self, field: FieldName, value: FieldValue) {
        if field == FieldName::ProductId && self.derived_product_id().is_some() {
            return;
        }
        self.values.insert(field, value);
        if matches!(field, FieldName::SupplierId | FieldName::Sku) {
            self.refresh_product_id();
        }
    }

    #[must_use]
    pub fn get(&self, field: FieldName) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    #[must_use]
    pub fn text(&self, field: FieldName) -> Option<String> {
        self.get(field).and_then(FieldValue::as_plain_string)
    }

    #[must_use]
    pub fn product_id(&self) -> Option<String> {
        self.text(FieldName::ProductId)
    }

    /// Marks a required field as unresolved. Idempotent.
    pub fn flag_missing(&mut self, field: FieldName) {
        if !self.missing_required.contains(&field) {
            self.missing_required.push(field);
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing_required.is_empty()
    }

    /// Attaches category ids: `default` first, then `additional` in order,
    /// skipping anything already present.
    pub fn attach_categories(&mut self, default: Option<CategoryId>, additional: &[CategoryId]) {
        for id in default.into_iter().chain(additional.iter().copied()) {
            if !self.category_ids.contains(&id) {
                self.category_ids.push(id);
            }
        }
    }

    /// Key used by idempotent sinks: `product_id` when derivable, otherwise
    /// the source URL.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.product_id()
            .unwrap_or_else(|| format!("url:{}", self.source_url))
    }

    fn derived_product_id(&self) -> Option<String> {
        let supplier = self.text(FieldName::SupplierId)?;
        let sku = self.text(FieldName::Sku)?;
        derive_product_id(&supplier, &sku)
    }

    fn refresh_product_id(&mut self) {
        match self.derived_product_id() {
            Some(id) => {
                self.values.insert(FieldName::ProductId, FieldValue::Text(id));
            }
            None => {
                self.values.remove(&FieldName::ProductId);
            }
        }
    }
}

/// Cleans a SKU for use inside `product_id`.
///
/// Whitespace is removed; only ASCII alphanumerics, `-`, `_` and `.` are kept.
/// Case is preserved.
#[must_use]
pub fn normalize_sku(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

/// `"<supplier_id>-<normalize_sku(sku)>"`, or `None` when either side is
/// empty after cleanup.
#[must_use]
pub fn derive_product_id(supplier_id: &str, sku: &str) -> Option<String> {
    let supplier = supplier_id.trim();
    let sku = normalize_sku(sku);
    if supplier.is_empty() || sku.is_empty() {
        return None;
    }
    Some(format!("{supplier}-{sku}"))
}
