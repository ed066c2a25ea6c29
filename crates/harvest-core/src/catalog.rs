//! Supplier catalogs: the locators and field definitions for one supplier.
//!
//! Loaded once at startup from YAML (JSON parses too, being a YAML subset)
//! and validated before any run begins. A catalog that fails validation is
//! fatal; nothing is scraped with a half-valid catalog.
//!
//! ```yaml
//! supplier_id: "2787"
//! hook: close_banner
//! listing:
//!   item_links: product_links
//!   next_page: pagination_next
//! locators:
//!   close_banner: { by: css, selector: "#popup .close", event: click(), timeout: 1 }
//!   product_links: { by: css, selector: "a.product", attribute: href, if_list: all }
//!   pagination_next: { by: css, selector: "a.next", attribute: href }
//!   title: { by: xpath, selector: "//h1" }
//! fields:
//!   - { name: name, locator: title, required: true }
//!   - { name: price, locator: price, normalizer: price, default: 0 }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::FieldName;
use crate::locator::{LocatorSpec, Multiplicity};
use crate::normalize::Normalizer;
use crate::value::FieldValue;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: FieldName,
    /// Key into [`SupplierCatalog::locators`]. Absent for computed fields and
    /// fields only ever supplied explicitly by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(default)]
    pub normalizer: Normalizer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(default)]
    pub required: bool,
}

/// Locator names that drive category pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingLocators {
    /// Must be `if_list: all`.
    pub item_links: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierCatalog {
    #[serde(deserialize_with = "string_or_number")]
    pub supplier_id: String,
    /// Locator fired once before the first field extraction on every item
    /// page (pop-up dismissal and the like).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
    pub listing: ListingLocators,
    pub locators: BTreeMap<String, LocatorSpec>,
    pub fields: Vec<FieldDefinition>,
}

impl SupplierCatalog {
    #[must_use]
    pub fn locator(&self, name: &str) -> Option<&LocatorSpec> {
        self.locators.get(name)
    }

    #[must_use]
    pub fn field(&self, name: FieldName) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn hook_locator(&self) -> Option<&LocatorSpec> {
        self.hook.as_deref().and_then(|name| self.locator(name))
    }

    #[must_use]
    pub fn item_links_locator(&self) -> Option<&LocatorSpec> {
        self.locator(&self.listing.item_links)
    }

    #[must_use]
    pub fn next_page_locator(&self) -> Option<&LocatorSpec> {
        self.listing
            .next_page
            .as_deref()
            .and_then(|name| self.locator(name))
    }

    /// Serializes the catalog back to YAML.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_yaml` error (not expected for a
    /// validated catalog).
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Text(s) => s,
        Repr::Number(n) => n.to_string(),
    })
}

/// Load and validate a supplier catalog from disk.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<SupplierCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_catalog(&content, &path.display().to_string())
}

/// Parse and validate a supplier catalog from a string. `origin` is only used
/// in error messages.
///
/// # Errors
///
/// Returns [`ConfigError::CatalogParse`] for syntax/shape errors and
/// [`ConfigError::Validation`] for semantic errors.
pub fn parse_catalog(content: &str, origin: &str) -> Result<SupplierCatalog, ConfigError> {
    let catalog: SupplierCatalog =
        serde_yaml::from_str(content).map_err(|e| ConfigError::CatalogParse {
            path: origin.to_string(),
            source: e,
        })?;
    validate_catalog(catalog)
}

/// Checks cross-references and coerces field defaults through their
/// normalizers.
fn validate_catalog(mut catalog: SupplierCatalog) -> Result<SupplierCatalog, ConfigError> {
    let invalid = |msg: String| ConfigError::Validation(msg);

    if catalog.supplier_id.trim().is_empty() {
        return Err(invalid("supplier_id must be non-empty".to_string()));
    }

    for (name, locator) in &catalog.locators {
        locator
            .validate()
            .map_err(|reason| invalid(format!("locator '{name}': {reason}")))?;
    }

    let item_links = catalog.item_links_locator().ok_or_else(|| {
        invalid(format!(
            "listing.item_links references unknown locator '{}'",
            catalog.listing.item_links
        ))
    })?;
    if item_links.if_list != Multiplicity::All {
        return Err(invalid(format!(
            "listing.item_links locator '{}' must use if_list: all",
            catalog.listing.item_links
        )));
    }

    if let Some(next) = &catalog.listing.next_page {
        if catalog.locator(next).is_none() {
            return Err(invalid(format!(
                "listing.next_page references unknown locator '{next}'"
            )));
        }
    }

    if let Some(hook) = &catalog.hook {
        if catalog.locator(hook).is_none() {
            return Err(invalid(format!("hook references unknown locator '{hook}'")));
        }
    }

    let mut seen = HashSet::new();
    for field in &mut catalog.fields {
        if !seen.insert(field.name) {
            return Err(invalid(format!("duplicate field '{}'", field.name)));
        }

        if field.name.is_computed() && field.locator.is_some() {
            return Err(invalid(format!(
                "field '{}' is computed and cannot have a locator",
                field.name
            )));
        }

        if let Some(locator) = &field.locator {
            if !catalog.locators.contains_key(locator) {
                return Err(invalid(format!(
                    "field '{}' references unknown locator '{locator}'",
                    field.name
                )));
            }
        }

        if let Some(default) = &field.default {
            let coerced = field.normalizer.coerce(default).map_err(|reason| {
                invalid(format!(
                    "field '{}' default is rejected by its normalizer: {reason}",
                    field.name
                ))
            })?;
            field.default = Some(coerced);
        }
    }

    if !seen.contains(&FieldName::Sku) {
        return Err(invalid(
            "field 'sku' must be defined; product_id cannot be derived without it".to_string(),
        ));
    }

    Ok(catalog)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
