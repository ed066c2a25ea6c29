//! Assembles one [`Record`] per item page.

use std::collections::BTreeMap;

use harvest_core::{FieldName, FieldValue, Record, SupplierCatalog};

use crate::driver::Driver;
use crate::error::{DriverError, EngineError};
use crate::extractor::{ExtractorRegistry, Outcome};
use crate::hook::PendingHook;

pub struct RecordAggregator {
    registry: ExtractorRegistry,
    supplier_id: String,
}

impl RecordAggregator {
    #[must_use]
    pub fn new(registry: ExtractorRegistry, supplier_id: impl Into<String>) -> Self {
        Self {
            registry,
            supplier_id: supplier_id.into(),
        }
    }

    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the registry cannot be built.
    pub fn from_catalog(catalog: &SupplierCatalog) -> Result<Self, EngineError> {
        Ok(Self::new(
            ExtractorRegistry::build(catalog)?,
            catalog.supplier_id.clone(),
        ))
    }

    /// Navigates to `item_url` and extracts `fields` in order
    /// ([`FieldName::CANONICAL`] when `None`).
    ///
    /// Returns `Ok(None)` when the page itself cannot be loaded. Field-level
    /// misses never abort: optional ones fall back to their default, required
    /// ones are flagged on the record. `product_id` is never extracted; it is
    /// derived by the record and flagged if it cannot be.
    ///
    /// # Errors
    ///
    /// Returns the driver error only when it is fatal.
    pub async fn collect<D>(
        &self,
        driver: &D,
        hook: &mut PendingHook,
        item_url: &str,
        fields: Option<&[FieldName]>,
        explicit: &BTreeMap<FieldName, FieldValue>,
    ) -> Result<Option<Record>, DriverError>
    where
        D: Driver + ?Sized,
    {
        if !driver.navigate(item_url).await? {
            tracing::warn!(item = %item_url, "failed to load item page; skipping");
            return Ok(None);
        }

        let fields = fields.unwrap_or(&FieldName::CANONICAL);
        let mut record = Record::new(item_url);
        let supplier_id = explicit
            .get(&FieldName::SupplierId)
            .cloned()
            .unwrap_or_else(|| FieldValue::Text(self.supplier_id.clone()));
        record.set(FieldName::SupplierId, supplier_id);

        for &name in fields {
            if name == FieldName::SupplierId || name.is_computed() {
                continue;
            }
            let outcome = self
                .registry
                .extract(name, driver, hook, explicit.get(&name).cloned())
                .await?;
            match outcome {
                Outcome::Success(value) => record.set(name, value),
                Outcome::SoftFail { default, reason } => {
                    tracing::debug!(
                        item = %item_url,
                        field = %name,
                        reason = %reason,
                        default_used = default.is_some(),
                        "field not extracted"
                    );
                    if let Some(value) = default {
                        record.set(name, value);
                    }
                }
                Outcome::HardFail { field, reason } => {
                    tracing::warn!(
                        item = %item_url,
                        field = %field,
                        reason = %reason,
                        "required field missing"
                    );
                    record.flag_missing(field);
                }
            }
        }

        if fields.contains(&FieldName::ProductId) && record.product_id().is_none() {
            tracing::warn!(item = %item_url, "product_id cannot be derived without a sku");
            record.flag_missing(FieldName::ProductId);
        }

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use harvest_core::parse_catalog;

    use super::*;
    use crate::testing::{one, Reply, ScriptedDriver};

    const ITEM: &str = "https://shop.test/p/kettle";

    const CATALOG: &str = r"
supplier_id: 2787
hook: popup
listing:
  item_links: links
locators:
  popup: { by: css, selector: .popup-close, event: click() }
  links: { by: css, selector: a.item, attribute: href, if_list: all }
  sku: { by: css, selector: .sku }
  title: { by: css, selector: h1 }
  price: { by: css, selector: .price }
fields:
  - { name: sku, locator: sku, normalizer: sku, required: true }
  - { name: product_id, required: true }
  - { name: name, locator: title, required: true }
  - { name: price, locator: price, normalizer: price, default: 0 }
";

    fn aggregator() -> RecordAggregator {
        RecordAggregator::from_catalog(&parse_catalog(CATALOG, "test").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn builds_record_with_derived_product_id() {
        let driver = ScriptedDriver::new().page(
            ITEM,
            &[
                (".sku", one("KT 100")),
                ("h1", one("  Steel   kettle ")),
                (".price", one("€ 24,90")),
            ],
        );
        let mut hook = PendingHook::new();

        let record = aggregator()
            .collect(&driver, &mut hook, ITEM, None, &BTreeMap::new())
            .await
            .unwrap()
            .unwrap();

        assert!(record.is_valid());
        assert_eq!(record.product_id().as_deref(), Some("2787-KT100"));
        assert_eq!(record.text(FieldName::Name).as_deref(), Some("Steel kettle"));
        assert_eq!(record.text(FieldName::Price).as_deref(), Some("24.90"));
        assert_eq!(record.source_url, ITEM);
    }

    #[tokio::test]
    async fn unreachable_item_yields_none() {
        let driver = ScriptedDriver::new().unreachable(ITEM);
        let mut hook = PendingHook::new();

        let record = aggregator()
            .collect(&driver, &mut hook, ITEM, None, &BTreeMap::new())
            .await
            .unwrap();

        assert!(record.is_none());
        assert!(driver.resolutions().is_empty());
    }

    #[tokio::test]
    async fn hard_failures_are_flagged_and_extraction_continues() {
        let driver = ScriptedDriver::new().page(ITEM, &[(".price", one("10"))]);
        let mut hook = PendingHook::new();

        let record = aggregator()
            .collect(&driver, &mut hook, ITEM, None, &BTreeMap::new())
            .await
            .unwrap()
            .unwrap();

        assert!(!record.is_valid());
        assert_eq!(
            record.missing_required,
            vec![FieldName::Sku, FieldName::Name, FieldName::ProductId]
        );
        assert_eq!(record.text(FieldName::Price).as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn hook_fires_once_per_item() {
        let driver = ScriptedDriver::new().page(ITEM, &[(".sku", one("A"))]);
        let catalog = parse_catalog(CATALOG, "test").unwrap();
        let mut hook = PendingHook::new();
        hook.set(catalog.hook_locator().unwrap().clone());

        aggregator()
            .collect(&driver, &mut hook, ITEM, None, &BTreeMap::new())
            .await
            .unwrap();

        let hook_calls = driver
            .resolutions()
            .iter()
            .filter(|s| s.as_str() == ".popup-close")
            .count();
        assert_eq!(hook_calls, 1);
        assert_eq!(driver.resolutions()[0], ".popup-close");
    }

    #[tokio::test]
    async fn selected_fields_only() {
        let driver = ScriptedDriver::new().page(ITEM, &[(".sku", one("A1")), ("h1", one("Kettle"))]);
        let mut hook = PendingHook::new();

        let record = aggregator()
            .collect(
                &driver,
                &mut hook,
                ITEM,
                Some(&[FieldName::Sku, FieldName::ProductId][..]),
                &BTreeMap::new(),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(driver.resolutions(), vec![".sku".to_string()]);
        assert_eq!(record.product_id().as_deref(), Some("2787-A1"));
        assert!(record.get(FieldName::Name).is_none());
    }

    #[tokio::test]
    async fn explicit_values_override_locators() {
        let driver = ScriptedDriver::new().page(ITEM, &[(".sku", one("A1")), ("h1", one("Kettle"))]);
        let mut hook = PendingHook::new();
        let explicit = BTreeMap::from([(FieldName::Name, FieldValue::from("Given name"))]);

        let record = aggregator()
            .collect(&driver, &mut hook, ITEM, None, &explicit)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.text(FieldName::Name).as_deref(), Some("Given name"));
        assert!(!driver.resolutions().contains(&"h1".to_string()));
    }

    #[tokio::test]
    async fn fatal_error_aborts_record() {
        let driver = ScriptedDriver::new().page(ITEM, &[("h1", Reply::Fatal)]);
        let mut hook = PendingHook::new();

        let result = aggregator()
            .collect(&driver, &mut hook, ITEM, None, &BTreeMap::new())
            .await;

        assert!(matches!(result, Err(DriverError::Session { .. })));
    }
}
