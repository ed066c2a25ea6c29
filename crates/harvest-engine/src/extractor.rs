//! Per-field extraction.
//!
//! Each field in the supplier catalog gets one [`FieldExtractor`], built once
//! into an [`ExtractorRegistry`]. Extraction never fails for missing data:
//! the result is an [`Outcome`] and the caller folds it into the record. Only
//! fatal driver errors come back as `Err`.

use std::collections::BTreeMap;
use std::fmt;

use harvest_core::{FieldDefinition, FieldName, FieldValue, LocatorSpec, SupplierCatalog};

use crate::driver::Driver;
use crate::error::{DriverError, EngineError};
use crate::hook::{with_pending_hook, PendingHook};

/// Why a field produced no extracted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// The locator matched nothing.
    LocatorMiss,
    /// The driver gave up waiting.
    LocatorTimeout,
    /// The element was found but the event or read failed.
    Interaction(String),
    NormalizerRejected(String),
    /// The field has no locator and no explicit value was supplied.
    NoLocator,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::LocatorMiss => f.write_str("locator matched nothing"),
            MissReason::LocatorTimeout => f.write_str("locator timed out"),
            MissReason::Interaction(e) => write!(f, "interaction failed: {e}"),
            MissReason::NormalizerRejected(e) => write!(f, "normalizer rejected value: {e}"),
            MissReason::NoLocator => f.write_str("no locator and no explicit value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(FieldValue),
    /// Nothing extracted; `default` is the catalog default, if any.
    SoftFail {
        default: Option<FieldValue>,
        reason: MissReason,
    },
    /// A required or mandatory field has neither a value nor a default.
    HardFail { field: FieldName, reason: MissReason },
}

impl Outcome {
    /// The value to store on the record, if any.
    #[must_use]
    pub fn value(&self) -> Option<&FieldValue> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::SoftFail { default, .. } => default.as_ref(),
            Outcome::HardFail { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    definition: FieldDefinition,
    locator: Option<LocatorSpec>,
}

impl FieldExtractor {
    #[must_use]
    pub fn new(definition: FieldDefinition, locator: Option<LocatorSpec>) -> Self {
        Self {
            definition,
            locator,
        }
    }

    #[must_use]
    pub fn name(&self) -> FieldName {
        self.definition.name
    }

    #[must_use]
    pub fn definition(&self) -> &FieldDefinition {
        &self.definition
    }

    #[must_use]
    pub fn locator(&self) -> Option<&LocatorSpec> {
        self.locator.as_ref()
    }

    /// A miss on this field flags the record when no default exists.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.definition.required || self.locator.as_ref().is_some_and(|l| l.mandatory)
    }

    /// Explicit value, then locator, then default. Callers go through
    /// [`ExtractorRegistry::extract`] so the pending hook always fires first.
    ///
    /// # Errors
    ///
    /// Returns the driver error only when it is fatal.
    pub(crate) async fn extract<D>(
        &self,
        driver: &D,
        explicit: Option<FieldValue>,
    ) -> Result<Outcome, DriverError>
    where
        D: Driver + ?Sized,
    {
        if let Some(value) = explicit {
            return Ok(Outcome::Success(value));
        }

        let Some(locator) = &self.locator else {
            return Ok(self.miss(MissReason::NoLocator));
        };

        let reason = match driver.resolve(locator).await {
            Ok(Some(raw)) => match self.definition.normalizer.apply(raw) {
                Ok(value) => return Ok(Outcome::Success(value)),
                Err(reason) => MissReason::NormalizerRejected(reason),
            },
            Ok(None) => MissReason::LocatorMiss,
            Err(e) if e.is_fatal() => return Err(e),
            Err(DriverError::Timeout { .. }) => MissReason::LocatorTimeout,
            Err(e) => MissReason::Interaction(e.to_string()),
        };
        Ok(self.miss(reason))
    }

    fn miss(&self, reason: MissReason) -> Outcome {
        match &self.definition.default {
            Some(default) => Outcome::SoftFail {
                default: Some(default.clone()),
                reason,
            },
            None if self.is_required() => Outcome::HardFail {
                field: self.definition.name,
                reason,
            },
            None => Outcome::SoftFail {
                default: None,
                reason,
            },
        }
    }
}

/// One extractor per catalog field, keyed by field name.
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<FieldName, FieldExtractor>,
}

impl ExtractorRegistry {
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if a field references a locator the
    /// catalog does not define. Validated catalogs never do.
    pub fn build(catalog: &SupplierCatalog) -> Result<Self, EngineError> {
        let mut extractors = BTreeMap::new();
        for definition in &catalog.fields {
            let locator = match &definition.locator {
                Some(name) => Some(catalog.locator(name).cloned().ok_or_else(|| {
                    EngineError::Catalog {
                        reason: format!(
                            "field '{}' references unknown locator '{name}'",
                            definition.name
                        ),
                    }
                })?),
                None => None,
            };
            extractors.insert(
                definition.name,
                FieldExtractor::new(definition.clone(), locator),
            );
        }
        Ok(Self { extractors })
    }

    #[must_use]
    pub fn get(&self, name: FieldName) -> Option<&FieldExtractor> {
        self.extractors.get(&name)
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.extractors.keys().copied()
    }

    /// Extracts one field with the pending hook fired first.
    ///
    /// Fields the catalog does not define still accept an explicit value;
    /// without one they soft-fail with [`MissReason::NoLocator`].
    ///
    /// # Errors
    ///
    /// Returns the driver error only when it is fatal.
    pub async fn extract<D>(
        &self,
        name: FieldName,
        driver: &D,
        hook: &mut PendingHook,
        explicit: Option<FieldValue>,
    ) -> Result<Outcome, DriverError>
    where
        D: Driver + ?Sized,
    {
        let extractor = self.extractors.get(&name);
        with_pending_hook(hook, driver, || async move {
            match extractor {
                Some(extractor) => extractor.extract(driver, explicit).await,
                None => Ok(match explicit {
                    Some(value) => Outcome::Success(value),
                    None => Outcome::SoftFail {
                        default: None,
                        reason: MissReason::NoLocator,
                    },
                }),
            }
        })
        .await
    }
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
