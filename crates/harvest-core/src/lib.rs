//! Shared domain types and configuration for the harvest workspace.
//!
//! Everything here is pure data: locator descriptions, the field catalog,
//! records, scenario descriptors, and the supplier catalog loader. Nothing in
//! this crate talks to a browser.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fields;
pub mod locator;
pub mod normalize;
pub mod record;
pub mod scenario;
pub mod value;

pub use app_config::{AppConfig, Environment};
pub use catalog::{
    load_catalog, parse_catalog, FieldDefinition, ListingLocators, SupplierCatalog,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ScenarioError};
pub use fields::FieldName;
pub use locator::{Event, LocatorSpec, Multiplicity, Strategy, WaitCondition};
pub use normalize::Normalizer;
pub use record::{derive_product_id, normalize_sku, Record};
pub use scenario::{parse_scenario_document, CategoryId, ScenarioDescriptor, ScenarioOrigin};
pub use value::{FieldValue, Resolved};
