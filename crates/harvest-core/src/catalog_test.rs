use super::*;
use crate::locator::{Event, Strategy};

const MINIMAL: &str = r"
supplier_id: acme
listing:
  item_links: links
locators:
  links: { by: css, selector: a.item, attribute: href, if_list: all }
  sku: { by: css, selector: .sku }
fields:
  - { name: sku, locator: sku, normalizer: sku, required: true }
";

fn expect_validation(content: &str, needle: &str) {
    let err = parse_catalog(content, "test").unwrap_err();
    match err {
        ConfigError::Validation(msg) => assert!(
            msg.contains(needle),
            "expected message containing {needle:?}, got {msg:?}"
        ),
        other => panic!("expected Validation error, got {other:?}"),
    }
}

#[test]
fn parses_minimal_catalog() {
    let catalog = parse_catalog(MINIMAL, "test").unwrap();
    assert_eq!(catalog.supplier_id, "acme");
    assert!(catalog.hook.is_none());
    assert_eq!(catalog.item_links_locator().unwrap().selector, "a.item");
    assert!(catalog.next_page_locator().is_none());
    assert_eq!(catalog.field(FieldName::Sku).unwrap().normalizer, Normalizer::Sku);
}

#[test]
fn numeric_supplier_id_is_accepted() {
    let content = MINIMAL.replace("supplier_id: acme", "supplier_id: 2787");
    let catalog = parse_catalog(&content, "test").unwrap();
    assert_eq!(catalog.supplier_id, "2787");
}

#[test]
fn rejects_blank_supplier_id() {
    expect_validation(
        &MINIMAL.replace("supplier_id: acme", "supplier_id: \"  \""),
        "supplier_id",
    );
}

#[test]
fn rejects_unknown_field_locator() {
    let content = MINIMAL.replace(
        "- { name: sku, locator: sku, normalizer: sku, required: true }",
        "- { name: sku, locator: sku, normalizer: sku, required: true }\n  - { name: name, locator: nope }",
    );
    expect_validation(&content, "unknown locator 'nope'");
}

#[test]
fn rejects_duplicate_field() {
    let content = MINIMAL.replace(
        "- { name: sku, locator: sku, normalizer: sku, required: true }",
        "- { name: sku, locator: sku }\n  - { name: sku, locator: sku }",
    );
    expect_validation(&content, "duplicate field 'sku'");
}

#[test]
fn rejects_product_id_with_locator() {
    let content = MINIMAL.replace(
        "- { name: sku, locator: sku, normalizer: sku, required: true }",
        "- { name: sku, locator: sku }\n  - { name: product_id, locator: sku }",
    );
    expect_validation(&content, "computed");
}

#[test]
fn rejects_item_links_with_first_policy() {
    let content = MINIMAL.replace(", if_list: all", "");
    expect_validation(&content, "if_list: all");
}

#[test]
fn rejects_missing_sku_field() {
    let content = MINIMAL.replace(
        "- { name: sku, locator: sku, normalizer: sku, required: true }",
        "- { name: name, locator: sku }",
    );
    expect_validation(&content, "'sku' must be defined");
}

#[test]
fn rejects_unknown_hook() {
    let content = MINIMAL.replace("supplier_id: acme", "supplier_id: acme\nhook: popup");
    expect_validation(&content, "hook references unknown locator 'popup'");
}

#[test]
fn rejects_blank_selector() {
    let content = MINIMAL.replace("selector: .sku", "selector: \"\"");
    expect_validation(&content, "locator 'sku'");
}

#[test]
fn rejects_default_the_normalizer_cannot_read() {
    let content = MINIMAL.replace(
        "- { name: sku, locator: sku, normalizer: sku, required: true }",
        "- { name: sku, locator: sku }\n  - { name: price, normalizer: price, default: free }",
    );
    expect_validation(&content, "default is rejected");
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let err = parse_catalog("supplier_id: [unterminated", "broken.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::CatalogParse { ref path, .. } if path == "broken.yaml"));
}

#[test]
fn unknown_strategy_is_a_parse_error() {
    let content = MINIMAL.replace("{ by: css, selector: .sku }", "{ by: sonar, selector: .sku }");
    let err = parse_catalog(&content, "test").unwrap_err();
    assert!(matches!(err, ConfigError::CatalogParse { .. }));
}

#[test]
fn defaults_are_coerced_through_normalizer() {
    let content = MINIMAL.replace(
        "- { name: sku, locator: sku, normalizer: sku, required: true }",
        "- { name: sku, locator: sku }\n  - { name: price, normalizer: price, default: \"12,50\" }",
    );
    let catalog = parse_catalog(&content, "test").unwrap();
    let default = catalog.field(FieldName::Price).unwrap().default.clone();
    assert_eq!(
        default,
        Some(FieldValue::Decimal(rust_decimal::Decimal::new(1250, 2)))
    );
}

#[test]
fn yaml_round_trip_preserves_catalog() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("suppliers")
        .join("demo.yaml");
    let catalog = load_catalog(&path).unwrap();
    let yaml = catalog.to_yaml().unwrap();
    let reloaded = parse_catalog(&yaml, "round-trip").unwrap();
    assert_eq!(catalog, reloaded);
}

#[test]
fn load_demo_catalog_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("suppliers")
        .join("demo.yaml");
    assert!(path.exists(), "demo.yaml missing at {path:?}");
    let catalog = load_catalog(&path).unwrap();
    assert_eq!(catalog.supplier_id, "2787");
    let hook = catalog.hook_locator().unwrap();
    assert_eq!(hook.event, Some(Event::Click));
    assert_eq!(catalog.next_page_locator().unwrap().by, Strategy::Xpath);
    assert!(catalog.field(FieldName::ProductId).unwrap().locator.is_none());
    assert_eq!(
        catalog.field(FieldName::Available).unwrap().default,
        Some(FieldValue::Bool(true))
    );
}

#[test]
fn missing_file_is_io_error() {
    let err = load_catalog(Path::new("/nonexistent/catalog.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::CatalogIo { .. }));
}
