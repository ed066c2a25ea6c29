use serde::{Deserialize, Serialize};

/// Canonical record fields.
///
/// Declaration order is the canonical record order: `Record` stores values in
/// a `BTreeMap<FieldName, _>`, so records always serialize in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    SupplierId,
    Sku,
    ProductId,
    Name,
    Reference,
    Ean13,
    Price,
    WholesalePrice,
    Quantity,
    Available,
    Condition,
    DescriptionShort,
    Description,
    DefaultImageUrl,
    ImageUrls,
}

impl FieldName {
    /// Every field, in canonical order. The orchestrator extracts this list
    /// when no narrower selection is given.
    pub const CANONICAL: [FieldName; 15] = [
        FieldName::SupplierId,
        FieldName::Sku,
        FieldName::ProductId,
        FieldName::Name,
        FieldName::Reference,
        FieldName::Ean13,
        FieldName::Price,
        FieldName::WholesalePrice,
        FieldName::Quantity,
        FieldName::Available,
        FieldName::Condition,
        FieldName::DescriptionShort,
        FieldName::Description,
        FieldName::DefaultImageUrl,
        FieldName::ImageUrls,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::SupplierId => "supplier_id",
            FieldName::Sku => "sku",
            FieldName::ProductId => "product_id",
            FieldName::Name => "name",
            FieldName::Reference => "reference",
            FieldName::Ean13 => "ean13",
            FieldName::Price => "price",
            FieldName::WholesalePrice => "wholesale_price",
            FieldName::Quantity => "quantity",
            FieldName::Available => "available",
            FieldName::Condition => "condition",
            FieldName::DescriptionShort => "description_short",
            FieldName::Description => "description",
            FieldName::DefaultImageUrl => "default_image_url",
            FieldName::ImageUrls => "image_urls",
        }
    }

    /// `product_id` is derived from `supplier_id` and `sku`; it never has a
    /// locator of its own.
    #[must_use]
    pub fn is_computed(self) -> bool {
        matches!(self, FieldName::ProductId)
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_list_is_sorted_and_complete() {
        let mut sorted = FieldName::CANONICAL;
        sorted.sort();
        assert_eq!(sorted, FieldName::CANONICAL);
        assert_eq!(FieldName::CANONICAL[0], FieldName::SupplierId);
    }

    #[test]
    fn display_matches_serde_name() {
        for field in FieldName::CANONICAL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{field}\""));
        }
    }

    #[test]
    fn only_product_id_is_computed() {
        let computed: Vec<_> = FieldName::CANONICAL
            .into_iter()
            .filter(|f| f.is_computed())
            .collect();
        assert_eq!(computed, vec![FieldName::ProductId]);
    }
}
