//! Types for storefront entities as the storefront API hands them to the bridge.
//!
//! Every nested field is optional: the storefront frequently renders with partially loaded
//! data, and the transformer is expected to degrade field by field rather than reject the
//! whole entity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A decimal amount in a given currency, e.g. `{"amount": "12.50", "currencyCode": "USD"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal string in major units.
    pub amount: String,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency_code: String,
}

impl Money {
    pub fn new(amount: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency_code: currency_code.into(),
        }
    }
}

/// A single cart attribute pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Cart attributes as they arrive from either side of the bridge.
///
/// The storefront hands over an ordered list of pairs, while widget code tends to pass a plain
/// object. Anything else is accepted and treated as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attributes {
    /// Ordered `{key, value}` pairs.
    Pairs(Vec<Attribute>),
    /// Keyed mapping; values may be any JSON.
    Keyed(BTreeMap<String, serde_json::Value>),
    /// Any other payload.
    Other(serde_json::Value),
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes::Pairs(Vec::new())
    }
}

impl Attributes {
    /// Normalize to one ordered sequence of pairs.
    ///
    /// Keyed mappings come out in key order; non-string values keep their JSON text.
    pub fn into_pairs(self) -> Vec<Attribute> {
        match self {
            Attributes::Pairs(pairs) => pairs,
            Attributes::Keyed(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    Attribute { key, value }
                })
                .collect(),
            Attributes::Other(_) => Vec::new(),
        }
    }
}

/// Cost block of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    #[serde(default)]
    pub total_amount: Option<Money>,
}

/// Product reference carried by a cart line's merchandise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

/// The variant a cart line points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchandise {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub product: Option<ProductRef>,
}

/// Cost block of a single cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCost {
    /// Line total (unit price times quantity).
    #[serde(default)]
    pub total_amount: Option<Money>,
    #[serde(default)]
    pub compare_at_amount_per_quantity: Option<Money>,
}

/// A line of the storefront cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Opaque line id used by line removal.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub merchandise: Option<Merchandise>,
    #[serde(default)]
    pub cost: Option<CartLineCost>,
}

/// The storefront cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart global id, `gid://shopify/Cart/<token>`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub cost: Option<CartCost>,
    #[serde(default)]
    pub attributes: Option<Attributes>,
}

/// A product variant as loaded on the product-detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    #[serde(default)]
    pub available_for_sale: Option<bool>,
    #[serde(default)]
    pub quantity_available: Option<i64>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub compare_at_price: Option<Money>,
}

/// A product as loaded on the product-detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub handle: Option<String>,
    /// The variant currently selected, or the first one available for sale.
    #[serde(default)]
    pub selected_or_first_available_variant: Option<ProductVariant>,
    /// Variants adjacent to the selected options.
    #[serde(default)]
    pub adjacent_variants: Vec<ProductVariant>,
}

/// The active storefront locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl Locale {
    pub fn with_currency(currency: impl Into<String>) -> Self {
        Self {
            language: None,
            country: None,
            currency: Some(currency.into()),
        }
    }
}

/// Input for adding a line to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Variant global id.
    pub merchandise_id: String,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_storefront_cart_json() {
        let cart: Cart = serde_json::from_value(json!({
            "id": "gid://shopify/Cart/abc",
            "cost": {"totalAmount": {"amount": "25.00", "currencyCode": "EUR"}},
            "lines": [{
                "id": "gid://shopify/CartLine/1",
                "quantity": 2,
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/111",
                    "product": {"id": "gid://shopify/Product/999", "handle": "tee"}
                },
                "cost": {"totalAmount": {"amount": "25.00", "currencyCode": "EUR"}}
            }],
            "attributes": [{"key": "gift", "value": "yes"}]
        }))
        .unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, Some(2));
        assert_eq!(
            cart.attributes.unwrap().into_pairs(),
            vec![Attribute::new("gift", "yes")]
        );
    }

    #[test]
    fn sparse_cart_still_decodes() {
        let cart: Cart = serde_json::from_value(json!({"lines": [{}]})).unwrap();
        assert_eq!(cart.lines[0].merchandise, None);
        assert_eq!(cart.cost, None);
    }

    #[test]
    fn keyed_attributes_normalize_in_key_order() {
        let attrs: Attributes = serde_json::from_value(json!({"b": "2", "a": 1})).unwrap();
        assert_eq!(
            attrs.into_pairs(),
            vec![Attribute::new("a", "1"), Attribute::new("b", "2")]
        );
    }

    #[test]
    fn unexpected_attribute_payload_is_empty() {
        let attrs: Attributes = serde_json::from_value(json!("nonsense")).unwrap();
        assert!(attrs.into_pairs().is_empty());
    }
}
