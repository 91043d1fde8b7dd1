//! Snapshot types in the widget's external schema.
//!
//! Field names follow the widget's cart typing (`total_price`, `item_count`, `variant_id`, ...).
//! Every price is in minor units of the cart currency. Optional fields are omitted from the
//! serialized form rather than written as `null`.

use crate::bridge::commands::CommandCallbacks;
use crate::storefront::Attribute;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A cart line as the widget sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineSnapshot {
    /// Numeric product id; absent when the storefront id could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
    /// Numeric variant id; absent when the storefront id could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<u64>,
    pub handle: String,
    /// Always at least 1.
    pub quantity: u32,
    /// Line total in minor units.
    #[serde(rename = "price")]
    pub price_cents: i64,
    #[serde(rename = "compare_at_price", skip_serializing_if = "Option::is_none")]
    pub compare_at_price_cents: Option<i64>,
}

/// The cart as the widget sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub token: String,
    pub currency: String,
    /// Never negative.
    #[serde(rename = "total_price")]
    pub total_price_cents: i64,
    pub item_count: u64,
    pub attributes: Vec<Attribute>,
    pub items: Vec<CartLineSnapshot>,
}

/// A product variant as the widget sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub id: u64,
    #[serde(rename = "price")]
    pub price_cents: f64,
    pub inventory_quantity: i64,
}

/// A product as the widget sees it.
///
/// `variants[0]` is the selected (or first available) variant; the rest are its adjacent
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: u64,
    #[serde(rename = "price")]
    pub price_cents: f64,
    pub out_of_stock: bool,
    pub variants: Vec<VariantSnapshot>,
}

/// Kind of page the shopper is on, derived from the route path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageContext {
    Home,
    Product,
    Collection,
    Other,
}

impl PageContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageContext::Home => "home",
            PageContext::Product => "product",
            PageContext::Collection => "collection",
            PageContext::Other => "other",
        }
    }
}

/// Payload of the one-time registration call made when the widget becomes ready.
#[derive(Clone)]
pub struct Registration {
    /// Commands the widget may invoke back into the storefront.
    pub commands: Arc<CommandCallbacks>,
    pub page_type: PageContext,
    pub customer_tags: Vec<String>,
    pub initial_currency: Option<String>,
    pub initial_product_id: Option<u64>,
    pub initial_variant_id: Option<u64>,
    /// Minor units.
    pub initial_variant_price: Option<f64>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("page_type", &self.page_type)
            .field("customer_tags", &self.customer_tags)
            .field("initial_currency", &self.initial_currency)
            .field("initial_product_id", &self.initial_product_id)
            .field("initial_variant_id", &self.initial_variant_id)
            .field("initial_variant_price", &self.initial_variant_price)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cart_serializes_with_widget_field_names() {
        let cart = CartSnapshot {
            token: "abc".to_string(),
            currency: "USD".to_string(),
            total_price_cents: 1250,
            item_count: 2,
            attributes: vec![],
            items: vec![CartLineSnapshot {
                product_id: Some(999),
                variant_id: None,
                handle: "tee".to_string(),
                quantity: 2,
                price_cents: 1250,
                compare_at_price_cents: None,
            }],
        };

        assert_eq!(
            serde_json::to_value(&cart).unwrap(),
            json!({
                "token": "abc",
                "currency": "USD",
                "total_price": 1250,
                "item_count": 2,
                "attributes": [],
                "items": [{"product_id": 999, "handle": "tee", "quantity": 2, "price": 1250}]
            })
        );
    }

    #[test]
    fn page_context_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(PageContext::Collection).unwrap(),
            json!("collection")
        );
    }
}
