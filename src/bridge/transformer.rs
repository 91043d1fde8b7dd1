//! Storefront entity to widget schema mapping.
//!
//! Everything here is pure. Cart fields are derived one by one: each derivation is its own
//! fallible step with its own fallback, so a malformed id or a missing cost block only blanks
//! the affected field. Products are all-or-nothing since a partial product is of no use to the
//! widget.

use crate::storefront::{
    Attribute, Cart, CartLine, GlobalId, IdError, Money, Product, ProductVariant, ids,
};
use crate::utils::amount_to_cents;
use crate::widget::{CartLineSnapshot, CartSnapshot, PageContext, ProductSnapshot, VariantSnapshot};

use tracing::debug;

/// Errors raised while deriving a snapshot field
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid amount `{0}`")]
    InvalidAmount(String),

    #[error("invalid id: {0}")]
    InvalidId(#[from] IdError),
}

/// Map the storefront cart to a [`CartSnapshot`]. `None` when there is no cart.
pub fn transform_cart(cart: Option<&Cart>) -> Option<CartSnapshot> {
    let cart = cart?;

    let items: Vec<CartLineSnapshot> = cart.lines.iter().map(transform_line).collect();
    let item_count = items.iter().map(|line| u64::from(line.quantity)).sum();

    Some(CartSnapshot {
        token: field_or("token", cart_token(cart), String::new()),
        currency: field_or("currency", cart_currency(cart), String::new()),
        total_price_cents: field_or("total_price", cart_total_cents(cart), 0).max(0),
        item_count,
        attributes: cart
            .attributes
            .clone()
            .map(|attrs| attrs.into_pairs())
            .unwrap_or_default(),
        items,
    })
}

/// Map a product and its variants to a [`ProductSnapshot`].
///
/// `None` if any part of the mapping fails.
pub fn transform_product(product: &Product) -> Option<ProductSnapshot> {
    match try_transform_product(product) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            debug!("Product {} not mappable: {}", product.id, e);
            None
        }
    }
}

fn try_transform_product(product: &Product) -> Result<ProductSnapshot, TransformError> {
    let id = GlobalId::parse(&product.id, ids::PRODUCT_TYPE)?.id();
    let selected = product
        .selected_or_first_available_variant
        .as_ref()
        .ok_or(TransformError::MissingField("selectedOrFirstAvailableVariant"))?;

    let mut variants = Vec::with_capacity(product.adjacent_variants.len() + 1);
    variants.push(transform_variant(selected)?);
    for adjacent in &product.adjacent_variants {
        variants.push(transform_variant(adjacent)?);
    }

    Ok(ProductSnapshot {
        id,
        price_cents: variants[0].price_cents,
        out_of_stock: !selected.available_for_sale.unwrap_or(false),
        variants,
    })
}

/// Map a product variant to a [`VariantSnapshot`].
pub fn transform_variant(variant: &ProductVariant) -> Result<VariantSnapshot, TransformError> {
    let id = GlobalId::parse(&variant.id, ids::PRODUCT_VARIANT_TYPE)?.id();
    let price = variant
        .price
        .as_ref()
        .ok_or(TransformError::MissingField("price"))?;

    Ok(VariantSnapshot {
        id,
        price_cents: money_cents(price)?,
        inventory_quantity: variant.quantity_available.unwrap_or(0),
    })
}

/// Classify a route path. Categories are disjoint prefixes, checked in order.
pub fn get_page_type(path: &str) -> PageContext {
    if path == "/" {
        PageContext::Home
    } else if path.starts_with("/products/") {
        PageContext::Product
    } else if path.starts_with("/collections/") {
        PageContext::Collection
    } else {
        PageContext::Other
    }
}

fn transform_line(line: &CartLine) -> CartLineSnapshot {
    // Lines are never empty on the storefront; a missing or zero quantity still counts as one
    let quantity = line
        .quantity
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q >= 1)
        .unwrap_or(1);

    CartLineSnapshot {
        product_id: line_product_id(line).ok(),
        variant_id: line_variant_id(line).ok(),
        handle: field_or("handle", line_handle(line), String::new()),
        quantity,
        price_cents: field_or("price", line_price_cents(line), 0),
        compare_at_price_cents: line_compare_at_cents(line).ok(),
    }
}

fn field_or<T>(name: &'static str, result: Result<T, TransformError>, fallback: T) -> T {
    result.unwrap_or_else(|e| {
        debug!("Falling back for cart field `{}`: {}", name, e);
        fallback
    })
}

fn money_cents(money: &Money) -> Result<f64, TransformError> {
    amount_to_cents(&money.amount).map_err(|_| TransformError::InvalidAmount(money.amount.clone()))
}

fn integer_cents(money: &Money) -> Result<i64, TransformError> {
    Ok(money_cents(money)?.round() as i64)
}

fn cart_token(cart: &Cart) -> Result<String, TransformError> {
    let id = cart.id.as_deref().ok_or(TransformError::MissingField("id"))?;
    Ok(ids::cart_token(id).to_string())
}

fn cart_total(cart: &Cart) -> Result<&Money, TransformError> {
    cart.cost
        .as_ref()
        .and_then(|cost| cost.total_amount.as_ref())
        .ok_or(TransformError::MissingField("cost.totalAmount"))
}

fn cart_currency(cart: &Cart) -> Result<String, TransformError> {
    Ok(cart_total(cart)?.currency_code.clone())
}

fn cart_total_cents(cart: &Cart) -> Result<i64, TransformError> {
    integer_cents(cart_total(cart)?)
}

fn line_merchandise_id(line: &CartLine) -> Result<&str, TransformError> {
    line.merchandise
        .as_ref()
        .and_then(|m| m.id.as_deref())
        .ok_or(TransformError::MissingField("merchandise.id"))
}

fn line_product_id(line: &CartLine) -> Result<u64, TransformError> {
    let raw = line
        .merchandise
        .as_ref()
        .and_then(|m| m.product.as_ref())
        .and_then(|p| p.id.as_deref())
        .ok_or(TransformError::MissingField("merchandise.product.id"))?;
    Ok(GlobalId::parse(raw, ids::PRODUCT_TYPE)?.id())
}

fn line_variant_id(line: &CartLine) -> Result<u64, TransformError> {
    Ok(GlobalId::parse(line_merchandise_id(line)?, ids::PRODUCT_VARIANT_TYPE)?.id())
}

fn line_handle(line: &CartLine) -> Result<String, TransformError> {
    line.merchandise
        .as_ref()
        .and_then(|m| m.product.as_ref())
        .and_then(|p| p.handle.clone())
        .ok_or(TransformError::MissingField("merchandise.product.handle"))
}

fn line_price_cents(line: &CartLine) -> Result<i64, TransformError> {
    let total = line
        .cost
        .as_ref()
        .and_then(|c| c.total_amount.as_ref())
        .ok_or(TransformError::MissingField("cost.totalAmount"))?;
    integer_cents(total)
}

fn line_compare_at_cents(line: &CartLine) -> Result<i64, TransformError> {
    let compare_at = line
        .cost
        .as_ref()
        .and_then(|c| c.compare_at_amount_per_quantity.as_ref())
        .ok_or(TransformError::MissingField("cost.compareAtAmountPerQuantity"))?;
    integer_cents(compare_at)
}

/// Cart attributes, normalized. Exposed for the command path.
pub fn normalize_attributes(attributes: crate::storefront::Attributes) -> Vec<Attribute> {
    attributes.into_pairs()
}
