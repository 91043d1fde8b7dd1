//! Storefront global identifiers.
//!
//! The storefront addresses every entity with an opaque string of the form
//! `gid://shopify/<Type>/<integer>`. The widget only understands the bare integer, so the
//! transformer strips the prefix on the way out and the command callbacks put it back on the
//! way in.

use std::fmt;

/// Namespace shared by every storefront global id.
pub const GID_NAMESPACE: &str = "gid://shopify";

/// Entity type segments used by the bridge.
pub const PRODUCT_TYPE: &str = "Product";
pub const PRODUCT_VARIANT_TYPE: &str = "ProductVariant";
pub const CART_TYPE: &str = "Cart";

/// Errors raised while parsing a global id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
	#[error("expected a `{expected}` global id, got `{raw}`")]
	WrongPrefix { expected: String, raw: String },

	#[error("global id `{raw}` does not end in an integer")]
	InvalidNumber { raw: String },
}

/// A parsed `gid://shopify/<Type>/<integer>` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalId {
	type_name: String,
	id: u64,
}

impl GlobalId {
	pub fn new(type_name: impl Into<String>, id: u64) -> Self {
		Self {
			type_name: type_name.into(),
			id,
		}
	}

	/// Id of a product variant, the form cart mutations expect for `merchandiseId`.
	pub fn product_variant(id: u64) -> Self {
		Self::new(PRODUCT_VARIANT_TYPE, id)
	}

	/// Parse `raw`, requiring it to address an entity of `type_name`.
	pub fn parse(raw: &str, type_name: &str) -> Result<Self, IdError> {
		let suffix = raw
			.strip_prefix(GID_NAMESPACE)
			.and_then(|rest| rest.strip_prefix('/'))
			.and_then(|rest| rest.strip_prefix(type_name))
			.and_then(|rest| rest.strip_prefix('/'))
			.ok_or_else(|| IdError::WrongPrefix {
				expected: type_name.to_string(),
				raw: raw.to_string(),
			})?;

		let id = suffix.parse::<u64>().map_err(|_| IdError::InvalidNumber {
			raw: raw.to_string(),
		})?;

		Ok(Self::new(type_name, id))
	}

	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn id(&self) -> u64 {
		self.id
	}
}

impl fmt::Display for GlobalId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", GID_NAMESPACE, self.type_name, self.id)
	}
}

/// Strip the cart prefix from a cart id, leaving foreign ids untouched.
pub fn cart_token(raw: &str) -> &str {
	raw.strip_prefix(GID_NAMESPACE)
		.and_then(|rest| rest.strip_prefix('/'))
		.and_then(|rest| rest.strip_prefix(CART_TYPE))
		.and_then(|rest| rest.strip_prefix('/'))
		.unwrap_or(raw)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_numeric_suffix() {
		let gid = GlobalId::parse("gid://shopify/Product/999", PRODUCT_TYPE).unwrap();
		assert_eq!(gid.id(), 999);
		assert_eq!(gid.type_name(), "Product");
	}

	#[test]
	fn rejects_other_entity_types() {
		// ProductVariant shares the `Product` prefix text but is a different type
		let err = GlobalId::parse("gid://shopify/ProductVariant/111", PRODUCT_TYPE).unwrap_err();
		assert!(matches!(err, IdError::WrongPrefix { .. }));
	}

	#[test]
	fn rejects_non_numeric_suffix() {
		let err = GlobalId::parse("gid://shopify/Product/abc", PRODUCT_TYPE).unwrap_err();
		assert_eq!(
			err,
			IdError::InvalidNumber {
				raw: "gid://shopify/Product/abc".to_string()
			}
		);
	}

	#[test]
	fn variant_id_round_trips_through_display() {
		assert_eq!(
			GlobalId::product_variant(111).to_string(),
			"gid://shopify/ProductVariant/111"
		);
	}

	#[test]
	fn cart_token_strips_known_prefix_only() {
		assert_eq!(cart_token("gid://shopify/Cart/c1-abc?key=1"), "c1-abc?key=1");
		assert_eq!(cart_token("plain-token"), "plain-token");
	}
}
