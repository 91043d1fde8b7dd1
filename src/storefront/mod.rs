//! Storefront integration surface.
//!
//! The storefront owns cart, route, locale and product state. The bridge consumes that state as
//! a stream of [`StorefrontEvent`]s and calls back into the storefront only through the
//! [`CartActions`] and [`DrawerController`] ports.

/// Global id parsing and formatting
pub mod ids;
/// In-memory storefront cart used for replays and tests
pub mod memory;
/// Storefront entity shapes
pub mod types;

pub use ids::{GlobalId, IdError};
pub use types::*;

use serde::{Deserialize, Serialize};

/// Errors reported by the storefront's mutation layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorefrontError {
	#[error("Cart mutation rejected: {0}")]
	MutationRejected(String),
}

/// A change observed in one of the storefront's state sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorefrontEvent {
	/// The cart was reloaded or mutated. `None` when the storefront has no cart yet.
	CartUpdated { cart: Option<Cart> },
	/// The router moved to a new path.
	RouteChanged { path: String },
	/// The active locale changed.
	LocaleChanged { locale: Locale },
	/// A product-detail page finished loading its product.
	ProductLoaded { product: Product },
	/// The shopper picked a different variant on the product-detail page.
	VariantSelected { variant: ProductVariant },
}

/// Cart state and mutations exposed by the storefront.
#[async_trait::async_trait]
pub trait CartActions: Send + Sync {
	/// Ids of the lines currently in the cart.
	fn line_ids(&self) -> Vec<String>;

	/// Add lines to the cart.
	async fn lines_add(&self, lines: Vec<CartLineInput>) -> Result<(), StorefrontError>;

	/// Remove lines by id.
	async fn lines_remove(&self, line_ids: Vec<String>) -> Result<(), StorefrontError>;

	/// Replace the cart attributes.
	async fn attributes_update(&self, attributes: Vec<Attribute>) -> Result<(), StorefrontError>;
}

/// Controller for the storefront's side panels.
pub trait DrawerController: Send + Sync {
	fn open(&self, panel: DrawerPanel);
}

/// Named storefront side panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerPanel {
	Cart,
	Search,
	Menu,
}

impl DrawerPanel {
	pub fn as_str(&self) -> &'static str {
		match self {
			DrawerPanel::Cart => "cart",
			DrawerPanel::Search => "search",
			DrawerPanel::Menu => "menu",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn events_decode_from_tagged_json() {
		let event: StorefrontEvent =
			serde_json::from_value(json!({"type": "route_changed", "path": "/products/tee"}))
				.unwrap();
		assert_eq!(
			event,
			StorefrontEvent::RouteChanged {
				path: "/products/tee".to_string()
			}
		);

		let event: StorefrontEvent =
			serde_json::from_value(json!({"type": "cart_updated", "cart": null})).unwrap();
		assert_eq!(event, StorefrontEvent::CartUpdated { cart: None });
	}
}
