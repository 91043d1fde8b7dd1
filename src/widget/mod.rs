//! External personalization widget integration.
//!
//! The widget is loaded out of band and shows up on a shared global handle at some unknown
//! point after page load. The bridge never touches that handle directly: everything goes
//! through an [`ExternalWidgetPort`], so a real binding and a test double are interchangeable.

/// Log-only widget used by the replay binary
pub mod tracing_widget;
/// Snapshot types in the widget's external schema
pub mod types;

pub use tracing_widget::TracingWidget;
pub use types::*;

/// Errors reported by a widget handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
	#[error("Widget handler `{handler}` failed: {message}")]
	HandlerFailed {
		handler: &'static str,
		message: String,
	},

	#[error("Widget handler `{0}` panicked")]
	HandlerPanicked(&'static str),

	#[error("Widget is not loaded")]
	NotLoaded,
}

/// Capability surface of the externally loaded widget.
///
/// Every notification may fail; the bridge discards those failures so that a misbehaving
/// widget can never disturb the storefront.
pub trait ExternalWidgetPort: Send + Sync {
	/// Whether the widget's global handle is present and callable.
	fn is_ready(&self) -> bool;

	/// One-time registration of the command callbacks and initial page context.
	fn connect(&self, registration: Registration) -> Result<(), WidgetError>;

	fn cart_changed(&self, cart: Option<&CartSnapshot>) -> Result<(), WidgetError>;

	fn page_type_changed(&self, page: PageContext) -> Result<(), WidgetError>;

	/// Currency code of the active locale.
	fn locale_changed(&self, currency: Option<&str>) -> Result<(), WidgetError>;

	fn product_changed(&self, product: Option<&ProductSnapshot>) -> Result<(), WidgetError>;

	fn variant_changed(&self, variant: &VariantSnapshot) -> Result<(), WidgetError>;

	/// Forward the shopper's analytics consent to the widget.
	fn set_analytics_consent(&self, allowed: bool);
}
