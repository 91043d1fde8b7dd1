//!
//! Utility module for the storefront bridge.
//!
//! Re-exports money helpers used by the transformer, the in-memory storefront and log output.
/// Conversions between decimal amounts and minor units
pub mod money;

pub use money::{amount_to_cents, format_cents};
