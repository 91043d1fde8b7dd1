//! Bridge between a headless storefront and an externally loaded personalization widget.
//!
//! The storefront publishes its state as a stream of [`storefront::StorefrontEvent`]s. A
//! [`bridge::Bridge`] waits for the widget to load, registers the commands it may call back
//! into the storefront, then forwards every state change the widget has not seen yet.

pub mod bridge;
pub mod config;
pub mod storefront;
pub mod utils;
pub mod widget;
