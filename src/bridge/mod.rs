//! Storefront to Widget Bridge Module
//!
//! This module provides the core logic for keeping an externally loaded personalization widget in sync with
//! storefront state. It is composed of several submodules, each responsible for a specific aspect of the bridge:
//!
//! - `orchestrator`: The bridge state machine. It wires readiness, transformation and notification together.
//! - `readiness`: Bounded polling plus an explicit signal, feeding a one-shot readiness cell.
//! - `transformer`: Pure mapping from storefront entities to the widget's snapshot schema.
//! - `fingerprint`: Canonical, key-order independent serialization used for change detection.
//! - `channels`: Per-channel fingerprint table and push statistics.
//! - `events`: The bridge's view of storefront state and how each change maps onto channels.
//! - `commands`: The command set the widget may invoke back into the storefront.
//!
//! The orchestrator only pushes a channel when its fingerprint moved, and it contains every widget failure so that
//! the storefront never observes one.

/// Per-channel fingerprint bookkeeping
pub mod channels;
/// Commands exposed to the widget
pub mod commands;
/// Storefront view and event application
pub mod events;
/// Canonical fingerprints for change detection
pub mod fingerprint;
/// The bridge state machine
pub mod orchestrator;
/// Widget readiness detection
pub mod readiness;
/// Storefront entity mapping
pub mod transformer;
/// Bridge states, outcomes and errors
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use channels::{Channel, ChannelStats};
pub use commands::CommandCallbacks;
pub use events::StorefrontView;
pub use orchestrator::*;
pub use readiness::{ReadinessGate, ReadinessTimeout};
pub use types::*;
