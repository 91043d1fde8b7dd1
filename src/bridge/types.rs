use super::channels::ChannelStats;
use super::readiness::ReadinessTimeout;
use crate::config::ConfigError;
use crate::storefront::StorefrontError;
use crate::widget::WidgetError;

/// Lifecycle of a mounted bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
	Idle,
	AwaitingReadiness,
	Active,
}

/// Why a bridge run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeExit {
	/// The host view tore the bridge down.
	Unmounted,
	/// The widget never became ready; the bridge never activated.
	ReadinessTimedOut(ReadinessTimeout),
	/// The storefront's state source closed.
	SourceClosed,
}

/// Outcome of a bridge run
#[derive(Debug, Clone)]
pub struct BridgeReport {
	pub exit: BridgeExit,
	pub final_state: BridgeState,
	pub stats: ChannelStats,
}

/// Errors surfaced outside the bridge's own containment
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
	#[error("Bridge is missing its {0}")]
	Incomplete(&'static str),

	#[error("Configuration error: {0}")]
	ConfigError(#[from] ConfigError),

	#[error("Readiness error: {0}")]
	ReadinessError(#[from] ReadinessTimeout),

	#[error("Widget error: {0}")]
	WidgetError(#[from] WidgetError),

	#[error("Storefront error: {0}")]
	StorefrontError(#[from] StorefrontError),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),
}
