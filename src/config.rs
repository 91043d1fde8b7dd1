//! Bridge configuration.
//!
//! Defaults cover a typical storefront; every value can be overridden from the environment.

use tokio::time::Duration;

pub const ENV_POLL_INTERVAL_MS: &str = "BRIDGE_POLL_INTERVAL_MS";
pub const ENV_MAX_RETRIES: &str = "BRIDGE_MAX_RETRIES";
pub const ENV_CUSTOMER_TAGS: &str = "BRIDGE_CUSTOMER_TAGS";
pub const ENV_ANALYTICS_CONSENT: &str = "BRIDGE_ANALYTICS_CONSENT";

/// Errors raised while reading configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
	#[error("Invalid value `{value}` for {key}")]
	InvalidValue { key: &'static str, value: String },
}

/// Configuration for a bridge instance
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
	/// Delay between readiness checks
	pub poll_interval: Duration,
	/// Readiness checks after the first one before giving up
	pub max_retries: u32,
	/// Tags of the signed-in customer, passed along at registration
	pub customer_tags: Vec<String>,
	/// Analytics consent to forward to the widget on activation; `None` leaves it untouched
	pub analytics_consent: Option<bool>,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_millis(100),
			max_retries: 50,
			customer_tags: Vec::new(),
			analytics_consent: None,
		}
	}
}

impl BridgeConfig {
	/// Defaults overridden by the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Defaults overridden by whatever `lookup` returns for each known key.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
			let millis = parse(ENV_POLL_INTERVAL_MS, &value)?;
			config.poll_interval = Duration::from_millis(millis);
		}
		if let Some(value) = lookup(ENV_MAX_RETRIES) {
			config.max_retries = parse(ENV_MAX_RETRIES, &value)?;
		}
		if let Some(value) = lookup(ENV_CUSTOMER_TAGS) {
			config.customer_tags = value
				.split(',')
				.map(str::trim)
				.filter(|tag| !tag.is_empty())
				.map(String::from)
				.collect();
		}
		if let Some(value) = lookup(ENV_ANALYTICS_CONSENT) {
			config.analytics_consent = Some(parse(ENV_ANALYTICS_CONSENT, &value)?);
		}

		Ok(config)
	}
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
	value.trim().parse().map_err(|_| ConfigError::InvalidValue {
		key,
		value: value.to_string(),
	})
}
