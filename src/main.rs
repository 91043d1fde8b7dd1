use clap::Parser;
use futures::channel::mpsc;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::{error, info, warn};

use storefront_sdk_bridge::bridge::{Bridge, BridgeError, BridgeHandle, BridgeReport, StorefrontView};
use storefront_sdk_bridge::config::BridgeConfig;
use storefront_sdk_bridge::storefront::memory::{CatalogEntry, InMemoryCart, LoggingDrawer};
use storefront_sdk_bridge::storefront::{Attributes, StorefrontEvent};
use storefront_sdk_bridge::widget::TracingWidget;

const DEFAULT_SESSION: &str = include_str!("../demos/session.json");

/// Replay a recorded storefront session through the bridge against a log-only widget.
#[derive(Debug, Parser)]
#[command(name = "storefront-sdk-bridge", version, about)]
struct Args {
	/// Session file to replay; the bundled demo session when omitted
	#[arg(long)]
	session: Option<PathBuf>,

	/// Override the session's widget load delay
	#[arg(long)]
	sdk_ready_after_ms: Option<u64>,

	/// Delay between readiness checks
	#[arg(long)]
	poll_interval_ms: Option<u64>,

	/// Readiness checks after the first one before giving up
	#[arg(long)]
	max_retries: Option<u32>,

	/// Customer tag passed to the widget at registration (repeatable)
	#[arg(long = "customer-tag")]
	customer_tags: Vec<String>,
}

/// A recorded storefront session
#[derive(Debug, Deserialize)]
struct Session {
	/// Widget load delay, measured from the start of the replay
	#[serde(default)]
	sdk_ready_after_ms: u64,
	#[serde(default)]
	initial: StorefrontView,
	/// Variant global id to catalog entry, used to price lines the widget adds
	#[serde(default)]
	catalog: HashMap<String, CatalogEntry>,
	#[serde(default)]
	events: Vec<TimedEvent>,
	#[serde(default)]
	commands: Vec<TimedCommand>,
}

#[derive(Debug, Deserialize)]
struct TimedEvent {
	at_ms: u64,
	#[serde(flatten)]
	event: StorefrontEvent,
}

#[derive(Debug, Deserialize)]
struct TimedCommand {
	at_ms: u64,
	#[serde(flatten)]
	command: WidgetCommand,
}

/// A command the widget issues back into the storefront
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum WidgetCommand {
	AddToCart { variant_id: u64, quantity: u32 },
	CartClear,
	CartAddAttributes { attributes: Attributes },
	OpenCartDrawer,
}

enum Step {
	Event(StorefrontEvent),
	Command(WidgetCommand),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	// Debug logging for the bridge itself, info for everything else
	let mut filter =
		tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
	if let Ok(directive) = "storefront_sdk_bridge=debug".parse() {
		filter = filter.add_directive(directive);
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let args = Args::parse();

	match replay(args).await {
		Ok(report) => {
			info!(
				"Replay finished: {:?} in state {:?}",
				report.exit, report.final_state
			);
			info!("Channel totals: {}", report.stats.summary());
		}
		Err(e) => error!("Replay failed: {}", e),
	}
}

async fn replay(args: Args) -> Result<BridgeReport, BridgeError> {
	let session: Session = match &args.session {
		Some(path) => {
			info!("Loading session from {}", path.display());
			serde_json::from_str(&std::fs::read_to_string(path)?)?
		}
		None => {
			info!("No session given, replaying the bundled demo session");
			serde_json::from_str(DEFAULT_SESSION)?
		}
	};

	let mut config = BridgeConfig::from_env()?;
	if let Some(ms) = args.poll_interval_ms {
		config.poll_interval = Duration::from_millis(ms);
	}
	if let Some(retries) = args.max_retries {
		config.max_retries = retries;
	}
	if !args.customer_tags.is_empty() {
		config.customer_tags = args.customer_tags;
	}
	let ready_after = Duration::from_millis(args.sdk_ready_after_ms.unwrap_or(session.sdk_ready_after_ms));

	info!(
		"Widget loads after {:?}; polling every {:?} with {} retries",
		ready_after, config.poll_interval, config.max_retries
	);

	let (events_tx, events_rx) = mpsc::unbounded();
	let cart = session
		.catalog
		.into_iter()
		.fold(
			InMemoryCart::new(session.initial.cart.clone().unwrap_or_default()),
			|cart, (variant_id, entry)| cart.with_catalog_entry(variant_id, entry),
		)
		.with_events(events_tx.clone());
	let widget = Arc::new(TracingWidget::new(ready_after));

	let (bridge, handle) = Bridge::builder()
		.with_widget(widget.clone())
		.with_cart(Arc::new(cart))
		.with_drawer(Arc::new(LoggingDrawer))
		.with_config(config)
		.with_initial_view(session.initial)
		.build()?;

	let mut script: Vec<(u64, Step)> = session
		.events
		.into_iter()
		.map(|e| (e.at_ms, Step::Event(e.event)))
		.chain(
			session
				.commands
				.into_iter()
				.map(|c| (c.at_ms, Step::Command(c.command))),
		)
		.collect();
	// Stable sort keeps the recorded order of steps sharing a timestamp
	script.sort_by_key(|(at_ms, _)| *at_ms);

	let (report, ()) = tokio::join!(
		bridge.run(events_rx),
		drive(script, events_tx, widget.clone(), handle)
	);

	info!("Widget received {} notification(s)", widget.notifications());
	Ok(report)
}

/// Play `script` in real time, then unmount the bridge.
async fn drive(
	script: Vec<(u64, Step)>,
	events: mpsc::UnboundedSender<StorefrontEvent>,
	widget: Arc<TracingWidget>,
	handle: BridgeHandle,
) {
	let started = Instant::now();

	for (at_ms, step) in script {
		tokio::time::sleep_until(started + Duration::from_millis(at_ms)).await;
		match step {
			Step::Event(event) => {
				if events.unbounded_send(event).is_err() {
					warn!("Bridge stopped listening, ending replay early");
					break;
				}
			}
			Step::Command(command) => {
				let Some(registration) = widget.registration() else {
					warn!("Widget not connected at {}ms, dropping {:?}", at_ms, command);
					continue;
				};
				let commands = registration.commands;
				let result = match command {
					WidgetCommand::AddToCart {
						variant_id,
						quantity,
					} => commands.add_to_cart(variant_id, quantity).await,
					WidgetCommand::CartClear => commands.cart_clear().await,
					WidgetCommand::CartAddAttributes { attributes } => {
						commands.cart_add_attributes(attributes).await
					}
					WidgetCommand::OpenCartDrawer => {
						commands.open_cart_drawer();
						Ok(())
					}
				};
				if let Err(e) = result {
					warn!("Widget command failed: {}", e);
				}
			}
		}
	}

	// Let the bridge drain what the last steps produced before tearing it down
	tokio::task::yield_now().await;
	handle.unmount();
}
