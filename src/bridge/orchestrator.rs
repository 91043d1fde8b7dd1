//! Bridge orchestrator and integration point for all bridge services.
//!
//! This module defines the `Bridge`, the state machine that ties readiness detection, entity
//! transformation, fingerprinting and widget notification together. A bridge is mounted once
//! per page lifecycle and moves through `Idle → AwaitingReadiness → Active`; `Active` is
//! terminal.
//!
//! The orchestrator is responsible for:
//! - Starting the readiness gate exactly once and racing it against teardown
//! - Keeping the storefront view current while the widget is still loading
//! - Registering the command callbacks once, on activation
//! - Pushing every channel's current value on activation, then only fingerprint changes
//! - Containing every widget failure so the storefront never sees it
//!
//! The `BridgeHandle` returned alongside the bridge is the host's side of the lifecycle: it
//! announces readiness, forwards analytics consent and unmounts the bridge.

use super::channels::{Channel, ChannelTable};
use super::commands::CommandCallbacks;
use super::events::StorefrontView;
use super::fingerprint::fingerprint;
use super::readiness::{ReadinessGate, ReadinessSource};
use super::transformer::{transform_cart, transform_product, transform_variant};
use super::types::{BridgeError, BridgeExit, BridgeReport, BridgeState};
use crate::config::BridgeConfig;
use crate::storefront::{
    CartActions, DrawerController, GlobalId, StorefrontEvent, ids::PRODUCT_TYPE,
};
use crate::utils::format_cents;
use crate::widget::{ExternalWidgetPort, Registration, WidgetError};

use futures_util::{Stream, StreamExt};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Accepted pushes between two periodic channel summaries
const PROGRESS_LOG_EVERY: u64 = 100;

/// Builder for a [`Bridge`] and its [`BridgeHandle`]
pub struct BridgeBuilder {
    widget: Option<Arc<dyn ExternalWidgetPort>>,
    cart: Option<Arc<dyn CartActions>>,
    drawer: Option<Arc<dyn DrawerController>>,
    config: BridgeConfig,
    view: StorefrontView,
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self {
            widget: None,
            cart: None,
            drawer: None,
            config: BridgeConfig::default(),
            view: StorefrontView::default(),
        }
    }

    /// Sets the widget port
    pub fn with_widget(mut self, widget: Arc<dyn ExternalWidgetPort>) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Sets the storefront cart surface commands are routed to
    pub fn with_cart(mut self, cart: Arc<dyn CartActions>) -> Self {
        self.cart = Some(cart);
        self
    }

    /// Sets the drawer controller
    pub fn with_drawer(mut self, drawer: Arc<dyn DrawerController>) -> Self {
        self.drawer = Some(drawer);
        self
    }

    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Storefront state at mount time
    pub fn with_initial_view(mut self, view: StorefrontView) -> Self {
        self.view = view;
        self
    }

    pub fn build(self) -> Result<(Bridge, BridgeHandle), BridgeError> {
        let widget = self.widget.ok_or(BridgeError::Incomplete("widget port"))?;
        let cart = self.cart.ok_or(BridgeError::Incomplete("cart surface"))?;
        let drawer = self.drawer.ok_or(BridgeError::Incomplete("drawer controller"))?;

        let gate = ReadinessGate::new();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let bridge = Bridge {
            widget: widget.clone(),
            commands: Arc::new(CommandCallbacks::new(cart, drawer)),
            config: self.config,
            gate: gate.clone(),
            shutdown: shutdown_rx,
            state: BridgeState::Idle,
            channels: ChannelTable::new(),
            registered: false,
            view: self.view,
        };
        let handle = BridgeHandle {
            gate,
            widget,
            shutdown: Some(shutdown_tx),
        };

        Ok((bridge, handle))
    }
}

/// Host-side handle of a mounted bridge.
///
/// Dropping the handle unmounts the bridge.
pub struct BridgeHandle {
    gate: ReadinessGate,
    widget: Arc<dyn ExternalWidgetPort>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl BridgeHandle {
    /// Announce that the widget is ready. Returns `false` if it already was.
    pub fn signal_ready(&self) -> bool {
        let flipped = self.gate.signal();
        if flipped {
            info!("Widget announced readiness");
        }
        flipped
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Forward the shopper's analytics consent straight to the widget.
    pub fn set_analytics_consent(&self, allowed: bool) {
        self.widget.set_analytics_consent(allowed);
    }

    /// Tear the bridge down. Any pending readiness poll stops.
    pub fn unmount(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The run loop may already be gone; nothing left to stop then
            let _ = shutdown.send(());
        }
    }
}

/// The bridge between storefront state and the external widget.
///
/// Owns its channel table and registration flag; nothing here is shared with another bridge
/// instance.
pub struct Bridge {
    widget: Arc<dyn ExternalWidgetPort>,
    commands: Arc<CommandCallbacks>,
    config: BridgeConfig,
    gate: ReadinessGate,
    shutdown: oneshot::Receiver<()>,
    state: BridgeState,
    channels: ChannelTable,
    registered: bool,
    view: StorefrontView,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Run the bridge until it is unmounted, the widget times out, or `events` ends.
    ///
    /// `events` carries every storefront state change, in the order the storefront observed
    /// them.
    pub async fn run<S>(mut self, mut events: S) -> BridgeReport
    where
        S: Stream<Item = StorefrontEvent> + Unpin,
    {
        self.transition(BridgeState::AwaitingReadiness);

        let gate = self.gate.clone();
        let widget = self.widget.clone();
        let readiness = gate.wait(
            move || widget.is_ready(),
            self.config.poll_interval,
            self.config.max_retries,
        );
        tokio::pin!(readiness);

        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown => {
                    info!("Bridge unmounted before the widget became ready");
                    return self.finish(BridgeExit::Unmounted);
                }
                ready = &mut readiness => match ready {
                    Ok(source) => {
                        self.activate(source);
                        break;
                    }
                    Err(timeout) => {
                        warn!("Widget unavailable, bridge stays inactive: {}", timeout);
                        return self.finish(BridgeExit::ReadinessTimedOut(timeout));
                    }
                },
                event = events.next() => match event {
                    Some(event) => {
                        // Not ready yet: remember the value, push it on activation
                        self.view.apply(event);
                    }
                    None => return self.finish(BridgeExit::SourceClosed),
                },
            }
        }

        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown => {
                    info!("Bridge unmounted");
                    return self.finish(BridgeExit::Unmounted);
                }
                event = events.next() => match event {
                    Some(event) => self.on_event(event),
                    None => return self.finish(BridgeExit::SourceClosed),
                },
            }
        }
    }

    fn transition(&mut self, next: BridgeState) {
        debug!("Bridge state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn finish(mut self, exit: BridgeExit) -> BridgeReport {
        self.channels.log_progress(PROGRESS_LOG_EVERY, true);
        BridgeReport {
            exit,
            final_state: self.state,
            stats: self.channels.get_stats(),
        }
    }

    fn activate(&mut self, source: ReadinessSource) {
        info!("Widget ready ({:?}), activating bridge", source);
        self.transition(BridgeState::Active);

        self.register_commands();
        if let Some(allowed) = self.config.analytics_consent {
            self.widget.set_analytics_consent(allowed);
        }

        // No fingerprint exists yet, so every channel goes out unconditionally
        for channel in self.view.active_channels() {
            self.refresh(channel, true);
        }
    }

    fn register_commands(&mut self) {
        if self.registered {
            return;
        }
        self.registered = true;

        let registration = self.registration();
        info!(
            "Registering widget commands (page {})",
            registration.page_type.as_str()
        );
        let widget = self.widget.clone();
        if let Err(e) = guarded("connect", || widget.connect(registration)) {
            warn!("Widget registration failed: {}", e);
        }
    }

    fn registration(&self) -> Registration {
        let cart = transform_cart(self.view.cart.as_ref());
        let initial_currency = cart
            .as_ref()
            .map(|c| c.currency.clone())
            .filter(|c| !c.is_empty())
            .or_else(|| self.view.currency().map(String::from));

        let on_product = self.view.on_product_page();
        let initial_product_id = self
            .view
            .product
            .as_ref()
            .filter(|_| on_product)
            .and_then(|p| GlobalId::parse(&p.id, PRODUCT_TYPE).ok())
            .map(|gid| gid.id());
        let initial_variant = self
            .view
            .selected_variant()
            .filter(|_| on_product)
            .and_then(|v| transform_variant(v).ok());

        Registration {
            commands: self.commands.clone(),
            page_type: self.view.page_type(),
            customer_tags: self.config.customer_tags.clone(),
            initial_currency,
            initial_product_id,
            initial_variant_id: initial_variant.as_ref().map(|v| v.id),
            initial_variant_price: initial_variant.as_ref().map(|v| v.price_cents),
        }
    }

    fn on_event(&mut self, event: StorefrontEvent) {
        for channel in self.view.apply(event) {
            self.refresh(channel, false);
        }
        self.channels.log_progress(PROGRESS_LOG_EVERY, false);
    }

    /// Recompute `channel`'s snapshot and push it if its fingerprint moved (or if `force`).
    fn refresh(&mut self, channel: Channel, force: bool) {
        let widget = self.widget.clone();

        match channel {
            Channel::Cart => {
                let cart = transform_cart(self.view.cart.as_ref());
                if let Some(cart) = &cart {
                    debug!(
                        "Cart snapshot: {} item(s), {}",
                        cart.item_count,
                        format_cents(cart.total_price_cents, &cart.currency)
                    );
                }
                let fp = fingerprint(cart.as_ref());
                self.deliver(channel, fp, force, || widget.cart_changed(cart.as_ref()));
            }
            Channel::Page => {
                let page = self.view.page_type();
                let fp = fingerprint(Some(&page));
                self.deliver(channel, fp, force, || widget.page_type_changed(page));

                // The next product page announces its product and variant afresh
                if self.view.product.is_none() {
                    self.channels.forget(Channel::Product);
                    self.channels.forget(Channel::Variant);
                }
            }
            Channel::Locale => {
                let currency = self.view.currency().map(String::from);
                let fp = fingerprint(currency.as_deref());
                self.deliver(channel, fp, force, || {
                    widget.locale_changed(currency.as_deref())
                });
            }
            Channel::Product => {
                if !self.view.on_product_page() {
                    return;
                }
                let product = self.view.product.as_ref().and_then(transform_product);
                let fp = fingerprint(product.as_ref());
                self.deliver(channel, fp, force, || {
                    widget.product_changed(product.as_ref())
                });
            }
            Channel::Variant => {
                if !self.view.on_product_page() {
                    return;
                }
                let Some(selected) = self.view.selected_variant().cloned() else {
                    return;
                };
                match transform_variant(&selected) {
                    Ok(variant) => {
                        let fp = fingerprint(Some(&variant));
                        self.deliver(channel, fp, force, || widget.variant_changed(&variant));
                    }
                    Err(e) => debug!("Skipping variant push for {}: {}", selected.id, e),
                }
            }
        }
    }

    fn deliver<F>(&mut self, channel: Channel, fingerprint: String, force: bool, notify: F)
    where
        F: FnOnce() -> Result<(), WidgetError>,
    {
        if !force && !self.channels.has_changed(channel, &fingerprint) {
            debug!("No change on {} channel, skipping push", channel);
            self.channels.record_suppressed(channel);
            return;
        }

        match guarded(channel.as_str(), notify) {
            Ok(()) => {
                debug!(
                    "Pushed {} channel ({} byte fingerprint)",
                    channel,
                    fingerprint.len()
                );
                self.channels.record_pushed(channel, fingerprint);
            }
            Err(e) => {
                warn!("Discarding widget failure on {} channel: {}", channel, e);
                self.channels.record_failed(channel);
            }
        }
    }
}

/// Call into the widget, turning a panic in its handler into an error.
fn guarded<F>(handler: &'static str, call: F) -> Result<(), WidgetError>
where
    F: FnOnce() -> Result<(), WidgetError>,
{
    catch_unwind(AssertUnwindSafe(call)).unwrap_or(Err(WidgetError::HandlerPanicked(handler)))
}
