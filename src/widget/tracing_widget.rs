//! A widget that only logs.
//!
//! Stands in for the real widget when replaying a storefront session: it reports ready once a
//! configurable delay has passed since construction and logs every call it receives.

use super::{
    CartSnapshot, ExternalWidgetPort, PageContext, ProductSnapshot, Registration, VariantSnapshot,
    WidgetError,
};
use crate::utils::format_cents;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::time::{Duration, Instant};
use tracing::info;

/// Log-only implementation of [`ExternalWidgetPort`]
pub struct TracingWidget {
    ready_at: Instant,
    notifications: AtomicU64,
    consent: AtomicBool,
    registration: Mutex<Option<Registration>>,
}

impl TracingWidget {
    /// A widget that becomes ready `ready_after` from now.
    pub fn new(ready_after: Duration) -> Self {
        Self {
            ready_at: Instant::now() + ready_after,
            notifications: AtomicU64::new(0),
            consent: AtomicBool::new(false),
            registration: Mutex::new(None),
        }
    }

    /// Number of notifications received so far, registration excluded.
    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    /// Command callbacks handed over at registration, if it happened.
    pub fn registration(&self) -> Option<Registration> {
        self.registration
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Calls made before the widget finished loading hit a missing handle.
    fn accept(&self) -> Result<(), WidgetError> {
        if !self.is_ready() {
            return Err(WidgetError::NotLoaded);
        }
        self.notifications.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl ExternalWidgetPort for TracingWidget {
    fn is_ready(&self) -> bool {
        Instant::now() >= self.ready_at
    }

    fn connect(&self, registration: Registration) -> Result<(), WidgetError> {
        if !self.is_ready() {
            return Err(WidgetError::NotLoaded);
        }
        info!(
            "widget connect: page={} currency={:?} tags={:?} product={:?} variant={:?}",
            registration.page_type.as_str(),
            registration.initial_currency,
            registration.customer_tags,
            registration.initial_product_id,
            registration.initial_variant_id,
        );
        match self.registration.lock() {
            Ok(mut guard) => *guard = Some(registration),
            Err(poisoned) => *poisoned.into_inner() = Some(registration),
        }
        Ok(())
    }

    fn cart_changed(&self, cart: Option<&CartSnapshot>) -> Result<(), WidgetError> {
        self.accept()?;
        match cart {
            Some(cart) => info!(
                "widget cart_changed: {} item(s), total {}",
                cart.item_count,
                format_cents(cart.total_price_cents, &cart.currency)
            ),
            None => info!("widget cart_changed: no cart"),
        }
        Ok(())
    }

    fn page_type_changed(&self, page: PageContext) -> Result<(), WidgetError> {
        self.accept()?;
        info!("widget page_type_changed: {}", page.as_str());
        Ok(())
    }

    fn locale_changed(&self, currency: Option<&str>) -> Result<(), WidgetError> {
        self.accept()?;
        info!("widget locale_changed: {}", currency.unwrap_or("<none>"));
        Ok(())
    }

    fn product_changed(&self, product: Option<&ProductSnapshot>) -> Result<(), WidgetError> {
        self.accept()?;
        match product {
            Some(product) => info!(
                "widget product_changed: id={} variants={} out_of_stock={}",
                product.id,
                product.variants.len(),
                product.out_of_stock
            ),
            None => info!("widget product_changed: no product"),
        }
        Ok(())
    }

    fn variant_changed(&self, variant: &VariantSnapshot) -> Result<(), WidgetError> {
        self.accept()?;
        info!(
            "widget variant_changed: id={} price={} inventory={}",
            variant.id, variant.price_cents, variant.inventory_quantity
        );
        Ok(())
    }

    fn set_analytics_consent(&self, allowed: bool) {
        self.consent.store(allowed, Ordering::Relaxed);
        info!("widget analytics consent: {}", allowed);
    }
}
