//! Recording doubles for the widget and drawer ports.

use crate::storefront::{DrawerController, DrawerPanel};
use crate::widget::{
    CartSnapshot, ExternalWidgetPort, PageContext, ProductSnapshot, Registration, VariantSnapshot,
    WidgetError,
};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A call the widget accepted
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCall {
    Connect { page_type: PageContext },
    CartChanged(Option<CartSnapshot>),
    PageTypeChanged(PageContext),
    LocaleChanged(Option<String>),
    ProductChanged(Option<ProductSnapshot>),
    VariantChanged(VariantSnapshot),
}

#[derive(Default)]
pub struct RecordingWidget {
    ready: AtomicBool,
    readiness_checks: AtomicU32,
    calls: Mutex<Vec<WidgetCall>>,
    failing: Mutex<HashSet<&'static str>>,
    panicking: Mutex<HashSet<&'static str>>,
    registration: Mutex<Option<Registration>>,
    consent: Mutex<Option<bool>>,
}

impl RecordingWidget {
    pub fn ready() -> Self {
        let widget = Self::default();
        widget.set_ready(true);
        widget
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn readiness_checks(&self) -> u32 {
        self.readiness_checks.load(Ordering::SeqCst)
    }

    /// Make `handler` return an error until [`recover`](Self::recover) is called.
    pub fn fail(&self, handler: &'static str) {
        lock(&self.failing).insert(handler);
    }

    pub fn recover(&self, handler: &'static str) {
        lock(&self.failing).remove(handler);
        lock(&self.panicking).remove(handler);
    }

    pub fn panic_on(&self, handler: &'static str) {
        lock(&self.panicking).insert(handler);
    }

    pub fn calls(&self) -> Vec<WidgetCall> {
        lock(&self.calls).clone()
    }

    pub fn calls_matching(&self, filter: impl Fn(&WidgetCall) -> bool) -> Vec<WidgetCall> {
        self.calls().into_iter().filter(|c| filter(c)).collect()
    }

    pub fn count(&self, filter: impl Fn(&WidgetCall) -> bool) -> usize {
        self.calls_matching(filter).len()
    }

    pub fn registration(&self) -> Option<Registration> {
        lock(&self.registration).clone()
    }

    pub fn consent(&self) -> Option<bool> {
        *lock(&self.consent)
    }

    fn accept(&self, handler: &'static str, call: WidgetCall) -> Result<(), WidgetError> {
        // Check and release the locks before panicking
        let panics = lock(&self.panicking).contains(handler);
        if panics {
            panic!("widget handler {} blew up", handler);
        }
        let fails = lock(&self.failing).contains(handler);
        if fails {
            return Err(WidgetError::HandlerFailed {
                handler,
                message: "rejected by test".to_string(),
            });
        }
        lock(&self.calls).push(call);
        Ok(())
    }
}

impl ExternalWidgetPort for RecordingWidget {
    fn is_ready(&self) -> bool {
        self.readiness_checks.fetch_add(1, Ordering::SeqCst);
        self.ready.load(Ordering::SeqCst)
    }

    fn connect(&self, registration: Registration) -> Result<(), WidgetError> {
        let page_type = registration.page_type;
        self.accept("connect", WidgetCall::Connect { page_type })?;
        *lock(&self.registration) = Some(registration);
        Ok(())
    }

    fn cart_changed(&self, cart: Option<&CartSnapshot>) -> Result<(), WidgetError> {
        self.accept("cart_changed", WidgetCall::CartChanged(cart.cloned()))
    }

    fn page_type_changed(&self, page: PageContext) -> Result<(), WidgetError> {
        self.accept("page_type_changed", WidgetCall::PageTypeChanged(page))
    }

    fn locale_changed(&self, currency: Option<&str>) -> Result<(), WidgetError> {
        self.accept(
            "locale_changed",
            WidgetCall::LocaleChanged(currency.map(String::from)),
        )
    }

    fn product_changed(&self, product: Option<&ProductSnapshot>) -> Result<(), WidgetError> {
        self.accept("product_changed", WidgetCall::ProductChanged(product.cloned()))
    }

    fn variant_changed(&self, variant: &VariantSnapshot) -> Result<(), WidgetError> {
        self.accept("variant_changed", WidgetCall::VariantChanged(variant.clone()))
    }

    fn set_analytics_consent(&self, allowed: bool) {
        *lock(&self.consent) = Some(allowed);
    }
}

#[derive(Default)]
pub struct RecordingDrawer {
    opened: Mutex<Vec<DrawerPanel>>,
}

impl RecordingDrawer {
    pub fn opened(&self) -> Vec<DrawerPanel> {
        lock(&self.opened).clone()
    }
}

impl DrawerController for RecordingDrawer {
    fn open(&self, panel: DrawerPanel) {
        lock(&self.opened).push(panel);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
