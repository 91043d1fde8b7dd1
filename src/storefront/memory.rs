//! In-memory storefront cart.
//!
//! Holds a [`Cart`] behind a mutex, applies the mutations the bridge forwards, and republishes
//! every resulting cart as a [`StorefrontEvent::CartUpdated`] so that a command issued by the
//! widget comes back around as a cart notification.

use super::{
    Attribute, Cart, CartActions, CartCost, CartLine, CartLineCost, CartLineInput, DrawerController,
    DrawerPanel, GlobalId, Merchandise, Money, ProductRef, StorefrontError, StorefrontEvent,
    ids::PRODUCT_VARIANT_TYPE,
};
use crate::utils::amount_to_cents;

use futures::channel::mpsc::UnboundedSender;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Catalog entry used to price lines added by variant id.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub product_id: String,
    pub handle: String,
    pub unit_price: Money,
}

/// Cart held in memory
pub struct InMemoryCart {
    cart: Mutex<Cart>,
    catalog: HashMap<String, CatalogEntry>,
    events: Option<UnboundedSender<StorefrontEvent>>,
    rejection: Mutex<Option<String>>,
    next_line: Mutex<u64>,
}

impl InMemoryCart {
    pub fn new(cart: Cart) -> Self {
        let next_line = cart.lines.len() as u64 + 1;
        Self {
            cart: Mutex::new(cart),
            catalog: HashMap::new(),
            events: None,
            rejection: Mutex::new(None),
            next_line: Mutex::new(next_line),
        }
    }

    /// Price lines for `variant_id` (a variant global id) from `entry`.
    pub fn with_catalog_entry(mut self, variant_id: impl Into<String>, entry: CatalogEntry) -> Self {
        self.catalog.insert(variant_id.into(), entry);
        self
    }

    /// Publish every cart change to `sender`.
    pub fn with_events(mut self, sender: UnboundedSender<StorefrontEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Make every following mutation fail with `reason`.
    pub fn reject_mutations(&self, reason: impl Into<String>) {
        *lock(&self.rejection) = Some(reason.into());
    }

    pub fn snapshot(&self) -> Cart {
        lock(&self.cart).clone()
    }

    fn check_rejection(&self) -> Result<(), StorefrontError> {
        match lock(&self.rejection).as_ref() {
            Some(reason) => Err(StorefrontError::MutationRejected(reason.clone())),
            None => Ok(()),
        }
    }

    fn publish(&self, cart: Cart) {
        if let Some(sender) = &self.events {
            // A closed receiver means the bridge was torn down; the cart itself is still valid
            if sender
                .unbounded_send(StorefrontEvent::CartUpdated { cart: Some(cart) })
                .is_err()
            {
                debug!("Cart listener gone, dropping cart update");
            }
        }
    }

    fn new_line(&self, input: &CartLineInput) -> CartLine {
        let mut next = lock(&self.next_line);
        let line_id = GlobalId::new("CartLine", *next).to_string();
        *next += 1;

        let entry = self.catalog.get(&input.merchandise_id);
        CartLine {
            id: Some(line_id),
            quantity: Some(i64::from(input.quantity)),
            merchandise: Some(Merchandise {
                id: Some(input.merchandise_id.clone()),
                product: entry.map(|e| ProductRef {
                    id: Some(e.product_id.clone()),
                    handle: Some(e.handle.clone()),
                }),
            }),
            cost: entry.map(|e| CartLineCost {
                total_amount: Some(line_total(&e.unit_price, i64::from(input.quantity))),
                compare_at_amount_per_quantity: None,
            }),
        }
    }

    fn reprice(&self, line: &mut CartLine) {
        let entry = line
            .merchandise
            .as_ref()
            .and_then(|m| m.id.as_ref())
            .and_then(|id| self.catalog.get(id));
        if let (Some(entry), Some(quantity)) = (entry, line.quantity) {
            line.cost = Some(CartLineCost {
                total_amount: Some(line_total(&entry.unit_price, quantity)),
                compare_at_amount_per_quantity: None,
            });
        }
    }
}

#[async_trait::async_trait]
impl CartActions for InMemoryCart {
    fn line_ids(&self) -> Vec<String> {
        lock(&self.cart)
            .lines
            .iter()
            .filter_map(|line| line.id.clone())
            .collect()
    }

    async fn lines_add(&self, lines: Vec<CartLineInput>) -> Result<(), StorefrontError> {
        self.check_rejection()?;
        // The whole batch is rejected before any line is touched
        if let Some(input) = lines
            .iter()
            .find(|input| !input.merchandise_id.contains(PRODUCT_VARIANT_TYPE))
        {
            return Err(StorefrontError::MutationRejected(format!(
                "merchandise id {} is not a product variant",
                input.merchandise_id
            )));
        }

        let updated = {
            let mut cart = lock(&self.cart);
            for input in &lines {
                let existing = cart.lines.iter_mut().find(|line| {
                    line.merchandise.as_ref().and_then(|m| m.id.as_deref())
                        == Some(input.merchandise_id.as_str())
                });
                match existing {
                    Some(line) => {
                        line.quantity = Some(line.quantity.unwrap_or(0) + i64::from(input.quantity));
                        self.reprice(line);
                    }
                    None => {
                        let line = self.new_line(input);
                        cart.lines.push(line);
                    }
                }
            }
            recompute_total(&mut cart);
            cart.clone()
        };

        info!("Added {} line(s) to cart", lines.len());
        self.publish(updated);
        Ok(())
    }

    async fn lines_remove(&self, line_ids: Vec<String>) -> Result<(), StorefrontError> {
        self.check_rejection()?;

        let updated = {
            let mut cart = lock(&self.cart);
            cart.lines
                .retain(|line| !line.id.as_ref().is_some_and(|id| line_ids.contains(id)));
            recompute_total(&mut cart);
            cart.clone()
        };

        info!("Removed {} line(s) from cart", line_ids.len());
        self.publish(updated);
        Ok(())
    }

    async fn attributes_update(&self, attributes: Vec<Attribute>) -> Result<(), StorefrontError> {
        self.check_rejection()?;

        let updated = {
            let mut cart = lock(&self.cart);
            cart.attributes = Some(super::Attributes::Pairs(attributes));
            cart.clone()
        };

        self.publish(updated);
        Ok(())
    }
}

/// Drawer controller that only logs which panel was opened
#[derive(Debug, Default)]
pub struct LoggingDrawer;

impl DrawerController for LoggingDrawer {
    fn open(&self, panel: DrawerPanel) {
        info!("Opening {} drawer", panel.as_str());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn line_total(unit_price: &Money, quantity: i64) -> Money {
    let cents = amount_to_cents(&unit_price.amount).unwrap_or(0.0).round() as i64 * quantity;
    Money::new(format_decimal(cents), unit_price.currency_code.clone())
}

fn recompute_total(cart: &mut Cart) {
    let mut currency = cart
        .cost
        .as_ref()
        .and_then(|c| c.total_amount.as_ref())
        .map(|m| m.currency_code.clone())
        .unwrap_or_default();

    let mut cents = 0i64;
    for amount in cart
        .lines
        .iter()
        .filter_map(|line| line.cost.as_ref())
        .filter_map(|cost| cost.total_amount.as_ref())
    {
        cents += amount_to_cents(&amount.amount).unwrap_or(0.0).round() as i64;
        if currency.is_empty() {
            currency = amount.currency_code.clone();
        }
    }

    cart.cost = Some(CartCost {
        total_amount: Some(Money::new(format_decimal(cents), currency)),
    });
}

fn format_decimal(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}
