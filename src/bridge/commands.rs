//! Commands the widget can invoke back into the storefront.
//!
//! Each command only routes the call to the storefront's mutation surface and hands the result
//! back to the caller. Nothing is retried here; a failed mutation comes back as an `Err` on the
//! returned future.

use super::transformer::normalize_attributes;
use crate::storefront::{
    Attributes, CartActions, CartLineInput, DrawerController, DrawerPanel, GlobalId,
    StorefrontError,
};

use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::info;

/// The command set handed to the widget at registration.
#[derive(Clone)]
pub struct CommandCallbacks {
    cart: Arc<dyn CartActions>,
    drawer: Arc<dyn DrawerController>,
}

impl CommandCallbacks {
    pub fn new(cart: Arc<dyn CartActions>, drawer: Arc<dyn DrawerController>) -> Self {
        Self { cart, drawer }
    }

    /// Remove every line currently in the cart.
    pub fn cart_clear(&self) -> BoxFuture<'static, Result<(), StorefrontError>> {
        let cart = self.cart.clone();
        Box::pin(async move {
            let line_ids = cart.line_ids();
            info!("Widget command cart_clear: removing {} line(s)", line_ids.len());
            cart.lines_remove(line_ids).await
        })
    }

    /// Add `quantity` of the variant with numeric id `variant_id`.
    pub fn add_to_cart(
        &self,
        variant_id: u64,
        quantity: u32,
    ) -> BoxFuture<'static, Result<(), StorefrontError>> {
        let cart = self.cart.clone();
        Box::pin(async move {
            let merchandise_id = GlobalId::product_variant(variant_id).to_string();
            info!(
                "Widget command add_to_cart: {} x{}",
                merchandise_id, quantity
            );
            cart.lines_add(vec![CartLineInput {
                merchandise_id,
                quantity,
            }])
            .await
        })
    }

    /// Forward an attribute update to the cart.
    pub fn cart_add_attributes(
        &self,
        attributes: Attributes,
    ) -> BoxFuture<'static, Result<(), StorefrontError>> {
        let cart = self.cart.clone();
        Box::pin(async move {
            let attributes = normalize_attributes(attributes);
            info!(
                "Widget command cart_add_attributes: {} attribute(s)",
                attributes.len()
            );
            cart.attributes_update(attributes).await
        })
    }

    pub fn open_cart_drawer(&self) {
        info!("Widget command open_cart_drawer");
        self.drawer.open(DrawerPanel::Cart);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::RecordingDrawer;
    use crate::storefront::memory::InMemoryCart;
    use crate::storefront::{Attribute, Cart, CartLine};
    use serde_json::json;

    fn callbacks(cart: Arc<InMemoryCart>) -> (CommandCallbacks, Arc<RecordingDrawer>) {
        let drawer = Arc::new(RecordingDrawer::default());
        (CommandCallbacks::new(cart, drawer.clone()), drawer)
    }

    #[tokio::test]
    async fn add_to_cart_prefixes_the_variant_id() {
        let cart = Arc::new(InMemoryCart::new(Cart::default()));
        let (commands, _) = callbacks(cart.clone());

        commands.add_to_cart(111, 2).await.unwrap();

        let line = &cart.snapshot().lines[0];
        assert_eq!(
            line.merchandise.as_ref().unwrap().id.as_deref(),
            Some("gid://shopify/ProductVariant/111")
        );
        assert_eq!(line.quantity, Some(2));
    }

    #[tokio::test]
    async fn cart_clear_removes_all_current_lines() {
        let existing = Cart {
            lines: vec![
                CartLine {
                    id: Some("gid://shopify/CartLine/1".to_string()),
                    quantity: Some(1),
                    merchandise: None,
                    cost: None,
                },
                CartLine {
                    id: Some("gid://shopify/CartLine/2".to_string()),
                    quantity: Some(4),
                    merchandise: None,
                    cost: None,
                },
            ],
            ..Cart::default()
        };
        let cart = Arc::new(InMemoryCart::new(existing));
        let (commands, _) = callbacks(cart.clone());

        commands.cart_clear().await.unwrap();

        assert!(cart.snapshot().lines.is_empty());
    }

    #[tokio::test]
    async fn keyed_attributes_are_normalized_before_forwarding() {
        let cart = Arc::new(InMemoryCart::new(Cart::default()));
        let (commands, _) = callbacks(cart.clone());
        let attributes: Attributes = serde_json::from_value(json!({"b": "2", "a": "1"})).unwrap();

        commands.cart_add_attributes(attributes).await.unwrap();

        assert_eq!(
            cart.snapshot().attributes.unwrap().into_pairs(),
            vec![Attribute::new("a", "1"), Attribute::new("b", "2")]
        );
    }

    #[tokio::test]
    async fn mutation_failure_reaches_the_caller_unchanged() {
        let cart = Arc::new(InMemoryCart::new(Cart::default()));
        cart.reject_mutations("out of stock");
        let (commands, _) = callbacks(cart);

        // building the future never fails; the error arrives when it is awaited
        let pending = commands.add_to_cart(111, 1);
        assert_eq!(
            pending.await,
            Err(StorefrontError::MutationRejected("out of stock".to_string()))
        );
    }

    #[test]
    fn open_cart_drawer_opens_the_cart_panel() {
        let cart = Arc::new(InMemoryCart::new(Cart::default()));
        let (commands, drawer) = callbacks(cart);

        commands.open_cart_drawer();

        assert_eq!(drawer.opened(), vec![DrawerPanel::Cart]);
    }
}
