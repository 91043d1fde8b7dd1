//! Storefront view tracking for the bridge.
//!
//! The bridge keeps the latest value of every storefront state source in a [`StorefrontView`].
//! Applying a [`StorefrontEvent`] updates the view and reports which notification channels
//! must be re-evaluated. Product and variant channels only exist on product-detail pages: the
//! view drops the held product as soon as the route leaves one.

use super::channels::Channel;
use super::transformer::get_page_type;
use crate::storefront::{Cart, Locale, Product, ProductVariant, StorefrontEvent};
use crate::widget::PageContext;

use serde::{Deserialize, Serialize};

/// Latest known value of every storefront state source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontView {
    #[serde(default)]
    pub cart: Option<Cart>,
    #[serde(default = "root_path")]
    pub path: String,
    #[serde(default)]
    pub locale: Option<Locale>,
    #[serde(default)]
    pub product: Option<Product>,
    /// Variant the shopper picked; see [`StorefrontView::selected_variant`] for the fallback.
    #[serde(default)]
    pub variant: Option<ProductVariant>,
}

fn root_path() -> String {
    "/".to_string()
}

impl Default for StorefrontView {
    fn default() -> Self {
        Self {
            cart: None,
            path: root_path(),
            locale: None,
            product: None,
            variant: None,
        }
    }
}

impl StorefrontView {
    pub fn page_type(&self) -> PageContext {
        get_page_type(&self.path)
    }

    pub fn on_product_page(&self) -> bool {
        self.page_type() == PageContext::Product
    }

    /// The picked variant, or the product's selected-or-first variant when none was picked.
    pub fn selected_variant(&self) -> Option<&ProductVariant> {
        self.variant.as_ref().or_else(|| {
            self.product
                .as_ref()
                .and_then(|p| p.selected_or_first_available_variant.as_ref())
        })
    }

    /// Currency of the active locale; the locale channel's payload.
    pub fn currency(&self) -> Option<&str> {
        self.locale.as_ref().and_then(|l| l.currency.as_deref())
    }

    /// Channels with a value to push right now.
    ///
    /// Cart, page and locale always have one (possibly empty); product and variant only on a
    /// product-detail page with a loaded product.
    pub fn active_channels(&self) -> Vec<Channel> {
        let mut channels = vec![Channel::Cart, Channel::Page, Channel::Locale];
        if self.on_product_page() && self.product.is_some() {
            channels.push(Channel::Product);
            if self.selected_variant().is_some() {
                channels.push(Channel::Variant);
            }
        }
        channels
    }

    /// Apply `event` and return the channels whose value may have changed.
    pub fn apply(&mut self, event: StorefrontEvent) -> Vec<Channel> {
        match event {
            StorefrontEvent::CartUpdated { cart } => {
                self.cart = cart;
                vec![Channel::Cart]
            }
            StorefrontEvent::RouteChanged { path } => {
                self.path = path;
                if !self.on_product_page() {
                    self.product = None;
                    self.variant = None;
                }
                vec![Channel::Page]
            }
            StorefrontEvent::LocaleChanged { locale } => {
                self.locale = Some(locale);
                vec![Channel::Locale]
            }
            StorefrontEvent::ProductLoaded { product } => {
                if !self.on_product_page() {
                    return Vec::new();
                }
                self.variant = product.selected_or_first_available_variant.clone();
                self.product = Some(product);
                vec![Channel::Product, Channel::Variant]
            }
            StorefrontEvent::VariantSelected { variant } => {
                if !self.on_product_page() || self.product.is_none() {
                    return Vec::new();
                }
                self.variant = Some(variant);
                vec![Channel::Variant]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: "gid://shopify/Product/999".to_string(),
            handle: Some("tee".to_string()),
            selected_or_first_available_variant: Some(variant(111)),
            adjacent_variants: vec![],
        }
    }

    fn variant(id: u64) -> ProductVariant {
        ProductVariant {
            id: format!("gid://shopify/ProductVariant/{}", id),
            available_for_sale: Some(true),
            quantity_available: Some(1),
            price: None,
            compare_at_price: None,
        }
    }

    fn on_product_page() -> StorefrontView {
        let mut view = StorefrontView::default();
        view.apply(StorefrontEvent::RouteChanged {
            path: "/products/tee".to_string(),
        });
        view
    }

    #[test]
    fn product_outside_product_page_is_ignored() {
        let mut view = StorefrontView::default();
        let channels = view.apply(StorefrontEvent::ProductLoaded { product: product() });
        assert!(channels.is_empty());
        assert_eq!(view.product, None);
    }

    #[test]
    fn product_load_selects_its_default_variant() {
        let mut view = on_product_page();
        let channels = view.apply(StorefrontEvent::ProductLoaded { product: product() });

        assert_eq!(channels, vec![Channel::Product, Channel::Variant]);
        assert_eq!(view.variant, Some(variant(111)));
        assert_eq!(
            view.active_channels(),
            vec![
                Channel::Cart,
                Channel::Page,
                Channel::Locale,
                Channel::Product,
                Channel::Variant
            ]
        );
    }

    #[test]
    fn leaving_the_product_page_drops_the_product() {
        let mut view = on_product_page();
        view.apply(StorefrontEvent::ProductLoaded { product: product() });

        let channels = view.apply(StorefrontEvent::RouteChanged {
            path: "/collections/all".to_string(),
        });

        assert_eq!(channels, vec![Channel::Page]);
        assert_eq!(view.product, None);
        assert_eq!(view.variant, None);
        assert_eq!(
            view.active_channels(),
            vec![Channel::Cart, Channel::Page, Channel::Locale]
        );
    }

    #[test]
    fn variant_selection_needs_a_product() {
        let mut view = on_product_page();
        assert!(
            view.apply(StorefrontEvent::VariantSelected { variant: variant(112) })
                .is_empty()
        );

        view.apply(StorefrontEvent::ProductLoaded { product: product() });
        assert_eq!(
            view.apply(StorefrontEvent::VariantSelected { variant: variant(112) }),
            vec![Channel::Variant]
        );
        assert_eq!(view.variant, Some(variant(112)));
    }

    #[test]
    fn product_without_picked_variant_falls_back_to_its_default() {
        let mut view = on_product_page();
        view.product = Some(product());

        assert_eq!(view.variant, None);
        assert_eq!(view.selected_variant(), Some(&variant(111)));
        assert!(view.active_channels().contains(&Channel::Variant));
    }

    #[test]
    fn locale_channel_carries_the_currency() {
        let mut view = StorefrontView::default();
        view.apply(StorefrontEvent::LocaleChanged {
            locale: Locale::with_currency("CAD"),
        });
        assert_eq!(view.currency(), Some("CAD"));
    }
}
