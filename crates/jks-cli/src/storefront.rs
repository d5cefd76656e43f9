//! One storefront session: the fetched catalog, the shopper's query and
//! cart, and the countdowns running for the products on screen.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jks_core::{
    filter_and_sort, order_message, paginate, whatsapp_link, Cart, CatalogQuery, CategoryFilter,
    CheckoutError, Countdown, Order, OrderDraft, Page, Product, QuantityChange, SortOption,
    PAGE_SIZE,
};
use jks_platform::LinkShortener;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{ApiClientError, StoreApi};
use crate::countdown::{spawn_countdown, CountdownEvent, CountdownHandle, OfferExpirer};

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("product {0} is not in the catalog")]
    UnknownProduct(i64),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Api(#[from] ApiClientError),
}

/// What a completed checkout hands back to the shopper.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub order: Order,
    /// Invoice link as sent in the message; shortened when possible.
    pub invoice_link: String,
    pub whatsapp_url: String,
}

/// The product fields a countdown is derived from. A countdown is only
/// restarted when these change.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OfferKey {
    enabled: bool,
    time: Option<String>,
    sale_end: Option<DateTime<Utc>>,
}

impl OfferKey {
    fn of(product: &Product) -> Self {
        Self {
            enabled: product.countdown_enabled,
            time: product.countdown_time.clone(),
            sale_end: product.sale_end_date,
        }
    }
}

/// A countdown spawned for one product. `handle` is `None` once the timer
/// has ended, so an unchanged offer is not counted down a second time.
struct TrackedCountdown {
    key: OfferKey,
    handle: Option<CountdownHandle>,
}

pub struct Storefront {
    products: Vec<Product>,
    query: CatalogQuery,
    page: usize,
    cart: Cart,
    countdowns: HashMap<i64, TrackedCountdown>,
}

impl Default for Storefront {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            query: CatalogQuery::default(),
            page: 1,
            cart: Cart::new(),
            countdowns: HashMap::new(),
        }
    }
}

impl Storefront {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::new()
        }
    }

    /// Replaces the product list with the server's current catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError`] if the catalog cannot be fetched; the
    /// previous list is kept.
    pub async fn refresh(&mut self, api: &StoreApi) -> Result<(), ApiClientError> {
        self.products = api.list_products().await?;
        tracing::debug!(count = self.products.len(), "catalog loaded");
        Ok(())
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn product(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn set_search(&mut self, search: &str) {
        self.query.search = search.to_string();
        self.page = 1;
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.query.category = category;
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.query.sort = sort;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// The current page of the filtered, sorted catalog.
    #[must_use]
    pub fn visible(&self) -> Page<Product> {
        let filtered = filter_and_sort(&self.products, &self.query);
        paginate(&filtered, self.page, PAGE_SIZE)
    }

    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Adds a catalog product to the cart. Returns `false` if it was
    /// already there.
    ///
    /// # Errors
    ///
    /// [`StorefrontError::UnknownProduct`] if `product_id` is not loaded.
    pub fn add_to_cart(&mut self, product_id: i64) -> Result<bool, StorefrontError> {
        let product = self
            .products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or(StorefrontError::UnknownProduct(product_id))?;
        Ok(self.cart.add(product))
    }

    pub fn update_quantity(&mut self, product_id: i64, change: QuantityChange) {
        self.cart.update_quantity(product_id, change);
    }

    /// Brings the countdowns in line with the visible products.
    ///
    /// A countdown whose product is still on the page with the same offer
    /// keeps running untouched. Countdowns for products that left the page
    /// or whose offer changed are stopped, and new ones are spawned only
    /// where none is tracked. Returns how many are running.
    pub fn start_countdowns<E: OfferExpirer>(
        &mut self,
        expirer: &Arc<E>,
        events: &UnboundedSender<CountdownEvent>,
        now: DateTime<Utc>,
    ) -> usize {
        let visible: HashMap<i64, Product> = self
            .visible()
            .items
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        self.countdowns.retain(|id, tracked| {
            visible
                .get(id)
                .is_some_and(|product| OfferKey::of(product) == tracked.key)
        });

        for (id, product) in &visible {
            if self.countdowns.contains_key(id) {
                continue;
            }
            let countdown = Countdown::start(product, now);
            if let Some(handle) = spawn_countdown(countdown, Arc::clone(expirer), events.clone()) {
                self.countdowns.insert(
                    handle.product_id(),
                    TrackedCountdown {
                        key: OfferKey::of(product),
                        handle: Some(handle),
                    },
                );
            }
        }
        self.running_countdowns()
    }

    /// Marks a product's countdown as ended.
    pub fn finish_countdown(&mut self, product_id: i64) {
        if let Some(tracked) = self.countdowns.get_mut(&product_id) {
            tracked.handle = None;
        }
    }

    #[must_use]
    pub fn running_countdowns(&self) -> usize {
        self.countdowns
            .values()
            .filter(|tracked| tracked.handle.is_some())
            .count()
    }

    pub fn stop_countdowns(&mut self) {
        self.countdowns.clear();
    }

    /// Prices the cart without placing an order.
    ///
    /// # Errors
    ///
    /// [`CheckoutError`] for an empty cart or a total under the minimum.
    pub fn quote(&self) -> Result<OrderDraft, CheckoutError> {
        OrderDraft::from_cart(&self.cart)
    }

    /// Places the order and builds the WhatsApp handoff link.
    ///
    /// An empty cart is a no-op and yields `Ok(None)`. A total under the
    /// minimum is refused before any request is made. The cart is cleared
    /// only after the order is stored.
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Checkout`] when the minimum is not met,
    /// [`StorefrontError::Api`] when the settings or order request fails.
    pub async fn checkout(
        &mut self,
        api: &StoreApi,
        shortener: &LinkShortener,
    ) -> Result<Option<Receipt>, StorefrontError> {
        let draft = match OrderDraft::from_cart(&self.cart) {
            Ok(draft) => draft,
            Err(CheckoutError::EmptyCart) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let number = api.whatsapp_number().await?;
        let created = api.create_order(&draft).await?;
        tracing::info!(order_id = %created.order.id, total = created.order.total, "order placed");

        let invoice_link = shortener.shorten_or_original(&created.invoice_url).await;
        let message = order_message(&draft, &invoice_link);
        let whatsapp_url = whatsapp_link(&number, &message);

        self.cart.clear();
        Ok(Some(Receipt {
            order: created.order,
            invoice_link,
            whatsapp_url,
        }))
    }
}

#[cfg(test)]
#[path = "storefront_test.rs"]
mod tests;
