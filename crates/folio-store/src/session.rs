//! # Checkout Session
//!
//! The façade a storefront handler talks to. It owns one shared cart plus the
//! collaborators the pricing engine needs, and logs every step.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item / set_quantity ──► catalog checks ──► SharedCart::try_update  │
//! │  apply_coupon_code ────────► CouponValidator ──► cart.apply_coupon      │
//! │  quote ────────────────────► resolve + compute_totals (pure)            │
//! │  checkout ─────────────────► reconcile stock                            │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                             quote ─► reject empty / unavailable lines   │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                             payment ─► settle cart ─► CheckoutReceipt   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use folio_core::payment::{PaymentDetails, PaymentOptions, PaymentReceipt};
use folio_core::pricing::{free_shipping_remaining, quote_cart};
use folio_core::{
    BookId, Catalog, CatalogEntry, CoreError, Coupon, CouponValidator, PricingConfig, Quote,
    StockAdjustment,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::StoreResult;
use crate::store::{CartStore, SharedCart};

/// Result of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub cart_id: String,
    pub quote: Quote,
    /// `None` when a coupon brought the total to zero.
    pub payment: Option<PaymentReceipt>,
    pub placed_at: DateTime<Utc>,
}

pub struct CheckoutSession<S, C, V>
where
    S: CartStore,
    C: Catalog,
    V: CouponValidator,
{
    cart: SharedCart<S>,
    catalog: C,
    coupons: V,
    config: PricingConfig,
    payments: PaymentOptions,
}

impl<S, C, V> CheckoutSession<S, C, V>
where
    S: CartStore,
    C: Catalog,
    V: CouponValidator,
{
    pub fn new(cart: SharedCart<S>, catalog: C, coupons: V, config: PricingConfig) -> Self {
        CheckoutSession {
            cart,
            catalog,
            coupons,
            config,
            payments: PaymentOptions::default(),
        }
    }

    pub fn with_payment_options(mut self, payments: PaymentOptions) -> Self {
        self.payments = payments;
        self
    }

    pub fn cart_id(&self) -> &str {
        self.cart.cart_id()
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn payment_options(&self) -> &PaymentOptions {
        &self.payments
    }

    // =========================================================================
    // Cart Mutations
    // =========================================================================

    /// Looks up a book that is about to enter the cart.
    fn sellable(&self, book_id: &BookId) -> StoreResult<CatalogEntry> {
        let entry = self
            .catalog
            .lookup(book_id)
            .ok_or_else(|| CoreError::BookNotFound(book_id.to_string()))?;

        if !entry.is_active {
            return Err(CoreError::BookUnavailable(book_id.to_string()).into());
        }

        Ok(entry)
    }

    fn check_stock(entry: &CatalogEntry, requested: i64) -> Result<(), CoreError> {
        if entry.can_fulfil(requested) {
            return Ok(());
        }
        Err(CoreError::InsufficientStock {
            book_id: entry.book_id.to_string(),
            available: entry.stock.unwrap_or(0).max(0),
            requested,
        })
    }

    /// Adds copies of a book. A quantity below 1 is a no-op.
    ///
    /// ## Errors
    /// - `BookNotFound` / `BookUnavailable` for unknown or withdrawn books
    /// - `InsufficientStock` when the cart would exceed tracked stock
    /// - cart limit errors from [`folio_core::Cart::add_item`]
    pub fn add_item(&self, book_id: impl Into<BookId>, quantity: i64) -> StoreResult<bool> {
        if quantity < 1 {
            debug!(quantity, "Ignoring add with non-positive quantity");
            return Ok(false);
        }

        let book_id = book_id.into();
        let entry = self.sellable(&book_id)?;

        let changed = self.cart.try_update(|cart| {
            let in_cart = cart.line(&book_id).map_or(0, |l| l.quantity);
            Self::check_stock(&entry, in_cart.saturating_add(quantity))?;
            cart.add_item(book_id.clone(), quantity)
        })?;

        info!(cart_id = %self.cart_id(), %book_id, quantity, "Added to cart");
        Ok(changed)
    }

    pub fn remove_item(&self, book_id: &BookId) -> StoreResult<bool> {
        let removed = self.cart.update(|cart| cart.remove_item(book_id))?;
        if removed {
            info!(cart_id = %self.cart_id(), %book_id, "Removed from cart");
        }
        Ok(removed)
    }

    /// Sets a line's quantity; 0 or less removes it.
    pub fn set_quantity(&self, book_id: &BookId, quantity: i64) -> StoreResult<bool> {
        if quantity > 0 {
            if let Some(entry) = self.catalog.lookup(book_id) {
                Self::check_stock(&entry, quantity)?;
            }
        }

        let changed = self
            .cart
            .try_update(|cart| cart.set_quantity(book_id, quantity))?;

        debug!(cart_id = %self.cart_id(), %book_id, quantity, changed, "Quantity set");
        Ok(changed)
    }

    /// Empties the cart and drops its coupon.
    pub fn clear(&self) -> StoreResult<()> {
        self.cart.update(|cart| cart.clear())?;
        info!(cart_id = %self.cart_id(), "Cart cleared");
        Ok(())
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Validates a code and applies the coupon, replacing any previous one.
    pub fn apply_coupon_code(&self, code: &str) -> StoreResult<Coupon> {
        let coupon = match self.coupons.validate(code) {
            Ok(coupon) => coupon,
            Err(e) => {
                info!(cart_id = %self.cart_id(), code, error = %e, "Coupon rejected");
                return Err(e.into());
            }
        };

        if !coupon.is_within_bounds() {
            warn!(
                code = coupon.code.as_deref().unwrap_or(code),
                rule = ?coupon.rule,
                "Coupon value out of range; it will be clamped when priced"
            );
        }

        let replaced = self.cart.update(|cart| cart.apply_coupon(coupon.clone()))?;
        info!(
            cart_id = %self.cart_id(),
            code = coupon.code.as_deref().unwrap_or(code),
            replaced = replaced.is_some(),
            "Coupon applied"
        );
        Ok(coupon)
    }

    pub fn remove_coupon(&self) -> StoreResult<Option<Coupon>> {
        self.cart.update(|cart| cart.remove_coupon())
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Lowers cart quantities to the stock the catalog has left.
    pub fn reconcile(&self) -> StoreResult<Vec<StockAdjustment>> {
        let adjustments = self.cart.update(|cart| cart.reconcile_stock(&self.catalog))?;

        for adjustment in &adjustments {
            warn!(
                cart_id = %self.cart_id(),
                book_id = %adjustment.book_id,
                requested = adjustment.requested,
                available = adjustment.available,
                "Cart quantity lowered to available stock"
            );
        }

        Ok(adjustments)
    }

    /// Prices the current cart.
    pub fn quote(&self) -> StoreResult<Quote> {
        let cart = self.cart.snapshot()?;

        if let Some(coupon) = cart.coupon.as_ref().filter(|c| !c.is_within_bounds()) {
            warn!(rule = ?coupon.rule, "Pricing with clamped coupon");
        }

        let quote = quote_cart(&cart, &self.catalog, &self.config);

        for line in &quote.unresolved {
            info!(
                cart_id = %cart.id,
                book_id = %line.book_id,
                reason = ?line.reason,
                "Cart line no longer available"
            );
        }

        debug!(
            cart_id = %cart.id,
            subtotal = quote.totals.subtotal.cents(),
            total = quote.totals.total.cents(),
            items = quote.totals.total_items,
            "Cart priced"
        );

        Ok(quote)
    }

    /// "Add $X more for free shipping", formatted, or `None` once it applies.
    pub fn free_shipping_hint(&self) -> StoreResult<Option<String>> {
        let quote = self.quote()?;
        if quote.totals.subtotal.is_zero() || !quote.requires_shipping {
            return Ok(None);
        }
        let remaining = free_shipping_remaining(quote.totals.subtotal, &self.config);
        if remaining.is_zero() {
            return Ok(None);
        }
        Ok(Some(format!(
            "Add {} more for free shipping",
            self.config.currency.format(remaining)
        )))
    }

    /// Reconciles stock, prices the cart, takes payment and settles the cart.
    ///
    /// Settling removes the purchased quantities and the coupon that was
    /// used. Anything added to the cart while the order was being placed is
    /// kept for the next order. A receipt is returned once payment succeeds,
    /// even if the cart could not be settled afterwards.
    ///
    /// ## Errors
    /// - `EmptyCart` when nothing can be bought
    /// - `UnavailableItems` while unresolved lines remain (the customer must
    ///   remove them first)
    /// - payment errors from [`PaymentOptions::process`]
    pub fn checkout(&self, method_id: &str, details: &PaymentDetails) -> StoreResult<CheckoutReceipt> {
        self.reconcile()?;
        let quote = self.quote()?;

        if quote.has_unresolved() {
            return Err(CoreError::UnavailableItems {
                count: quote.unresolved.len(),
            }
            .into());
        }

        if quote.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let payment = if quote.totals.total.is_zero() {
            debug!(cart_id = %self.cart_id(), "Nothing to charge");
            None
        } else {
            Some(self.payments.process(method_id, quote.totals.total, details)?)
        };

        self.settle(&quote);

        info!(
            cart_id = %self.cart_id(),
            total = %self.config.currency.format(quote.totals.total),
            transaction_id = payment.as_ref().map(|p| p.transaction_id.as_str()).unwrap_or("-"),
            "Checkout complete"
        );

        Ok(CheckoutReceipt {
            cart_id: self.cart_id().to_string(),
            quote,
            payment,
            placed_at: Utc::now(),
        })
    }

    /// Removes what `quote` charged for from the stored cart.
    fn settle(&self, quote: &Quote) {
        let settled = self.cart.update(|cart| {
            cart.remove_purchased(quote.lines.iter().map(|l| (&l.book_id, l.quantity)));
            if cart.coupon.as_ref().map(Coupon::clamped) == quote.coupon {
                cart.remove_coupon();
            }
            cart.line_count()
        });

        match settled {
            Ok(0) => info!(cart_id = %self.cart_id(), "Cart cleared"),
            Ok(remaining) => info!(
                cart_id = %self.cart_id(),
                remaining,
                "Lines added during checkout kept in cart"
            ),
            Err(e) => error!(
                cart_id = %self.cart_id(),
                error = %e,
                "Order paid but cart could not be settled"
            ),
        }
    }
}
