//! # Cart
//!
//! The shopping cart: ordered lines keyed by book id, plus at most one coupon.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Storefront Action        Cart Method             Change                │
//! │  ─────────────────        ───────────             ──────                │
//! │                                                                         │
//! │  "Add to cart" ─────────► add_item() ───────────► qty += n / push line  │
//! │  Quantity box ──────────► set_quantity() ───────► qty = n (≤0 removes)  │
//! │  Trash icon ────────────► remove_item() ────────► line removed          │
//! │  "Clear cart" ──────────► clear() ──────────────► lines + coupon gone   │
//! │  Coupon form ───────────► apply_coupon() ───────► replaces old coupon   │
//! │  Page load ─────────────► reconcile_stock() ────► clamp to inventory    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart holds ids and quantities only. Prices are looked up at pricing
//! time so a stale cart never charges a stale price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::coupon::Coupon;
use crate::error::{CoreError, CoreResult};
use crate::types::BookId;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// One (book, quantity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub book_id: BookId,
    /// Always ≥ 1 while the line is in a cart.
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn new(book_id: BookId, quantity: i64) -> Self {
        CartLine {
            book_id,
            quantity,
            added_at: Utc::now(),
        }
    }
}

/// Quantity change made by [`Cart::reconcile_stock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub book_id: BookId,
    pub requested: i64,
    /// New quantity; 0 means the line was removed.
    pub available: i64,
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `book_id` (adding the same book increases quantity)
/// - Every quantity is ≥ 1 (setting 0 or less removes the line)
/// - At most `MAX_CART_LINES` lines, each at most `MAX_ITEM_QUANTITY`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub coupon: Option<Coupon>,
    /// When the cart was created/last cleared
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    /// Creates a new empty cart with a fresh id.
    pub fn new() -> Self {
        Cart {
            id: Uuid::new_v4().to_string(),
            lines: Vec::new(),
            coupon: None,
            created_at: Utc::now(),
        }
    }

    /// Adds copies of a book, or increases the quantity of an existing line.
    ///
    /// ## Returns
    /// - `Ok(false)` when `quantity < 1` (no-op)
    /// - `Ok(true)` when the cart changed
    /// - `Err(QuantityTooLarge)` / `Err(CartTooLarge)` at the cart limits
    pub fn add_item(&mut self, book_id: impl Into<BookId>, quantity: i64) -> CoreResult<bool> {
        if quantity < 1 {
            return Ok(false);
        }
        let book_id = book_id.into();

        if let Some(line) = self.line_mut(&book_id) {
            let new_qty = line.quantity.saturating_add(quantity);
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(true);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::new(book_id, quantity));
        Ok(true)
    }

    /// Sets the exact quantity of a line already in the cart.
    ///
    /// ## Behavior
    /// - `quantity <= 0`: same as [`Cart::remove_item`]
    /// - book not in cart: no-op, returns `Ok(false)`
    pub fn set_quantity(&mut self, book_id: &BookId, quantity: i64) -> CoreResult<bool> {
        if quantity <= 0 {
            return Ok(self.remove_item(book_id));
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match self.line_mut(book_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes a line. Idempotent; returns whether anything was removed.
    pub fn remove_item(&mut self, book_id: &BookId) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|l| &l.book_id != book_id);
        self.lines.len() != initial_len
    }

    /// Empties the cart and drops the coupon.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.coupon = None;
        self.created_at = Utc::now();
    }

    /// Takes purchased copies out of the cart after a checkout.
    ///
    /// Only the given quantities are removed, so copies or lines added since
    /// the order was priced stay behind.
    pub fn remove_purchased<'a>(&mut self, purchased: impl IntoIterator<Item = (&'a BookId, i64)>) {
        for (book_id, quantity) in purchased {
            if let Some(line) = self.line_mut(book_id) {
                line.quantity = line.quantity.saturating_sub(quantity);
            }
        }

        self.lines.retain(|l| l.quantity > 0);
        if self.lines.is_empty() {
            self.created_at = Utc::now();
        }
    }

    /// Applies a coupon, returning the one it replaced.
    pub fn apply_coupon(&mut self, coupon: Coupon) -> Option<Coupon> {
        self.coupon.replace(coupon)
    }

    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        self.coupon.take()
    }

    /// Lowers quantities to what the catalog has in stock.
    ///
    /// Lines above tracked stock are clamped to it; lines whose book has no
    /// stock left are removed. Unknown and inactive books are left alone so
    /// pricing can report them as unavailable.
    pub fn reconcile_stock<C: Catalog + ?Sized>(&mut self, catalog: &C) -> Vec<StockAdjustment> {
        let mut adjustments = Vec::new();

        for line in &mut self.lines {
            let Some(stock) = catalog
                .lookup(&line.book_id)
                .filter(|e| e.is_active)
                .and_then(|e| e.stock)
            else {
                continue;
            };

            let available = stock.max(0);
            if line.quantity > available {
                adjustments.push(StockAdjustment {
                    book_id: line.book_id.clone(),
                    requested: line.quantity,
                    available,
                });
                line.quantity = available;
            }
        }

        self.lines.retain(|l| l.quantity > 0);
        adjustments
    }

    pub fn line(&self, book_id: &BookId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.book_id == book_id)
    }

    fn line_mut(&mut self, book_id: &BookId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.book_id == book_id)
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of copies across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
