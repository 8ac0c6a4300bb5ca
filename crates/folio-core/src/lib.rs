//! # folio-core: Pure Cart and Pricing Logic for Folio
//!
//! Everything a bookstore checkout computes, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Folio Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Storefront (REST handlers, SPA, CLI ...)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 folio-store (I/O edge)                          │   │
//! │  │   CartStore, SharedCart, FolioConfig, CheckoutSession, logging  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ folio-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │ catalog │ │  cart   │ │ coupon  │ │ pricing │  │   │
//! │  │   │  Money  │ │ Catalog │ │  Cart   │ │ Coupon  │ │ Totals  │  │   │
//! │  │   │ TaxRate │ │ resolve │ │CartLine │ │Validator│ │  Quote  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and bankers rounding
//! - [`types`] - Identifiers, tax rate, pricing configuration
//! - [`book`] - Book formats and boundary normalisation of raw records
//! - [`catalog`] - Catalog lookup contract and cart-line resolution
//! - [`cart`] - Cart mutation API
//! - [`coupon`] - Discount rules and coupon validation
//! - [`pricing`] - The pricing engine
//! - [`payment`] - Payment methods
//! - [`user`] - Roles and access rules
//! - [`error`], [`validation`]
//!
//! ## Example Usage
//!
//! ```rust
//! use folio_core::catalog::{CatalogEntry, InMemoryCatalog};
//! use folio_core::pricing::quote_cart;
//! use folio_core::{Cart, Money, PricingConfig};
//!
//! let catalog: InMemoryCatalog = vec![
//!     CatalogEntry::new("1", "Dune", Money::from_cents(1000)),
//!     CatalogEntry::new("2", "Emma", Money::from_cents(2000)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mut cart = Cart::new();
//! cart.add_item("1", 2).unwrap();
//! cart.add_item("2", 1).unwrap();
//!
//! let quote = quote_cart(&cart, &catalog, &PricingConfig::default());
//! assert_eq!(quote.totals.subtotal.cents(), 4000);
//! assert_eq!(quote.totals.total.cents(), 4820); // + 8% tax + $5 shipping
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod book;
pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod error;
pub mod money;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod user;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, StockAdjustment};
pub use catalog::{Catalog, CatalogEntry, InMemoryCatalog, ResolvedLine, UnresolvedLine};
pub use coupon::{Coupon, CouponBook, CouponValidator, DiscountRule};
pub use error::{CoreError, CoreResult, CouponError, PaymentError, ValidationError};
pub use money::Money;
pub use pricing::{compute_totals, quote, Quote, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default sales tax: 8%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 800;

/// Subtotal at or above which shipping is free: $50.00.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD_CENTS: i64 = 5000;

/// Shipping charged below the threshold: $5.00.
pub const DEFAULT_FLAT_SHIPPING_FEE_CENTS: i64 = 500;

/// Maximum distinct lines in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps cart documents small.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
