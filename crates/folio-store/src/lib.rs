//! # folio-store: Persistence, Configuration and Checkout for Folio
//!
//! Wraps the pure engine in `folio-core` with the pieces a host process
//! needs: a cart storage port with memory and JSON-file adapters, a
//! serialised cart handle, TOML/env configuration, logging setup and the
//! [`CheckoutSession`] façade.
//!
//! ## Example Usage
//!
//! ```rust
//! use folio_core::catalog::{CatalogEntry, InMemoryCatalog};
//! use folio_core::{Coupon, CouponBook, Money};
//! use folio_store::{CheckoutSession, FolioConfig, MemoryCartStore, SharedCart};
//!
//! let catalog: InMemoryCatalog = vec![
//!     CatalogEntry::new("1", "Dune", Money::from_cents(1000)),
//!     CatalogEntry::new("2", "Emma", Money::from_cents(2000)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mut coupons = CouponBook::new();
//! coupons.insert("SAVE10", Coupon::percentage_bps(1000)).unwrap();
//!
//! let cart = SharedCart::create(MemoryCartStore::new()).unwrap();
//! let config = FolioConfig::default().pricing_config();
//! let session = CheckoutSession::new(cart, catalog, coupons, config);
//!
//! session.add_item("1", 2).unwrap();
//! session.add_item("2", 1).unwrap();
//! session.apply_coupon_code("save10").unwrap();
//!
//! let quote = session.quote().unwrap();
//! assert_eq!(quote.totals.total.cents(), 4420);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod store;

pub use config::FolioConfig;
pub use error::{StoreError, StoreResult};
pub use session::{CheckoutReceipt, CheckoutSession};
pub use store::{load_catalog, CartStore, JsonFileCartStore, MemoryCartStore, SharedCart};
