//! # Error Types
//!
//! Domain-specific error types for folio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  folio-core errors (this file)                                         │
//! │  ├── CoreError        - Cart and checkout rule violations              │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── CouponError      - Coupon code lookups                            │
//! │  └── PaymentError     - Payment detail validation                      │
//! │                                                                         │
//! │  folio-store errors (separate crate)                                   │
//! │  └── StoreError       - Persistence and configuration failures         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → host application     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What is NOT an error
//! The pricing engine never fails. A catalog miss becomes an
//! `UnresolvedLine`, an out-of-range coupon is clamped, a non-positive
//! quantity is dropped.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and checkout rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Book id is not in the catalog.
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Book exists but is no longer offered (soft delete).
    #[error("Book is no longer available: {0}")]
    BookUnavailable(String),

    /// The cart would hold more copies than the catalog has left.
    ///
    /// ```text
    /// add_item("42", 5) ─► stock = Some(3) ─► InsufficientStock { 3, 5 }
    ///                                          └─► "Only 3 left of 42"
    /// ```
    #[error("Only {available} left of book {book_id} ({requested} requested)")]
    InsufficientStock {
        book_id: String,
        available: i64,
        requested: i64,
    },

    /// Cart has reached the maximum number of distinct lines.
    #[error("A cart holds at most {max} different books")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} is above the per-book limit of {max}")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Checkout attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout attempted while some lines can no longer be priced.
    #[error("{count} item(s) in the cart are no longer available")]
    UnavailableItems { count: usize },

    /// Catalog document is not a JSON array of book records.
    #[error("Invalid catalog document: {0}")]
    InvalidCatalog(#[from] serde_json::Error),

    /// Payment step failed.
    #[error("Payment failed: {0}")]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// A rejected input field.
///
/// Used for early validation at the system boundary before business logic runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} needs at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} allows at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Coupon Error
// =============================================================================

/// Failures of a coupon code lookup.
///
/// Raised by a `CouponValidator`, never by the pricing engine: the engine
/// only receives already-validated coupons.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    #[error("Invalid coupon code: {0}")]
    Unknown(String),

    #[error("Coupon {0} is no longer active")]
    Inactive(String),

    #[error("Coupon {0} has expired")]
    Expired(String),

    #[error("Coupon code rejected: {0}")]
    Malformed(#[from] ValidationError),
}

// =============================================================================
// Payment Error
// =============================================================================

/// Payment validation and processing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// Details fail the method's checks (short card number, bad routing, ...).
    #[error("Invalid {method} details: {reason}")]
    InvalidDetails { method: String, reason: String },

    /// Details were supplied for a different method than the one selected.
    #[error("Payment details do not match method {method}")]
    DetailsMismatch { method: String },

    /// Selected method is switched off.
    #[error("Payment method {0} is disabled")]
    Disabled(String),

    /// Unknown method id from the host.
    #[error("Payment method '{0}' not found")]
    UnknownMethod(String),

    #[error("Invalid payment amount: {reason}")]
    InvalidAmount { reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
