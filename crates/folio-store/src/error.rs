//! # Store Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Persistence   │  │     Domain              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Io             │  │  Core (cart rules)      │ │
//! │  │  ConfigLoad     │  │  Json           │  │  Coupon                 │ │
//! │  │  ConfigSave     │  │  LockPoisoned   │  │  Payment                │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use folio_core::{CoreError, CouponError, PaymentError};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cart document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A thread panicked while holding the cart lock.
    #[error("Cart lock poisoned")]
    LockPoisoned,

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::ConfigSaveFailed(err.to_string())
    }
}

impl From<folio_core::ValidationError> for StoreError {
    fn from(err: folio_core::ValidationError) -> Self {
        StoreError::Core(err.into())
    }
}

impl StoreError {
    /// True for failures the customer caused and can fix (bad code, no stock).
    /// A broken catalog document is the operator's problem, not the customer's.
    pub fn is_user_error(&self) -> bool {
        match self {
            StoreError::Core(CoreError::InvalidCatalog(_)) => false,
            StoreError::Core(_) | StoreError::Coupon(_) | StoreError::Payment(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_pass_through() {
        let err: StoreError = CouponError::Unknown("BOGUS".into()).into();
        assert_eq!(err.to_string(), "Invalid coupon code: BOGUS");
        assert!(err.is_user_error());

        let err: StoreError = CoreError::EmptyCart.into();
        assert_eq!(err.to_string(), "Cart is empty");
    }

    #[test]
    fn test_broken_catalog_is_not_a_user_error() {
        let err: StoreError = folio_core::InMemoryCatalog::from_json("[{")
            .unwrap_err()
            .into();
        assert!(matches!(err, StoreError::Core(CoreError::InvalidCatalog(_))));
        assert!(!err.is_user_error());

        let err: StoreError = CoreError::EmptyCart.into();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_toml_error_maps_to_config_load() {
        let err: StoreError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert!(matches!(err, StoreError::ConfigLoadFailed(_)));
        assert!(!err.is_user_error());
    }
}
