//! # Logging
//!
//! Installs the global `tracing` subscriber for a host process.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=folio_store=trace` - Show trace for the store crate only
//! - Default: `info,folio_store=debug`

use tracing_subscriber::EnvFilter;

use crate::error::{StoreError, StoreResult};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,folio_store=debug";

/// Installs a formatting subscriber filtered by `RUST_LOG`.
///
/// Returns an error (instead of panicking) if a subscriber is already set,
/// so hosts and tests can call it more than once.
pub fn init() -> StoreResult<()> {
    init_with_default(DEFAULT_FILTER)
}

pub fn init_with_default(default_filter: &str) -> StoreResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| StoreError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| StoreError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let _ = init();
        assert!(matches!(init(), Err(StoreError::Logging(_))));
    }
}
