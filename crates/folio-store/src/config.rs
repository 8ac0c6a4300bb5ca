//! # Folio Configuration
//!
//! Pricing constants, currency display and storage locations.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FOLIO_TAX_RATE=8.25              (percent)                         │
//! │     FOLIO_FREE_SHIPPING_THRESHOLD_CENTS=5000                           │
//! │     FOLIO_FLAT_SHIPPING_FEE_CENTS=500                                  │
//! │     FOLIO_CURRENCY_CODE=USD                                            │
//! │     FOLIO_CART_DIR=/var/lib/folio/carts                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/folio/folio.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.folio.folio/folio.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     8% tax, free shipping from $50.00, $5.00 flat fee, USD             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [pricing]
//! tax_rate_bps = 800
//! free_shipping_threshold_cents = 5000
//! flat_shipping_fee_cents = 500
//!
//! [currency]
//! code = "USD"
//! symbol = "$"
//! decimals = 2
//!
//! [storage]
//! cart_dir = "/var/lib/folio/carts"
//! catalog_path = "/var/lib/folio/books.json"
//! ```

use std::path::PathBuf;

use folio_core::money::Money;
use folio_core::types::{CurrencyConfig, PricingConfig, TaxRate};
use folio_core::validation::validate_bps;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

const MAX_CURRENCY_DECIMALS: u8 = 4;

// =============================================================================
// Sections
// =============================================================================

/// `[pricing]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold_cents: i64,

    #[serde(default = "default_flat_shipping_fee")]
    pub flat_shipping_fee_cents: i64,
}

fn default_tax_rate_bps() -> u32 {
    folio_core::DEFAULT_TAX_RATE_BPS
}

fn default_free_shipping_threshold() -> i64 {
    folio_core::DEFAULT_FREE_SHIPPING_THRESHOLD_CENTS
}

fn default_flat_shipping_fee() -> i64 {
    folio_core::DEFAULT_FLAT_SHIPPING_FEE_CENTS
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            tax_rate_bps: default_tax_rate_bps(),
            free_shipping_threshold_cents: default_free_shipping_threshold(),
            flat_shipping_fee_cents: default_flat_shipping_fee(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for JSON cart documents. Defaults to the platform data dir.
    #[serde(default)]
    pub cart_dir: Option<PathBuf>,

    /// JSON array of book records to load as the catalog.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

// =============================================================================
// Folio Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl FolioConfig {
    /// Loads configuration from file and environment.
    ///
    /// Uses `config_path` if given, otherwise the platform default path. A
    /// missing file is not an error.
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading folio config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load folio config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Folio config saved");
        Ok(())
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_bps("tax_rate_bps", self.pricing.tax_rate_bps)?;

        if self.pricing.free_shipping_threshold_cents < 0 {
            return Err(StoreError::InvalidConfig(
                "free_shipping_threshold_cents must not be negative".into(),
            ));
        }

        if self.pricing.flat_shipping_fee_cents < 0 {
            return Err(StoreError::InvalidConfig(
                "flat_shipping_fee_cents must not be negative".into(),
            ));
        }

        let code = &self.currency.code;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(StoreError::InvalidConfig(format!(
                "currency code must be three upper-case letters, got: {}",
                code
            )));
        }

        if self.currency.decimals > MAX_CURRENCY_DECIMALS {
            return Err(StoreError::InvalidConfig(format!(
                "currency decimals must be at most {}",
                MAX_CURRENCY_DECIMALS
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `FOLIO_*` overrides read through `var`. Unparseable values are
    /// ignored with a warning.
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rate) = var("FOLIO_TAX_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(pct) => {
                    let bps = TaxRate::from_percentage(pct).bps();
                    debug!(tax_rate_bps = bps, "Overriding tax rate from environment");
                    self.pricing.tax_rate_bps = bps;
                }
                Err(_) => warn!(value = %rate, "Ignoring unparseable FOLIO_TAX_RATE"),
            }
        }

        if let Some(threshold) = var("FOLIO_FREE_SHIPPING_THRESHOLD_CENTS") {
            match threshold.trim().parse::<i64>() {
                Ok(cents) => self.pricing.free_shipping_threshold_cents = cents,
                Err(_) => warn!(
                    value = %threshold,
                    "Ignoring unparseable FOLIO_FREE_SHIPPING_THRESHOLD_CENTS"
                ),
            }
        }

        if let Some(fee) = var("FOLIO_FLAT_SHIPPING_FEE_CENTS") {
            match fee.trim().parse::<i64>() {
                Ok(cents) => self.pricing.flat_shipping_fee_cents = cents,
                Err(_) => warn!(value = %fee, "Ignoring unparseable FOLIO_FLAT_SHIPPING_FEE_CENTS"),
            }
        }

        if let Some(code) = var("FOLIO_CURRENCY_CODE") {
            debug!(code = %code, "Overriding currency code from environment");
            self.currency.code = code.trim().to_ascii_uppercase();
        }

        if let Some(dir) = var("FOLIO_CART_DIR") {
            debug!(dir = %dir, "Overriding cart directory from environment");
            self.storage.cart_dir = Some(PathBuf::from(dir));
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "folio", "folio")
            .map(|dirs| dirs.config_dir().join("folio.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The constants handed to the pricing engine.
    pub fn pricing_config(&self) -> PricingConfig {
        PricingConfig {
            tax_rate: TaxRate::from_bps(self.pricing.tax_rate_bps),
            free_shipping_threshold: Money::from_cents(self.pricing.free_shipping_threshold_cents),
            flat_shipping_fee: Money::from_cents(self.pricing.flat_shipping_fee_cents),
            currency: self.currency.clone(),
        }
    }

    /// Where cart documents live: the configured dir, else `<data dir>/carts`.
    pub fn cart_dir(&self) -> Option<PathBuf> {
        self.storage.cart_dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "folio", "folio")
                .map(|dirs| dirs.data_dir().join("carts"))
        })
    }

    /// Formats an amount with the configured currency.
    pub fn format_currency(&self, amount: Money) -> String {
        self.currency.format(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_engine_defaults() {
        let config = FolioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pricing_config(), PricingConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [pricing]
            tax_rate_bps = 825
            free_shipping_threshold_cents = 7500

            [currency]
            code = "EUR"
            symbol = "€"
            decimals = 2

            [storage]
            cart_dir = "/tmp/carts"
        "#;

        let config: FolioConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pricing.tax_rate_bps, 825);
        assert_eq!(config.pricing.free_shipping_threshold_cents, 7500);
        assert_eq!(config.pricing.flat_shipping_fee_cents, 500);
        assert_eq!(config.currency.code, "EUR");
        assert_eq!(config.cart_dir(), Some(PathBuf::from("/tmp/carts")));
        assert_eq!(config.format_currency(Money::from_cents(1999)), "€19.99");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = FolioConfig::default();
        config.apply_overrides(env(&[
            ("FOLIO_TAX_RATE", "8.25"),
            ("FOLIO_FREE_SHIPPING_THRESHOLD_CENTS", "10000"),
            ("FOLIO_FLAT_SHIPPING_FEE_CENTS", "not-a-number"),
            ("FOLIO_CURRENCY_CODE", "gbp"),
            ("FOLIO_CART_DIR", "/srv/carts"),
        ]));

        assert_eq!(config.pricing.tax_rate_bps, 825);
        assert_eq!(config.pricing.free_shipping_threshold_cents, 10_000);
        assert_eq!(config.pricing.flat_shipping_fee_cents, 500);
        assert_eq!(config.currency.code, "GBP");
        assert_eq!(config.storage.cart_dir, Some(PathBuf::from("/srv/carts")));
    }

    #[test]
    fn test_validation() {
        let mut config = FolioConfig::default();
        config.pricing.tax_rate_bps = 20_000;
        assert!(config.validate().is_err());

        let mut config = FolioConfig::default();
        config.pricing.flat_shipping_fee_cents = -1;
        assert!(matches!(config.validate(), Err(StoreError::InvalidConfig(_))));

        let mut config = FolioConfig::default();
        config.currency.code = "dollars".into();
        assert!(config.validate().is_err());

        let mut config = FolioConfig::default();
        config.currency.decimals = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("folio.toml");

        let mut config = FolioConfig::default();
        config.pricing.tax_rate_bps = 600;
        config.save(Some(path.clone())).unwrap();

        let loaded: FolioConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[pricing\ntax_rate_bps = ").unwrap();

        assert!(matches!(
            FolioConfig::load(Some(path.clone())),
            Err(StoreError::ConfigLoadFailed(_))
        ));
        assert!(FolioConfig::load_or_default(Some(path)).validate().is_ok());
    }
}
