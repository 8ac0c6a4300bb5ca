//! # Domain Types
//!
//! Shared value types used throughout Folio.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │     BookId      │   │    TaxRate      │   │   PricingConfig     │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  opaque string  │   │  bps (u32)      │   │  tax_rate           │   │
//! │  │  "42", "isbn-x" │   │  800 = 8.00%    │   │  free_shipping_...  │   │
//! │  └─────────────────┘   └─────────────────┘   │  flat_shipping_fee  │   │
//! │                                              │  currency           │   │
//! │                                              └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Book Identifier
// =============================================================================

/// Identifier of a book in the catalog.
///
/// The upstream stores use both integer and string ids; integers are kept as
/// their decimal string so every store agrees on one representation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        BookId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        BookId(id.to_string())
    }
}

impl From<String> for BookId {
    fn from(id: String) -> Self {
        BookId(id)
    }
}

impl From<u64> for BookId {
    fn from(id: u64) -> Self {
        BookId(id.to_string())
    }
}

/// A sales-tax rate in basis points: `800` is 8.00 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// `8.25` becomes 825 bps. Anything not a positive finite number is 0.
    pub fn from_percentage(percent: f64) -> Self {
        if percent.is_finite() && percent > 0.0 {
            TaxRate((percent * 100.0).round() as u32)
        } else {
            TaxRate(0)
        }
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// For display.
    pub fn as_percent(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Configuration Types
// =============================================================================

/// Currency display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyConfig {
    /// Currency code (ISO 4217)
    pub code: String,

    /// Currency symbol (for display)
    pub symbol: String,

    /// Number of decimal places for the minor unit
    pub decimals: u8,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            decimals: 2,
        }
    }
}

impl CurrencyConfig {
    /// Formats an amount in minor units as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use folio_core::money::Money;
    /// use folio_core::types::CurrencyConfig;
    ///
    /// let usd = CurrencyConfig::default();
    /// assert_eq!(usd.format(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let magnitude = amount.cents().unsigned_abs();

        if self.decimals == 0 {
            return format!("{sign}{}{magnitude}", self.symbol);
        }

        let unit = 10_u64.pow(u32::from(self.decimals));
        format!(
            "{sign}{}{}.{:0width$}",
            self.symbol,
            magnitude / unit,
            magnitude % unit,
            width = usize::from(self.decimals),
        )
    }
}

/// Business constants the pricing engine runs with.
///
/// ## Default Values
/// - Tax: 8%
/// - Free shipping at or above $50.00
/// - Flat shipping fee $5.00 below the threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    pub tax_rate: TaxRate,
    pub free_shipping_threshold: Money,
    pub flat_shipping_fee: Money,
    pub currency: CurrencyConfig,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            tax_rate: TaxRate::default(),
            free_shipping_threshold: Money::from_cents(crate::DEFAULT_FREE_SHIPPING_THRESHOLD_CENTS),
            flat_shipping_fee: Money::from_cents(crate::DEFAULT_FLAT_SHIPPING_FEE_CENTS),
            currency: CurrencyConfig::default(),
        }
    }
}

impl PricingConfig {
    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn with_free_shipping_threshold(mut self, threshold: Money) -> Self {
        self.free_shipping_threshold = threshold;
        self
    }

    pub fn with_flat_shipping_fee(mut self, fee: Money) -> Self {
        self.flat_shipping_fee = fee;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
