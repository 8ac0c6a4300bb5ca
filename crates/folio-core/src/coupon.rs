//! # Coupons
//!
//! Discount rules and the coupon-code lookup contract.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Percentage { bps }     discount = subtotal × bps / 10000               │
//! │                         0 ≤ bps ≤ 10000                                 │
//! │                                                                         │
//! │  Fixed { amount }       discount = amount                               │
//! │                         amount ≥ 0                                      │
//! │                                                                         │
//! │  Both are computed against the SUBTOTAL only, never tax or shipping.   │
//! │  One coupon per cart: applying a new one replaces the old.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Out-of-range values are clamped, not rejected: `Coupon::clamped` is what
//! the engine prices with, and `Coupon::is_within_bounds` lets the caller
//! notice and log the correction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CouponError;
use crate::money::Money;
use crate::validation::validate_coupon_code;

/// 100% in basis points.
pub const MAX_PERCENTAGE_BPS: u32 = 10_000;

// =============================================================================
// Discount Rule
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountRule {
    /// Percentage of the subtotal, in basis points (1000 = 10%).
    Percentage { bps: u32 },
    /// Flat amount off.
    Fixed { amount: Money },
}

// =============================================================================
// Coupon
// =============================================================================

/// A validated coupon ready for pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: Option<String>,
    pub description: Option<String>,
    pub rule: DiscountRule,
}

impl Coupon {
    pub fn percentage_bps(bps: u32) -> Self {
        Coupon {
            code: None,
            description: None,
            rule: DiscountRule::Percentage { bps },
        }
    }

    /// Percentage coupon from a plain percentage such as `12.5`.
    ///
    /// Values outside 0-100 (and NaN) are clamped to the nearest bound.
    pub fn percentage(pct: f64) -> Self {
        let bps = if pct.is_nan() || pct <= 0.0 {
            0
        } else if pct >= 100.0 {
            MAX_PERCENTAGE_BPS
        } else {
            (pct * 100.0).round_ties_even() as u32
        };
        Coupon::percentage_bps(bps)
    }

    pub fn fixed(amount: Money) -> Self {
        Coupon {
            code: None,
            description: None,
            rule: DiscountRule::Fixed { amount },
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the coupon invariants (percentage ≤ 100%, fixed amount ≥ 0).
    pub fn is_within_bounds(&self) -> bool {
        match self.rule {
            DiscountRule::Percentage { bps } => bps <= MAX_PERCENTAGE_BPS,
            DiscountRule::Fixed { amount } => !amount.is_negative(),
        }
    }

    /// Returns the coupon with its value pulled back to the nearest valid bound.
    pub fn clamped(&self) -> Coupon {
        let rule = match self.rule {
            DiscountRule::Percentage { bps } => DiscountRule::Percentage {
                bps: bps.min(MAX_PERCENTAGE_BPS),
            },
            DiscountRule::Fixed { amount } => DiscountRule::Fixed {
                amount: amount.non_negative(),
            },
        };
        Coupon {
            rule,
            ..self.clone()
        }
    }

    /// Exact discount against `subtotal`, in "cents × 10000", after clamping.
    ///
    /// Left unrounded so the engine can round once at the end.
    pub fn scaled_discount(&self, subtotal: Money) -> i128 {
        match self.clamped().rule {
            DiscountRule::Percentage { bps } => subtotal.non_negative().scaled_bps(bps),
            DiscountRule::Fixed { amount } => amount.scaled(),
        }
    }
}

// =============================================================================
// Coupon Validation Contract
// =============================================================================

/// Turns a customer-entered code into a coupon, supplied by the host.
pub trait CouponValidator {
    fn validate(&self, code: &str) -> Result<Coupon, CouponError>;
}

/// A coupon definition in a [`CouponBook`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDefinition {
    pub coupon: Coupon,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// In-memory coupon table with case-insensitive codes.
#[derive(Debug, Clone, Default)]
pub struct CouponBook {
    definitions: HashMap<String, CouponDefinition>,
}

impl CouponBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an active, non-expiring coupon under `code`.
    ///
    /// The code is canonicalised (trimmed, upper-cased) and stored on the coupon.
    pub fn insert(&mut self, code: &str, coupon: Coupon) -> Result<(), CouponError> {
        self.insert_definition(
            code,
            CouponDefinition {
                coupon,
                active: true,
                expires_at: None,
            },
        )
    }

    pub fn insert_definition(
        &mut self,
        code: &str,
        mut definition: CouponDefinition,
    ) -> Result<(), CouponError> {
        let code = validate_coupon_code(code)?;
        definition.coupon.code = Some(code.clone());
        self.definitions.insert(code, definition);
        Ok(())
    }

    /// Deactivates a code without forgetting it. Returns false if unknown.
    pub fn deactivate(&mut self, code: &str) -> bool {
        let Ok(code) = validate_coupon_code(code) else {
            return false;
        };
        match self.definitions.get_mut(&code) {
            Some(definition) => {
                definition.active = false;
                true
            }
            None => false,
        }
    }

    /// Validates `code` as of `now`.
    pub fn validate_at(&self, code: &str, now: DateTime<Utc>) -> Result<Coupon, CouponError> {
        let code = validate_coupon_code(code)?;
        let definition = self
            .definitions
            .get(&code)
            .ok_or_else(|| CouponError::Unknown(code.clone()))?;

        if !definition.active {
            return Err(CouponError::Inactive(code));
        }

        if let Some(expires_at) = definition.expires_at {
            if now >= expires_at {
                return Err(CouponError::Expired(code));
            }
        }

        Ok(definition.coupon.clone())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl CouponValidator for CouponBook {
    fn validate(&self, code: &str) -> Result<Coupon, CouponError> {
        self.validate_at(code, Utc::now())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
