//! # Payment Methods
//!
//! Checkout payment options as a tagged enum with one free function per
//! capability: [`processing_fee`], [`processing_time`], [`validate_payment`],
//! [`process_payment`].
//!
//! ## Methods
//! ```text
//! ┌──────────────────┬───────────┬────────────────────┬──────────────────────┐
//! │ Method           │ Fee       │ Processing time    │ Required details     │
//! ├──────────────────┼───────────┼────────────────────┼──────────────────────┤
//! │ credit_card      │ $2.50     │ Immediate          │ number ≥ 13, expiry, │
//! │                  │           │                    │ cvv ≥ 3              │
//! │ paypal           │ $0.00     │ 1-2 business days  │ email                │
//! │ bank_transfer    │ $6.75     │ 3-5 business days  │ account ≥ 8,         │
//! │                  │           │                    │ routing = 9          │
//! │ crypto           │ $0.00     │ 10-30 minutes      │ BTC/ETH/LTC/USDC,    │
//! │                  │           │                    │ wallet ≥ 26          │
//! └──────────────────┴───────────┴────────────────────┴──────────────────────┘
//! ```
//!
//! Nothing here talks to a payment processor; `process_payment` validates
//! and issues the receipt the host records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::PaymentError;
use crate::money::Money;
use crate::validation::{validate_email, validate_payment_amount};

/// Coins accepted for crypto payments.
pub const SUPPORTED_COINS: [&str; 4] = ["BTC", "ETH", "LTC", "USDC"];

const MIN_CARD_DIGITS: usize = 13;
const MIN_CVV_DIGITS: usize = 3;
const MIN_ACCOUNT_DIGITS: usize = 8;
const ROUTING_DIGITS: usize = 9;
const MIN_WALLET_LENGTH: usize = 26;

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    #[serde(rename = "paypal")]
    PayPal,
    BankTransfer,
    Crypto,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CreditCard,
        PaymentMethod::PayPal,
        PaymentMethod::BankTransfer,
        PaymentMethod::Crypto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::PayPal => "paypal",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Crypto => "crypto",
        }
    }

    /// Name shown at checkout.
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Crypto => "Cryptocurrency",
        }
    }

    fn transaction_prefix(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CC",
            PaymentMethod::PayPal => "PP",
            PaymentMethod::BankTransfer => "BT",
            PaymentMethod::Crypto => "CR",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts both `snake_case` and the storefront's `camelCase` ids.
impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "credit_card" | "creditCard" => Ok(PaymentMethod::CreditCard),
            "paypal" | "payPal" => Ok(PaymentMethod::PayPal),
            "bank_transfer" | "bankTransfer" => Ok(PaymentMethod::BankTransfer),
            "crypto" => Ok(PaymentMethod::Crypto),
            other => Err(PaymentError::UnknownMethod(other.to_string())),
        }
    }
}

/// Flat fee the store adds for the method.
pub fn processing_fee(method: PaymentMethod) -> Money {
    match method {
        PaymentMethod::CreditCard => Money::from_cents(250),
        PaymentMethod::BankTransfer => Money::from_cents(675),
        PaymentMethod::PayPal | PaymentMethod::Crypto => Money::zero(),
    }
}

pub fn processing_time(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::CreditCard => "Immediate",
        PaymentMethod::PayPal => "1-2 business days",
        PaymentMethod::BankTransfer => "3-5 business days",
        PaymentMethod::Crypto => "10-30 minutes",
    }
}

// =============================================================================
// Payment Details
// =============================================================================

/// What the customer typed into the payment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentDetails {
    CreditCard {
        card_number: String,
        expiry_date: String,
        cvv: String,
        cardholder_name: Option<String>,
    },
    #[serde(rename = "paypal")]
    PayPal { email: String },
    BankTransfer {
        account_number: String,
        routing_number: String,
        account_holder_name: Option<String>,
    },
    Crypto { coin: String, wallet_address: String },
}

impl PaymentDetails {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::CreditCard { .. } => PaymentMethod::CreditCard,
            PaymentDetails::PayPal { .. } => PaymentMethod::PayPal,
            PaymentDetails::BankTransfer { .. } => PaymentMethod::BankTransfer,
            PaymentDetails::Crypto { .. } => PaymentMethod::Crypto,
        }
    }
}

/// Digits in `value`, ignoring spaces and dashes. `None` if anything else appears.
fn digit_count(value: &str) -> Option<usize> {
    let mut count = 0;
    for c in value.chars() {
        match c {
            '0'..='9' => count += 1,
            ' ' | '-' => {}
            _ => return None,
        }
    }
    Some(count)
}

fn invalid(method: PaymentMethod, reason: &str) -> PaymentError {
    PaymentError::InvalidDetails {
        method: method.as_str().to_string(),
        reason: reason.to_string(),
    }
}

/// Checks the details against the rules for their method.
pub fn validate_payment(details: &PaymentDetails) -> Result<(), PaymentError> {
    let method = details.method();

    match details {
        PaymentDetails::CreditCard {
            card_number,
            expiry_date,
            cvv,
            ..
        } => {
            if !digit_count(card_number).is_some_and(|n| n >= MIN_CARD_DIGITS) {
                return Err(invalid(method, "card number must have at least 13 digits"));
            }
            if expiry_date.trim().is_empty() {
                return Err(invalid(method, "expiry date is required"));
            }
            if !cvv.chars().all(|c| c.is_ascii_digit()) || cvv.len() < MIN_CVV_DIGITS {
                return Err(invalid(method, "cvv must have at least 3 digits"));
            }
        }
        PaymentDetails::PayPal { email } => {
            validate_email(email).map_err(|e| invalid(method, &e.to_string()))?;
        }
        PaymentDetails::BankTransfer {
            account_number,
            routing_number,
            ..
        } => {
            if !digit_count(account_number).is_some_and(|n| n >= MIN_ACCOUNT_DIGITS) {
                return Err(invalid(method, "account number must have at least 8 digits"));
            }
            if digit_count(routing_number) != Some(ROUTING_DIGITS) {
                return Err(invalid(method, "routing number must have exactly 9 digits"));
            }
        }
        PaymentDetails::Crypto {
            coin,
            wallet_address,
        } => {
            if !SUPPORTED_COINS.contains(&coin.as_str()) {
                return Err(invalid(method, "coin must be one of BTC, ETH, LTC, USDC"));
            }
            if wallet_address.trim().len() < MIN_WALLET_LENGTH {
                return Err(invalid(method, "wallet address is too short"));
            }
        }
    }

    Ok(())
}

// =============================================================================
// Processing
// =============================================================================

/// Proof of a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// `CC_`/`PP_`/`BT_`/`CR_` followed by a UUID.
    pub transaction_id: String,
    pub method: PaymentMethod,
    /// Method name for the receipt, e.g. "Cryptocurrency (ETH)".
    pub method_label: String,
    /// Order total.
    pub amount: Money,
    pub fee: Money,
    /// `amount + fee`.
    pub charged: Money,
    pub processing_time: String,
    #[ts(as = "String")]
    pub processed_at: DateTime<Utc>,
}

/// Validates the details and issues a receipt for `amount`.
pub fn process_payment(amount: Money, details: &PaymentDetails) -> Result<PaymentReceipt, PaymentError> {
    validate_payment_amount(amount.cents()).map_err(|e| PaymentError::InvalidAmount {
        reason: e.to_string(),
    })?;
    validate_payment(details)?;

    let method = details.method();
    let fee = processing_fee(method);
    let method_label = match details {
        PaymentDetails::Crypto { coin, .. } => format!("{} ({})", method.display_name(), coin),
        _ => method.display_name().to_string(),
    };

    Ok(PaymentReceipt {
        transaction_id: format!("{}_{}", method.transaction_prefix(), Uuid::new_v4().simple()),
        method,
        method_label,
        amount,
        fee,
        charged: amount + fee,
        processing_time: processing_time(method).to_string(),
        processed_at: Utc::now(),
    })
}

/// Which methods the store currently offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOptions {
    enabled: Vec<PaymentMethod>,
}

impl Default for PaymentOptions {
    fn default() -> Self {
        PaymentOptions {
            enabled: PaymentMethod::ALL.to_vec(),
        }
    }
}

/// One entry of the checkout's method picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodInfo {
    pub id: PaymentMethod,
    pub name: String,
    pub processing_fee: Money,
    pub processing_time: String,
}

impl PaymentOptions {
    pub fn disable(&mut self, method: PaymentMethod) {
        self.enabled.retain(|m| *m != method);
    }

    pub fn enable(&mut self, method: PaymentMethod) {
        if !self.enabled.contains(&method) {
            self.enabled.push(method);
        }
    }

    pub fn is_enabled(&self, method: PaymentMethod) -> bool {
        self.enabled.contains(&method)
    }

    /// Enabled methods in picker order.
    pub fn available(&self) -> Vec<PaymentMethodInfo> {
        PaymentMethod::ALL
            .iter()
            .filter(|m| self.is_enabled(**m))
            .map(|&m| PaymentMethodInfo {
                id: m,
                name: m.display_name().to_string(),
                processing_fee: processing_fee(m),
                processing_time: processing_time(m).to_string(),
            })
            .collect()
    }

    /// Processes a payment for the method the customer picked by id.
    ///
    /// ## Errors
    /// - `UnknownMethod` for an unrecognised id
    /// - `Disabled` when the method is switched off
    /// - `DetailsMismatch` when `details` belong to another method
    pub fn process(
        &self,
        method_id: &str,
        amount: Money,
        details: &PaymentDetails,
    ) -> Result<PaymentReceipt, PaymentError> {
        let method: PaymentMethod = method_id.parse()?;

        if !self.is_enabled(method) {
            return Err(PaymentError::Disabled(method.as_str().to_string()));
        }

        if details.method() != method {
            return Err(PaymentError::DetailsMismatch {
                method: method.as_str().to_string(),
            });
        }

        process_payment(amount, details)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
