//! # Validation
//!
//! Checks applied where data enters Folio: catalog records, coupon codes,
//! customer emails, payment amounts and cart ids.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw input ──► validation.rs (reject, with field + reason)              │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │               pricing engine (clamps, never rejects)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use folio_core::validation::{validate_book_id, validate_coupon_code};
//!
//! assert!(validate_book_id("42").is_ok());
//! assert_eq!(validate_coupon_code("spring-sale").unwrap(), "SPRING-SALE");
//! ```

use crate::error::ValidationError;

pub type ValidationResult<T> = Result<T, ValidationError>;

const BOOK_ID_MAX: usize = 64;
const TITLE_MAX: usize = 300;
const COUPON_CODE_LEN: std::ops::RangeInclusive<usize> = 3..=32;

/// Trims `value` and fails with `Required` if nothing is left.
fn non_blank<'a>(field: &str, value: &'a str) -> ValidationResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required {
            field: field.to_string(),
        })
    } else {
        Ok(trimmed)
    }
}

fn bad_format(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Book ids are ISBNs, numeric ids or slugs: up to 64 letters, digits,
/// `-` or `_`.
///
/// ```rust
/// use folio_core::validation::validate_book_id;
///
/// assert!(validate_book_id("978-0132350884").is_ok());
/// assert!(validate_book_id("").is_err());
/// assert!(validate_book_id("has space").is_err());
/// ```
pub fn validate_book_id(id: &str) -> ValidationResult<()> {
    let id = non_blank("book_id", id)?;

    if id.len() > BOOK_ID_MAX {
        return Err(ValidationError::TooLong {
            field: "book_id".into(),
            max: BOOK_ID_MAX,
        });
    }

    let slug_char = |c: char| c.is_alphanumeric() || matches!(c, '-' | '_');
    if !id.chars().all(slug_char) {
        return Err(bad_format("book_id", "use letters, digits, '-' or '_'"));
    }

    Ok(())
}

pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = non_blank("title", title)?;
    if title.chars().count() > TITLE_MAX {
        return Err(ValidationError::TooLong {
            field: "title".into(),
            max: TITLE_MAX,
        });
    }
    Ok(())
}

/// Returns the canonical (trimmed, upper-case) form of a coupon code.
///
/// ```rust
/// use folio_core::validation::validate_coupon_code;
///
/// assert_eq!(validate_coupon_code(" save10 ").unwrap(), "SAVE10");
/// assert!(validate_coupon_code("x").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<String> {
    let code = non_blank("coupon code", code)?;

    if code.len() < *COUPON_CODE_LEN.start() {
        return Err(ValidationError::TooShort {
            field: "coupon code".into(),
            min: *COUPON_CODE_LEN.start(),
        });
    }
    if code.len() > *COUPON_CODE_LEN.end() {
        return Err(ValidationError::TooLong {
            field: "coupon code".into(),
            max: *COUPON_CODE_LEN.end(),
        });
    }
    if code.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '-')) {
        return Err(bad_format("coupon code", "use letters, digits or '-'"));
    }

    Ok(code.to_ascii_uppercase())
}

/// A loose shape check: `local@domain.tld`, exactly one `@`.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = non_blank("email", email)?;

    let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, _)| !host.is_empty())
            && !domain.ends_with('.')
    });

    if well_formed {
        Ok(())
    } else {
        Err(bad_format("email", "expected name@example.com"))
    }
}

/// Prices may be zero (free titles) but never negative.
///
/// ```rust
/// use folio_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents >= 0 {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field: "price".into(),
        min: 0,
        max: i64::MAX,
    })
}

pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents > 0 {
        return Ok(());
    }
    Err(ValidationError::MustBePositive {
        field: "payment amount".into(),
    })
}

/// Rates and percentages are 0..=10000 basis points.
pub fn validate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps <= 10_000 {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: 10_000,
    })
}

/// Cart ids double as file names, so only real UUIDs are accepted.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    let id = non_blank("id", id)?;
    uuid::Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| bad_format("id", "not a UUID"))
}
