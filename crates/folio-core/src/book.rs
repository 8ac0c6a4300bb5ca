//! # Book Records
//!
//! Canonical book schema plus the boundary adapter that normalises the
//! differently-shaped records the storefronts produce.
//!
//! ## Boundary Normalisation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Raw JSON (any storefront)           Canonical BookRecord               │
//! │  ─────────────────────────           ────────────────────               │
//! │  id: 42 | "42"                 ──►   id: BookId("42")                   │
//! │  price: 19.99                  ──►   price: Money(1999)                 │
//! │  original_price | originalPrice──►   original_price: Option<Money>      │
//! │  bookurl | bookUrl | book_url  ──►   book_url                           │
//! │  favorite | isFavorite         ──►   is_favorite                        │
//! │  format: "ebook" | "digital"   ──►   BookFormat::Ebook                  │
//! │                                                                         │
//! │  Normalisation happens ONCE here; nothing downstream looks at aliases. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::BookId;
use crate::validation::{validate_book_id, validate_price_cents, validate_title, ValidationResult};

/// Packaging weight added to every physical parcel.
pub const PACKAGING_WEIGHT_GRAMS: u32 = 500;

/// Parcels above two pounds use the heavy rate.
pub const HEAVY_PARCEL_GRAMS: u32 = 907;

const STANDARD_PARCEL_CENTS: i64 = 599;
const HEAVY_PARCEL_CENTS: i64 = 899;

// =============================================================================
// Book Format
// =============================================================================

/// How a book is delivered.
///
/// Capabilities are free functions that `match` on the variant
/// ([`requires_shipping`], [`shipping_weight_grams`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookFormat {
    /// Downloadable file.
    Ebook,
    /// Streamed or downloaded narration.
    Audiobook,
    /// Printed copy that ships in a parcel.
    Physical { weight_grams: u32 },
}

impl Default for BookFormat {
    fn default() -> Self {
        BookFormat::Physical { weight_grams: 0 }
    }
}

impl BookFormat {
    /// Maps the storefront's free-form format labels onto a variant.
    ///
    /// `digital`/`ebook` and `audio`/`audiobook` are recognised; anything
    /// else, including a missing label, is a physical copy.
    pub fn from_label(label: Option<&str>, weight_grams: u32) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("digital") | Some("ebook") => BookFormat::Ebook,
            Some("audio") | Some("audiobook") => BookFormat::Audiobook,
            _ => BookFormat::Physical { weight_grams },
        }
    }
}

/// Whether a copy of this format needs to be shipped.
pub fn requires_shipping(format: &BookFormat) -> bool {
    matches!(format, BookFormat::Physical { .. })
}

/// Parcel weight for one copy, including packaging. Digital formats weigh nothing.
pub fn shipping_weight_grams(format: &BookFormat) -> u32 {
    match format {
        BookFormat::Physical { weight_grams } => weight_grams.saturating_add(PACKAGING_WEIGHT_GRAMS),
        BookFormat::Ebook | BookFormat::Audiobook => 0,
    }
}

/// Whether one copy ships at the heavy parcel rate.
pub fn is_heavy(format: &BookFormat) -> bool {
    shipping_weight_grams(format) > HEAVY_PARCEL_GRAMS
}

/// Carrier cost for shipping one copy on its own.
///
/// This is the per-parcel estimate shown next to a physical listing; the
/// checkout total uses the flat fee from `PricingConfig` instead.
pub fn parcel_shipping_cost(format: &BookFormat) -> Money {
    if !requires_shipping(format) {
        Money::zero()
    } else if is_heavy(format) {
        Money::from_cents(HEAVY_PARCEL_CENTS)
    } else {
        Money::from_cents(STANDARD_PARCEL_CENTS)
    }
}

// =============================================================================
// Canonical Record
// =============================================================================

/// One book in the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    /// Current selling price.
    pub price: Money,
    /// List price before any markdown.
    pub original_price: Option<Money>,
    /// Markdown in basis points as recorded by the store (may disagree with the prices).
    pub discount_bps: Option<u32>,
    /// `None` when the store does not track inventory for this title.
    pub stock: Option<i64>,
    pub is_active: bool,
    pub format: BookFormat,
    pub cover_image_url: Option<String>,
    pub book_url: Option<String>,
    pub is_favorite: bool,
}

// =============================================================================
// Raw Record Adapter
// =============================================================================

/// Book ids arrive as JSON numbers from SQL-backed stores and as strings elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for BookId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => BookId::from(n),
            RawId::Text(s) => BookId::from(s.trim()),
        }
    }
}

/// A book record exactly as some storefront wrote it.
///
/// Prices are major-unit decimals; field names follow whichever convention
/// the writer used.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBookRecord {
    pub id: RawId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: f64,
    #[serde(default, alias = "original_price")]
    pub original_price: Option<f64>,
    #[serde(default, alias = "discount_percentage")]
    pub discount_percentage: Option<f64>,
    #[serde(default, alias = "stock_quantity")]
    pub stock: Option<i64>,
    #[serde(default, alias = "is_active", alias = "active")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, alias = "weight_grams")]
    pub weight_grams: Option<u32>,
    #[serde(default, alias = "cover_image_url", alias = "coverImage")]
    pub cover_image_url: Option<String>,
    #[serde(default, alias = "bookurl", alias = "book_url")]
    pub book_url: Option<String>,
    #[serde(default, alias = "favorite", alias = "is_favorite")]
    pub is_favorite: Option<bool>,
}

impl RawBookRecord {
    /// Converts into the canonical schema, validating as it goes.
    ///
    /// ## Rules
    /// - id and title must pass [`validate_book_id`] / [`validate_title`]
    /// - prices must be finite and non-negative
    /// - discount percentage must be within 0-100
    /// - negative stock is floored at zero
    pub fn normalize(self) -> ValidationResult<BookRecord> {
        let id = BookId::from(self.id);
        validate_book_id(id.as_str())?;
        validate_title(&self.title)?;

        let price = major_to_money("price", self.price)?;
        let original_price = self
            .original_price
            .map(|p| major_to_money("original_price", p))
            .transpose()?;

        let discount_bps = self
            .discount_percentage
            .map(|pct| {
                if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                    return Err(ValidationError::OutOfRange {
                        field: "discount_percentage".to_string(),
                        min: 0,
                        max: 100,
                    });
                }
                Ok((pct * 100.0).round_ties_even() as u32)
            })
            .transpose()?;

        Ok(BookRecord {
            id,
            title: self.title.trim().to_string(),
            author: non_empty(self.author),
            category: non_empty(self.category),
            price,
            original_price,
            discount_bps,
            stock: self.stock.map(|s| s.max(0)),
            is_active: self.is_active.unwrap_or(true),
            format: BookFormat::from_label(self.format.as_deref(), self.weight_grams.unwrap_or(0)),
            cover_image_url: non_empty(self.cover_image_url),
            book_url: non_empty(self.book_url),
            is_favorite: self.is_favorite.unwrap_or(false),
        })
    }
}

/// Parses a JSON array of raw records and normalises every entry.
///
/// Fails on the first record that does not validate.
pub fn normalize_records(json: &str) -> Result<Vec<BookRecord>, crate::error::CoreError> {
    let raw: Vec<RawBookRecord> = serde_json::from_str(json)?;
    raw.into_iter()
        .map(|r| r.normalize().map_err(Into::into))
        .collect()
}

fn major_to_money(field: &str, amount: f64) -> ValidationResult<Money> {
    let money = Money::from_major_f64(amount).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a finite number".to_string(),
    })?;
    validate_price_cents(money.cents()).map_err(|_| ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    })?;
    Ok(money)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_label() {
        assert_eq!(BookFormat::from_label(Some("digital"), 0), BookFormat::Ebook);
        assert_eq!(BookFormat::from_label(Some("EBOOK"), 0), BookFormat::Ebook);
        assert_eq!(BookFormat::from_label(Some("audio"), 0), BookFormat::Audiobook);
        assert_eq!(
            BookFormat::from_label(Some("hardcover"), 800),
            BookFormat::Physical { weight_grams: 800 }
        );
        assert_eq!(
            BookFormat::from_label(None, 0),
            BookFormat::Physical { weight_grams: 0 }
        );
    }

    #[test]
    fn test_shipping_capabilities() {
        let hardcover = BookFormat::Physical { weight_grams: 900 };
        assert!(requires_shipping(&hardcover));
        assert_eq!(shipping_weight_grams(&hardcover), 1400);

        assert!(!requires_shipping(&BookFormat::Ebook));
        assert_eq!(shipping_weight_grams(&BookFormat::Audiobook), 0);
    }

    #[test]
    fn test_parcel_rates() {
        // 300 g + 500 g packaging stays under two pounds.
        let paperback = BookFormat::Physical { weight_grams: 300 };
        assert!(!is_heavy(&paperback));
        assert_eq!(parcel_shipping_cost(&paperback).cents(), 599);

        let hardcover = BookFormat::Physical { weight_grams: 900 };
        assert!(is_heavy(&hardcover));
        assert_eq!(parcel_shipping_cost(&hardcover).cents(), 899);

        assert!(parcel_shipping_cost(&BookFormat::Ebook).is_zero());
    }

    #[test]
    fn test_normalize_snake_case_record() {
        let json = r#"{
            "id": 7,
            "title": "Clean Code",
            "author": "Robert C. Martin",
            "price": 29.99,
            "original_price": 39.99,
            "discount_percentage": 25,
            "stock_quantity": 4,
            "is_active": true,
            "cover_image_url": "https://img/7.jpg",
            "bookurl": "https://books/7",
            "favorite": true
        }"#;
        let raw: RawBookRecord = serde_json::from_str(json).unwrap();
        let book = raw.normalize().unwrap();

        assert_eq!(book.id, BookId::new("7"));
        assert_eq!(book.price, Money::from_cents(2999));
        assert_eq!(book.original_price, Some(Money::from_cents(3999)));
        assert_eq!(book.discount_bps, Some(2500));
        assert_eq!(book.stock, Some(4));
        assert_eq!(book.book_url.as_deref(), Some("https://books/7"));
        assert!(book.is_favorite);
    }

    #[test]
    fn test_normalize_camel_case_record() {
        let json = r#"{
            "id": "978-0201616224",
            "title": "  The Pragmatic Programmer ",
            "price": 45,
            "originalPrice": 45,
            "discountPercentage": 0,
            "isActive": false,
            "format": "ebook",
            "bookUrl": "",
            "isFavorite": false
        }"#;
        let book: BookRecord = serde_json::from_str::<RawBookRecord>(json)
            .unwrap()
            .normalize()
            .unwrap();

        assert_eq!(book.title, "The Pragmatic Programmer");
        assert!(!book.is_active);
        assert_eq!(book.format, BookFormat::Ebook);
        assert_eq!(book.book_url, None);
        assert_eq!(book.stock, None);
    }

    #[test]
    fn test_normalize_rejects_bad_values() {
        let negative: RawBookRecord =
            serde_json::from_str(r#"{"id": 1, "title": "X", "price": -1}"#).unwrap();
        assert!(matches!(
            negative.normalize(),
            Err(ValidationError::OutOfRange { .. })
        ));

        let pct: RawBookRecord = serde_json::from_str(
            r#"{"id": 1, "title": "X", "price": 1, "discount_percentage": 140}"#,
        )
        .unwrap();
        assert!(pct.normalize().is_err());

        let untitled: RawBookRecord =
            serde_json::from_str(r#"{"id": 1, "price": 1}"#).unwrap();
        assert!(matches!(
            untitled.normalize(),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_negative_stock_is_floored() {
        let raw: RawBookRecord =
            serde_json::from_str(r#"{"id": 3, "title": "Y", "price": 1, "stock": -2}"#).unwrap();
        assert_eq!(raw.normalize().unwrap().stock, Some(0));
    }

    #[test]
    fn test_normalize_records_array() {
        let json = r#"[
            {"id": 1, "title": "A", "price": 10},
            {"id": "2", "title": "B", "price": 20.5}
        ]"#;
        let records = normalize_records(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].price.cents(), 2050);

        assert!(normalize_records("not json").is_err());
    }
}
