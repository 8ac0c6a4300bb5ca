//! # Catalog Lookup
//!
//! The read-only contract the pricing engine uses to learn current prices,
//! and the join that turns cart lines into priced ("resolved") lines.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartLine { book_id, quantity }                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Catalog::lookup(book_id)                                               │
//! │       │                                                                 │
//! │       ├── None ──────────────► UnresolvedLine { reason: NotFound }      │
//! │       ├── inactive entry ────► UnresolvedLine { reason: Inactive }      │
//! │       └── entry ─────────────► ResolvedLine { unit_price, original, .. }│
//! │                                                                         │
//! │  Unresolved lines are reported, never priced and never fatal.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Disagreements
//! Stores record both the two prices and a discount percentage, and the
//! three do not always agree. The prices win: when an original price is
//! present the markdown is derived from `price` and `original_price`; the
//! percentage field is only consulted when no original price exists.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::book::{BookFormat, BookRecord};
use crate::cart::CartLine;
use crate::error::CoreResult;
use crate::money::{Money, BPS_SCALE};
use crate::types::BookId;

// =============================================================================
// Catalog Entry
// =============================================================================

/// What the catalog knows about one book at pricing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub book_id: BookId,
    pub title: String,
    /// Current selling price.
    pub price: Money,
    /// List price before markdown, if the store records one.
    pub original_price: Option<Money>,
    /// Recorded markdown percentage in basis points.
    pub discount_bps: Option<u32>,
    /// Units on hand; `None` means inventory is not tracked.
    pub stock: Option<i64>,
    pub is_active: bool,
    pub format: BookFormat,
}

impl CatalogEntry {
    /// Creates an active, untracked-stock, physical entry.
    pub fn new(book_id: impl Into<BookId>, title: impl Into<String>, price: Money) -> Self {
        CatalogEntry {
            book_id: book_id.into(),
            title: title.into(),
            price,
            original_price: None,
            discount_bps: None,
            stock: None,
            is_active: true,
            format: BookFormat::default(),
        }
    }

    pub fn with_original_price(mut self, original: Money) -> Self {
        self.original_price = Some(original);
        self
    }

    pub fn with_discount_bps(mut self, bps: u32) -> Self {
        self.discount_bps = Some(bps);
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_format(mut self, format: BookFormat) -> Self {
        self.format = format;
        self
    }

    /// Marks the entry as withdrawn from sale.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// List price used for comparison, never below the selling price.
    pub fn original_unit_price(&self) -> Money {
        match self.original_price {
            Some(original) if original > self.price => original,
            _ => self.price,
        }
    }

    /// Effective markdown in basis points.
    ///
    /// Derived from the two prices when an original price is recorded (at
    /// least 1 bps whenever the prices differ), otherwise taken from the
    /// recorded percentage, capped at 100%.
    pub fn markdown_bps(&self) -> u32 {
        match self.original_price {
            Some(original) if original > self.price && original.is_positive() => {
                let off = (original - self.price).cents() as i128 * BPS_SCALE;
                // Same bankers rounding as money values.
                let bps = Money::round_half_even(off, original.cents() as i128).cents();
                bps.clamp(1, 10_000) as u32
            }
            Some(_) => 0,
            None => self.discount_bps.unwrap_or(0).min(10_000),
        }
    }

    #[inline]
    pub fn is_on_sale(&self) -> bool {
        self.markdown_bps() > 0
    }

    /// Untracked inventory is always in stock.
    pub fn is_in_stock(&self) -> bool {
        self.stock.map_or(true, |s| s > 0)
    }

    /// Checks whether `quantity` copies can be sold.
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        self.stock.map_or(true, |s| s >= quantity)
    }
}

impl From<BookRecord> for CatalogEntry {
    fn from(record: BookRecord) -> Self {
        CatalogEntry {
            book_id: record.id,
            title: record.title,
            price: record.price,
            original_price: record.original_price,
            discount_bps: record.discount_bps,
            stock: record.stock,
            is_active: record.is_active,
            format: record.format,
        }
    }
}

// =============================================================================
// Catalog Contract
// =============================================================================

/// Read-only book lookup supplied by the host (database, REST cache, static list).
pub trait Catalog {
    fn lookup(&self, book_id: &BookId) -> Option<CatalogEntry>;
}

/// Any lookup function is a catalog.
impl<F> Catalog for F
where
    F: Fn(&BookId) -> Option<CatalogEntry>,
{
    fn lookup(&self, book_id: &BookId) -> Option<CatalogEntry> {
        self(book_id)
    }
}

/// Catalog held in memory, keyed by book id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: HashMap<BookId, CatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry, returning the previous one.
    pub fn insert(&mut self, entry: CatalogEntry) -> Option<CatalogEntry> {
        self.entries.insert(entry.book_id.clone(), entry)
    }

    pub fn remove(&mut self, book_id: &BookId) -> Option<CatalogEntry> {
        self.entries.remove(book_id)
    }

    pub fn get(&self, book_id: &BookId) -> Option<&CatalogEntry> {
        self.entries.get(book_id)
    }

    /// Adjusts tracked stock by `delta`, flooring at zero.
    ///
    /// Returns the new level, or `None` if the book is unknown or untracked.
    pub fn adjust_stock(&mut self, book_id: &BookId, delta: i64) -> Option<i64> {
        let entry = self.entries.get_mut(book_id)?;
        let stock = entry.stock.as_mut()?;
        *stock = (*stock + delta).max(0);
        Some(*stock)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a catalog from a JSON array of raw storefront records.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let records = crate::book::normalize_records(json)?;
        Ok(records.into_iter().map(CatalogEntry::from).collect())
    }
}

impl FromIterator<CatalogEntry> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

impl Catalog for InMemoryCatalog {
    fn lookup(&self, book_id: &BookId) -> Option<CatalogEntry> {
        self.entries.get(book_id).cloned()
    }
}

// =============================================================================
// Resolved / Unresolved Lines
// =============================================================================

/// A cart line joined with catalog prices.
///
/// ## Invariant
/// `unit_price <= original_unit_price`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLine {
    pub book_id: BookId,
    pub quantity: i64,
    pub unit_price: Money,
    pub original_unit_price: Money,
    /// Active markdown in basis points; 0 means no markdown.
    pub discount_bps: u32,
    pub format: BookFormat,
}

impl ResolvedLine {
    /// A line with no markdown: both prices equal `unit_price`.
    pub fn new(book_id: impl Into<BookId>, quantity: i64, unit_price: Money) -> Self {
        ResolvedLine {
            book_id: book_id.into(),
            quantity,
            unit_price,
            original_unit_price: unit_price,
            discount_bps: 0,
            format: BookFormat::default(),
        }
    }

    /// Sets the list price (raised to `unit_price` if lower).
    pub fn with_original_price(mut self, original: Money) -> Self {
        self.original_unit_price = original.max(self.unit_price);
        self
    }

    pub fn with_discount_bps(mut self, bps: u32) -> Self {
        self.discount_bps = bps;
        self
    }

    pub fn with_format(mut self, format: BookFormat) -> Self {
        self.format = format;
        self
    }

    /// Joins a cart quantity with a catalog entry.
    pub fn from_entry(entry: &CatalogEntry, quantity: i64) -> Self {
        ResolvedLine {
            book_id: entry.book_id.clone(),
            quantity,
            unit_price: entry.price,
            original_unit_price: entry.original_unit_price(),
            discount_bps: entry.markdown_bps(),
            format: entry.format,
        }
    }
}

/// Why a cart line could not be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The catalog has no such book.
    NotFound,
    /// The book exists but is withdrawn from sale.
    Inactive,
}

/// A cart line the UI should flag as "no longer available".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedLine {
    pub book_id: BookId,
    pub quantity: i64,
    pub reason: UnavailableReason,
}

/// Result of joining a cart against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub resolved: Vec<ResolvedLine>,
    pub unresolved: Vec<UnresolvedLine>,
}

/// Joins cart lines with the catalog, preserving cart order.
///
/// Lines with a non-positive quantity are dropped: they are removals that
/// should never have reached pricing.
pub fn resolve<C: Catalog + ?Sized>(lines: &[CartLine], catalog: &C) -> Resolution {
    let mut resolution = Resolution::default();

    for line in lines.iter().filter(|l| l.quantity > 0) {
        match catalog.lookup(&line.book_id) {
            Some(entry) if entry.is_active => {
                resolution
                    .resolved
                    .push(ResolvedLine::from_entry(&entry, line.quantity));
            }
            Some(_) => resolution.unresolved.push(UnresolvedLine {
                book_id: line.book_id.clone(),
                quantity: line.quantity,
                reason: UnavailableReason::Inactive,
            }),
            None => resolution.unresolved.push(UnresolvedLine {
                book_id: line.book_id.clone(),
                quantity: line.quantity,
                reason: UnavailableReason::NotFound,
            }),
        }
    }

    resolution
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: i64) -> CartLine {
        CartLine::new(BookId::new(id), quantity)
    }

    #[test]
    fn test_original_unit_price_never_below_price() {
        let entry = CatalogEntry::new("1", "A", Money::from_cents(1000))
            .with_original_price(Money::from_cents(800));
        assert_eq!(entry.original_unit_price(), Money::from_cents(1000));

        let entry = CatalogEntry::new("1", "A", Money::from_cents(1000));
        assert_eq!(entry.original_unit_price(), Money::from_cents(1000));
    }

    #[test]
    fn test_markdown_prefers_prices_over_percentage() {
        // Prices say 25% off, the percentage field says 10%.
        let entry = CatalogEntry::new("1", "A", Money::from_cents(750))
            .with_original_price(Money::from_cents(1000))
            .with_discount_bps(1000);
        assert_eq!(entry.markdown_bps(), 2500);

        // Prices equal: no markdown, whatever the field says.
        let entry = CatalogEntry::new("1", "A", Money::from_cents(1000))
            .with_original_price(Money::from_cents(1000))
            .with_discount_bps(1000);
        assert_eq!(entry.markdown_bps(), 0);
        assert!(!entry.is_on_sale());

        // No original price: the field is all we have.
        let entry = CatalogEntry::new("1", "A", Money::from_cents(900)).with_discount_bps(1000);
        assert_eq!(entry.markdown_bps(), 1000);
    }

    #[test]
    fn test_tiny_markdown_still_counts() {
        let entry = CatalogEntry::new("1", "A", Money::from_cents(999_999))
            .with_original_price(Money::from_cents(1_000_000));
        assert_eq!(entry.markdown_bps(), 1);
    }

    #[test]
    fn test_stock_checks() {
        let untracked = CatalogEntry::new("1", "A", Money::from_cents(100));
        assert!(untracked.is_in_stock());
        assert!(untracked.can_fulfil(1_000));

        let tracked = untracked.clone().with_stock(2);
        assert!(tracked.can_fulfil(2));
        assert!(!tracked.can_fulfil(3));
        assert!(!tracked.with_stock(0).is_in_stock());
    }

    #[test]
    fn test_resolve_reports_missing_and_inactive_lines() {
        let catalog: InMemoryCatalog = vec![
            CatalogEntry::new("1", "Dune", Money::from_cents(1000)),
            CatalogEntry::new("2", "Emma", Money::from_cents(500)).inactive(),
        ]
        .into_iter()
        .collect();

        let resolution = resolve(&[line("1", 1), line("2", 3), line("9", 2)], &catalog);

        assert_eq!(resolution.resolved.len(), 1);
        assert_eq!(resolution.resolved[0].book_id, BookId::new("1"));
        assert_eq!(
            resolution.unresolved,
            vec![
                UnresolvedLine {
                    book_id: BookId::new("2"),
                    quantity: 3,
                    reason: UnavailableReason::Inactive,
                },
                UnresolvedLine {
                    book_id: BookId::new("9"),
                    quantity: 2,
                    reason: UnavailableReason::NotFound,
                },
            ]
        );
    }

    #[test]
    fn test_resolve_drops_non_positive_quantities() {
        let catalog: InMemoryCatalog =
            std::iter::once(CatalogEntry::new("1", "Dune", Money::from_cents(1000))).collect();
        let mut zero = line("1", 1);
        zero.quantity = 0;

        let resolution = resolve(&[zero], &catalog);
        assert!(resolution.resolved.is_empty());
        assert!(resolution.unresolved.is_empty());
    }

    #[test]
    fn test_lookup_function_is_a_catalog() {
        let lookup = |id: &BookId| {
            (id.as_str() == "1").then(|| CatalogEntry::new("1", "Dune", Money::from_cents(1000)))
        };
        let resolution = resolve(&[line("1", 2), line("2", 1)], &lookup);
        assert_eq!(resolution.resolved.len(), 1);
        assert_eq!(resolution.unresolved.len(), 1);
    }

    #[test]
    fn test_adjust_stock() {
        let mut catalog: InMemoryCatalog = vec![
            CatalogEntry::new("1", "A", Money::from_cents(100)).with_stock(3),
            CatalogEntry::new("2", "B", Money::from_cents(100)),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.adjust_stock(&BookId::new("1"), -5), Some(0));
        assert_eq!(catalog.adjust_stock(&BookId::new("2"), -1), None);
        assert_eq!(catalog.adjust_stock(&BookId::new("9"), 1), None);
    }

    #[test]
    fn test_from_json() {
        let catalog = InMemoryCatalog::from_json(
            r#"[{"id": 1, "title": "A", "price": 12.5, "original_price": 15}]"#,
        )
        .unwrap();
        let entry = catalog.get(&BookId::new("1")).unwrap();
        assert_eq!(entry.price.cents(), 1250);
        assert_eq!(entry.original_unit_price().cents(), 1500);
        assert!(entry.is_on_sale());
    }
}
