//! # Pricing Engine
//!
//! Turns resolved cart lines plus an optional coupon into checkout totals.
//! Pure: no I/O, no state, same inputs give the same `Totals`.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. effective = discount_bps > 0 ? unit_price : original_unit_price     │
//! │  2. subtotal  = Σ effective × quantity                                  │
//! │  3. items     = Σ quantity                                              │
//! │  4. tax       = subtotal × tax_rate                                     │
//! │  5. shipping  = 0 if subtotal == 0 or subtotal ≥ threshold, else fee    │
//! │  6. discount  = coupon against subtotal (never tax or shipping)         │
//! │  7. total     = max(0, subtotal + tax + shipping − discount)            │
//! │  8. round half-to-even to cents, ONCE, at the end                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 4-7 are carried exactly as "cents × 10000" integers, so `total` is
//! rounded from the exact sum and can differ by a cent from adding up the
//! rounded components.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::book::{requires_shipping, shipping_weight_grams, BookFormat};
use crate::cart::{Cart, CartLine};
use crate::catalog::{resolve, Catalog, ResolvedLine, UnresolvedLine};
use crate::coupon::Coupon;
use crate::money::{Money, BPS_SCALE};
use crate::types::{BookId, PricingConfig};

// =============================================================================
// Totals
// =============================================================================

/// Checkout totals. Every amount is ≥ 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    /// Coupon value as computed, even when it exceeds what it can take off.
    pub discount: Money,
    pub total: Money,
    pub total_items: i64,
}

/// Price one copy of the line sells for.
///
/// A line with an active markdown sells at `unit_price`; otherwise the list
/// price applies.
pub fn effective_unit_price(line: &ResolvedLine) -> Money {
    if line.discount_bps > 0 {
        line.unit_price
    } else {
        line.original_unit_price
    }
}

/// Computes the totals for already-resolved lines.
///
/// Never fails. Lines with a non-positive quantity contribute nothing,
/// negative prices count as zero, and an out-of-range coupon is clamped.
pub fn compute_totals(
    lines: &[ResolvedLine],
    coupon: Option<&Coupon>,
    config: &PricingConfig,
) -> Totals {
    let mut subtotal_cents: i128 = 0;
    let mut total_items: i64 = 0;

    for line in lines.iter().filter(|l| l.quantity > 0) {
        let unit = effective_unit_price(line).non_negative();
        subtotal_cents += unit.cents() as i128 * line.quantity as i128;
        total_items = total_items.saturating_add(line.quantity);
    }

    let subtotal = Money::from_cents(i64::try_from(subtotal_cents).unwrap_or(i64::MAX));

    let tax_scaled = subtotal.scaled_bps(config.tax_rate.bps());

    let shipping = if subtotal.is_zero() || subtotal >= config.free_shipping_threshold {
        Money::zero()
    } else {
        config.flat_shipping_fee.non_negative()
    };

    let discount_scaled = coupon.map_or(0, |c| c.scaled_discount(subtotal));

    let total_scaled =
        (subtotal.scaled() + tax_scaled + shipping.scaled() - discount_scaled).max(0);

    Totals {
        subtotal,
        tax: subtotal.tax_at(config.tax_rate),
        shipping,
        discount: Money::round_half_even(discount_scaled, BPS_SCALE),
        total: Money::round_half_even(total_scaled, BPS_SCALE),
        total_items,
    }
}

// =============================================================================
// Quote
// =============================================================================

/// A resolved line with its extended price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub book_id: BookId,
    pub quantity: i64,
    pub unit_price: Money,
    pub original_unit_price: Money,
    /// Effective unit price × quantity.
    pub line_total: Money,
    pub format: BookFormat,
}

/// Everything a cart page needs: priced lines, lines to flag, totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub lines: Vec<PricedLine>,
    /// Lines shown as "no longer available"; excluded from the totals.
    pub unresolved: Vec<UnresolvedLine>,
    pub totals: Totals,
    /// Coupon as priced (after clamping).
    pub coupon: Option<Coupon>,
    /// Markdown savings against list prices.
    pub savings: Money,
    pub requires_shipping: bool,
    pub shipping_weight_grams: u64,
}

impl Quote {
    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

/// Resolves `cart_lines` against `catalog` and prices the result.
pub fn quote<C: Catalog + ?Sized>(
    cart_lines: &[CartLine],
    catalog: &C,
    coupon: Option<&Coupon>,
    config: &PricingConfig,
) -> Quote {
    let resolution = resolve(cart_lines, catalog);
    let totals = compute_totals(&resolution.resolved, coupon, config);

    let mut savings = Money::zero();
    let mut weight: u64 = 0;
    let mut ships = false;

    let lines = resolution
        .resolved
        .iter()
        .map(|line| {
            let effective = effective_unit_price(line);
            savings += (line.original_unit_price - effective)
                .non_negative()
                .multiply_quantity(line.quantity);
            if requires_shipping(&line.format) {
                ships = true;
                let grams = shipping_weight_grams(&line.format) as u64;
                weight = weight.saturating_add(grams.saturating_mul(line.quantity as u64));
            }
            PricedLine {
                book_id: line.book_id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                original_unit_price: line.original_unit_price,
                line_total: effective.multiply_quantity(line.quantity),
                format: line.format,
            }
        })
        .collect();

    Quote {
        lines,
        unresolved: resolution.unresolved,
        totals,
        coupon: coupon.map(Coupon::clamped),
        savings,
        requires_shipping: ships,
        shipping_weight_grams: weight,
    }
}

/// Quotes a cart with its own coupon.
pub fn quote_cart<C: Catalog + ?Sized>(cart: &Cart, catalog: &C, config: &PricingConfig) -> Quote {
    quote(&cart.lines, catalog, cart.coupon.as_ref(), config)
}

// =============================================================================
// Free Shipping Progress
// =============================================================================

/// How much more the customer must add to qualify for free shipping.
pub fn free_shipping_remaining(subtotal: Money, config: &PricingConfig) -> Money {
    (config.free_shipping_threshold - subtotal).non_negative()
}

/// Progress towards the free-shipping threshold, 0-10000 bps.
pub fn free_shipping_progress_bps(subtotal: Money, config: &PricingConfig) -> u32 {
    let threshold = config.free_shipping_threshold.cents();
    if threshold <= 0 {
        return 10_000;
    }
    let progress = subtotal.non_negative().cents() as i128 * BPS_SCALE / threshold as i128;
    progress.min(10_000) as u32
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, InMemoryCatalog, UnavailableReason};
    use crate::types::TaxRate;

    fn line(id: &str, cents: i64, qty: i64) -> ResolvedLine {
        ResolvedLine::new(id, qty, Money::from_cents(cents))
    }

    fn two_lines() -> Vec<ResolvedLine> {
        vec![line("1", 1000, 2), line("2", 2000, 1)]
    }

    fn config() -> PricingConfig {
        PricingConfig::default()
    }

    #[test]
    fn test_two_lines_no_coupon() {
        let totals = compute_totals(&two_lines(), None, &config());

        assert_eq!(totals.subtotal.cents(), 4000);
        assert_eq!(totals.tax.cents(), 320);
        assert_eq!(totals.shipping.cents(), 500);
        assert_eq!(totals.discount.cents(), 0);
        assert_eq!(totals.total.cents(), 4820);
        assert_eq!(totals.total_items, 3);
    }

    #[test]
    fn test_free_shipping_threshold_met() {
        let mut lines = two_lines();
        lines.push(line("3", 1500, 1));
        let totals = compute_totals(&lines, None, &config());

        assert_eq!(totals.subtotal.cents(), 5500);
        assert_eq!(totals.shipping.cents(), 0);
        assert_eq!(totals.tax.cents(), 440);
        assert_eq!(totals.total.cents(), 5940);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let totals = compute_totals(&[line("1", 5000, 1)], None, &config());
        assert!(totals.shipping.is_zero());
    }

    #[test]
    fn test_percentage_coupon() {
        let coupon = Coupon::percentage_bps(1000);
        let totals = compute_totals(&two_lines(), Some(&coupon), &config());

        assert_eq!(totals.discount.cents(), 400);
        assert_eq!(totals.total.cents(), 4420);
    }

    #[test]
    fn test_fixed_coupon_larger_than_order() {
        let coupon = Coupon::fixed(Money::from_cents(10_000));
        let totals = compute_totals(&[line("1", 1000, 1)], Some(&coupon), &config());

        assert_eq!(totals.subtotal.cents(), 1000);
        assert_eq!(totals.tax.cents(), 80);
        assert_eq!(totals.shipping.cents(), 500);
        assert_eq!(totals.discount.cents(), 10_000);
        assert_eq!(totals.total.cents(), 0);
    }

    #[test]
    fn test_oversized_percentage_is_clamped() {
        let coupon = Coupon::percentage_bps(15_000);
        let totals = compute_totals(&[line("1", 10_000, 1)], Some(&coupon), &config());

        assert_eq!(totals.discount.cents(), 10_000);
        assert_eq!(totals.total.cents(), 800);
    }

    #[test]
    fn test_negative_fixed_coupon_is_ignored() {
        let coupon = Coupon::fixed(Money::from_cents(-500));
        let with = compute_totals(&two_lines(), Some(&coupon), &config());
        let without = compute_totals(&two_lines(), None, &config());

        assert_eq!(with, without);
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let totals = compute_totals(&[], None, &config());
        assert_eq!(totals, Totals::default());

        // A coupon does not change that.
        let coupon = Coupon::fixed(Money::from_cents(500));
        let totals = compute_totals(&[], Some(&coupon), &config());
        assert!(totals.total.is_zero());
        assert!(totals.shipping.is_zero());
    }

    #[test]
    fn test_non_positive_quantities_are_skipped() {
        let lines = vec![line("1", 1000, 1), line("2", 2000, 0), line("3", 3000, -2)];
        let totals = compute_totals(&lines, None, &config());

        assert_eq!(totals.subtotal.cents(), 1000);
        assert_eq!(totals.total_items, 1);
    }

    #[test]
    fn test_effective_unit_price_rule() {
        let marked_down = ResolvedLine::new("1", 1, Money::from_cents(1200))
            .with_original_price(Money::from_cents(1500))
            .with_discount_bps(2000);
        assert_eq!(effective_unit_price(&marked_down).cents(), 1200);

        let no_markdown = ResolvedLine::new("1", 1, Money::from_cents(1200))
            .with_original_price(Money::from_cents(1500));
        assert_eq!(effective_unit_price(&no_markdown).cents(), 1500);

        let plain = line("1", 999, 1);
        assert_eq!(effective_unit_price(&plain).cents(), 999);
    }

    #[test]
    fn test_total_rounds_once_from_exact_value() {
        // tax 83.325¢, discount 151.5¢, total 1441.825¢
        let config = config().with_tax_rate(TaxRate::from_bps(825));
        let coupon = Coupon::percentage_bps(1500);
        let totals = compute_totals(&[line("1", 1010, 1)], Some(&coupon), &config);

        assert_eq!(totals.tax.cents(), 83);
        assert_eq!(totals.discount.cents(), 152);
        assert_eq!(totals.total.cents(), 1442);
    }

    #[test]
    fn test_half_even_tax() {
        // $10.00 × 8.25% = 82.5¢ → 82¢
        let config = config().with_tax_rate(TaxRate::from_bps(825));
        let totals = compute_totals(&[line("1", 1000, 1)], None, &config);
        assert_eq!(totals.tax.cents(), 82);
        assert_eq!(totals.total.cents(), 1582);
    }

    #[test]
    fn test_idempotent() {
        let coupon = Coupon::percentage_bps(1250);
        let first = compute_totals(&two_lines(), Some(&coupon), &config());
        let second = compute_totals(&two_lines(), Some(&coupon), &config());
        assert_eq!(first, second);
    }

    #[test]
    fn test_total_never_negative() {
        let coupons = [
            None,
            Some(Coupon::percentage_bps(10_000)),
            Some(Coupon::percentage_bps(u32::MAX)),
            Some(Coupon::fixed(Money::from_cents(1))),
            Some(Coupon::fixed(Money::from_cents(i64::MAX / 20_000))),
        ];
        for price in [0, 1, 99, 1000, 4999, 5000, 123_456] {
            for qty in [0, 1, 3, 50] {
                for coupon in &coupons {
                    let totals = compute_totals(&[line("1", price, qty)], coupon.as_ref(), &config());
                    assert!(!totals.total.is_negative(), "price={price} qty={qty}");
                    assert!(!totals.tax.is_negative());
                    assert!(!totals.discount.is_negative());
                }
            }
        }
    }

    #[test]
    fn test_prices_near_i64_max_saturate() {
        let price = i64::MAX / 2 + 1;
        let totals = compute_totals(&[line("1", price, 2)], None, &config());

        assert_eq!(totals.subtotal.cents(), i64::MAX);
        assert_eq!(totals.shipping, Money::zero());
        assert_eq!(totals.total.cents(), i64::MAX);

        let catalog = |id: &BookId| Some(CatalogEntry::new(id.clone(), "Folio", Money::from_cents(price)));
        let coupon = Coupon::fixed(Money::from_cents(1000));
        let quote = quote(&[CartLine::new(BookId::new("1"), 2)], &catalog, Some(&coupon), &config());

        assert_eq!(quote.lines[0].line_total.cents(), i64::MAX);
        assert_eq!(quote.savings, Money::zero());
        assert!(quote.totals.total.is_positive());
    }

    #[test]
    fn test_monotonic_in_quantity() {
        // Threshold out of reach so shipping stays constant.
        let config = config().with_free_shipping_threshold(Money::from_cents(10_000_000));
        let coupon = Coupon::percentage_bps(3000);

        let mut previous = compute_totals(&[line("1", 199, 1), line("2", 350, 2)], Some(&coupon), &config);
        for qty in 2..40 {
            let current =
                compute_totals(&[line("1", 199, qty), line("2", 350, 2)], Some(&coupon), &config);
            assert!(current.subtotal >= previous.subtotal);
            assert!(current.total >= previous.total);
            assert!(current.total_items > previous.total_items);
            previous = current;
        }
    }

    #[test]
    fn test_quote_reports_unresolved_lines() {
        let catalog: InMemoryCatalog =
            vec![CatalogEntry::new("1", "Dune", Money::from_cents(1000))].into_iter().collect();
        let cart_lines = vec![
            CartLine::new(BookId::new("1"), 1),
            CartLine::new(BookId::new("ghost"), 1),
        ];

        let quote = quote(&cart_lines, &catalog, None, &config());

        assert_eq!(quote.totals.subtotal.cents(), 1000);
        assert_eq!(quote.totals.total_items, 1);
        assert_eq!(quote.lines.len(), 1);
        assert!(quote.has_unresolved());
        assert_eq!(quote.unresolved[0].book_id.as_str(), "ghost");
        assert_eq!(quote.unresolved[0].reason, UnavailableReason::NotFound);
    }

    #[test]
    fn test_quote_lines_savings_and_shipping() {
        let catalog: InMemoryCatalog = vec![
            CatalogEntry::new("1", "Hardcover", Money::from_cents(1600))
                .with_original_price(Money::from_cents(2000))
                .with_format(BookFormat::Physical { weight_grams: 700 }),
            CatalogEntry::new("2", "Ebook", Money::from_cents(900)).with_format(BookFormat::Ebook),
            CatalogEntry::new("3", "Withdrawn", Money::from_cents(500)).inactive(),
        ]
        .into_iter()
        .collect();

        let mut cart = Cart::new();
        cart.add_item("1", 2).unwrap();
        cart.add_item("2", 1).unwrap();
        cart.add_item("3", 1).unwrap();
        cart.apply_coupon(Coupon::percentage_bps(12_000));

        let quote = quote_cart(&cart, &catalog, &config());

        assert_eq!(quote.lines[0].line_total.cents(), 3200);
        assert_eq!(quote.lines[1].line_total.cents(), 900);
        assert_eq!(quote.savings.cents(), 800);
        assert!(quote.requires_shipping);
        assert_eq!(quote.shipping_weight_grams, 2400);
        assert_eq!(quote.unresolved[0].reason, UnavailableReason::Inactive);
        assert_eq!(quote.coupon, Some(Coupon::percentage_bps(10_000)));
        assert_eq!(quote.totals.subtotal.cents(), 4100);
    }

    #[test]
    fn test_digital_only_quote_does_not_ship() {
        let catalog = |id: &BookId| {
            Some(CatalogEntry::new(id.clone(), "Audio", Money::from_cents(1500)).with_format(BookFormat::Audiobook))
        };
        let quote = quote(&[CartLine::new(BookId::new("a"), 1)], &catalog, None, &config());

        assert!(!quote.requires_shipping);
        assert_eq!(quote.shipping_weight_grams, 0);
    }

    #[test]
    fn test_free_shipping_progress() {
        let config = config();
        assert_eq!(free_shipping_remaining(Money::from_cents(4000), &config).cents(), 1000);
        assert_eq!(free_shipping_progress_bps(Money::from_cents(4000), &config), 8000);

        assert!(free_shipping_remaining(Money::from_cents(5500), &config).is_zero());
        assert_eq!(free_shipping_progress_bps(Money::from_cents(5500), &config), 10_000);

        assert_eq!(free_shipping_progress_bps(Money::zero(), &config), 0);

        let always_free = config.with_free_shipping_threshold(Money::zero());
        assert_eq!(free_shipping_progress_bps(Money::zero(), &always_free), 10_000);
    }
}
