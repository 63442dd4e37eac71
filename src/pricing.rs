//! Pricing
//!
//! [`compute_breakdown`] folds the cart, the resolved voucher discount and
//! the selected shipping quote into the single authoritative price
//! breakdown behind a checkout submission. It is pure and recomputed on
//! every call: a cached breakdown that can drift from its inputs is a
//! correctness bug here, not an optimisation.

use std::io;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::Cart,
    money::{self, MoneyMathError},
    products::{Product, ProductKey},
    shipping::ShippingQuote,
    vouchers::{Voucher, resolve_discount},
};

/// Errors that can occur while computing or rendering a breakdown.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyMathError),

    /// A cart line references a product missing from the catalog.
    #[error("missing product for cart line")]
    MissingProduct(ProductKey),

    /// IO error while rendering.
    #[error("IO error")]
    Io,
}

/// The itemized price computation backing a checkout submission.
///
/// Derived, never stored: `subtotal − discount + shipping = grand total`,
/// with `discount ≤ subtotal` guaranteed by the voucher resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown<'a> {
    subtotal: Money<'a, Currency>,
    discount: Money<'a, Currency>,
    shipping_cost: Money<'a, Currency>,
    grand_total: Money<'a, Currency>,
}

/// Computes the price breakdown for the current checkout inputs.
///
/// `subtotal = Σ(unit price × quantity)`, `discount` comes from the voucher
/// resolver (already clamped to `[0, subtotal]`), `shipping` is the selected
/// quote's cost or zero when none is selected, and
/// `grand total = subtotal − discount + shipping`.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if a line total overflows or the quote's
/// currency differs from the cart's.
pub fn compute_breakdown<'a>(
    cart: &Cart<'a>,
    voucher: Option<&Voucher<'a>>,
    selected_quote: Option<&ShippingQuote<'a>>,
) -> Result<PriceBreakdown<'a>, PricingError> {
    let subtotal = cart.subtotal()?;
    let discount = resolve_discount(voucher, &subtotal);

    let shipping_cost = selected_quote
        .map_or_else(|| money::zero(cart.currency()), |quote| *quote.cost());

    let after_discount = money::sub_or_underflow(subtotal, discount)?;
    let grand_total = money::add(after_discount, shipping_cost)?;

    Ok(PriceBreakdown {
        subtotal,
        discount,
        shipping_cost,
        grand_total,
    })
}

impl<'a> PriceBreakdown<'a> {
    /// Total cost of all lines before discount and shipping.
    #[must_use]
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Amount the voucher takes off the subtotal.
    #[must_use]
    pub fn discount(&self) -> Money<'a, Currency> {
        self.discount
    }

    /// Cost of the selected shipping quote, or zero when none is selected.
    #[must_use]
    pub fn shipping_cost(&self) -> Money<'a, Currency> {
        self.shipping_cost
    }

    /// The amount the shopper pays.
    #[must_use]
    pub fn grand_total(&self) -> Money<'a, Currency> {
        self.grand_total
    }

    /// The discount as a fraction of the subtotal.
    #[must_use]
    pub fn discount_percent(&self) -> Percentage {
        let subtotal_minor = self.subtotal.to_minor_units();

        if subtotal_minor == 0 {
            return Percentage::from(0.0);
        }

        let discount = Decimal::from_i64(self.discount.to_minor_units()).unwrap_or(Decimal::ZERO);
        let subtotal = Decimal::from_i64(subtotal_minor).unwrap_or(Decimal::ZERO);

        Percentage::from(discount / subtotal)
    }

    /// Renders the breakdown as an itemized table plus summary lines.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::MissingProduct`] when a cart line's product is
    /// not in the catalog, or [`PricingError::Io`] if writing fails.
    pub fn write_to(
        &self,
        mut out: impl io::Write,
        cart: &Cart<'a>,
        products: &SlotMap<ProductKey, Product<'a>>,
    ) -> Result<(), PricingError> {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Qty", "Unit Price", "Line Total"]);

        for line in cart.iter() {
            let product = products
                .get(line.product())
                .ok_or(PricingError::MissingProduct(line.product()))?;

            builder.push_record([
                product.name.clone(),
                line.quantity().to_string(),
                format!("{}", line.unit_price()),
                format!("{}", line.line_total()?),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(1..), Alignment::right());

        writeln!(out, "{table}").map_err(|_err| PricingError::Io)?;

        write_summary_line(&mut out, "Subtotal:", &format!("{}", self.subtotal))?;

        if self.discount.to_minor_units() > 0 {
            // `Percentage` is a fraction (e.g. 0.1), so multiply by 100 to
            // print percent points.
            let percent_points =
                ((self.discount_percent() * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2);

            write_summary_line(
                &mut out,
                "Discount:",
                &format!("({percent_points}%) -{}", self.discount),
            )?;
        }

        write_summary_line(&mut out, "Shipping:", &format!("{}", self.shipping_cost))?;
        write_summary_line(&mut out, "Total:", &format!("{}", self.grand_total))?;

        Ok(())
    }
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
) -> Result<(), PricingError> {
    writeln!(out, " {label:>10} {value}").map_err(|_err| PricingError::Io)
}

#[cfg(test)]
mod tests {
    use num_traits::FromPrimitive;
    use rusty_money::iso::IDR;
    use slotmap::SlotMap;
    use std::time::Duration;
    use testresult::TestResult;

    use crate::{
        shipping::Carrier,
        vouchers::VoucherKind,
    };

    use super::*;

    fn catalog() -> (SlotMap<ProductKey, Product<'static>>, Vec<ProductKey>) {
        let mut products = SlotMap::with_key();

        let scarf = products.insert(Product {
            id: "btk-01".to_string(),
            name: "Batik Scarf".to_string(),
            price: Money::from_minor(149_000, IDR),
        });

        let soap = products.insert(Product {
            id: "sbn-02".to_string(),
            name: "Herbal Soap".to_string(),
            price: Money::from_minor(35_000, IDR),
        });

        (products, vec![scarf, soap])
    }

    fn quote(cost: i64) -> ShippingQuote<'static> {
        ShippingQuote::new(
            Carrier::new("jne"),
            "REG",
            "Layanan Reguler",
            Money::from_minor(cost, IDR),
            Some(Duration::from_secs(3 * 86_400)),
        )
    }

    #[test]
    fn concrete_checkout_scenario() -> TestResult {
        let (_, keys) = catalog();
        let scarf = *keys.first().ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(scarf, Money::from_minor(149_000, IDR))?;
        cart.increment(scarf)?;

        let shipping = quote(15_000);
        let breakdown = compute_breakdown(&cart, None, Some(&shipping))?;

        assert_eq!(breakdown.subtotal(), Money::from_minor(298_000, IDR));
        assert_eq!(breakdown.discount(), Money::from_minor(0, IDR));
        assert_eq!(breakdown.shipping_cost(), Money::from_minor(15_000, IDR));
        assert_eq!(breakdown.grand_total(), Money::from_minor(313_000, IDR));

        Ok(())
    }

    #[test]
    fn percentage_voucher_scenario() -> TestResult {
        let (_, keys) = catalog();
        let scarf = *keys.first().ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(scarf, Money::from_minor(149_000, IDR))?;
        cart.increment(scarf)?;

        let voucher = Voucher::new("7", "WELCOME10", VoucherKind::Percentage(10));
        let shipping = quote(15_000);

        let breakdown = compute_breakdown(&cart, Some(&voucher), Some(&shipping))?;

        assert_eq!(breakdown.discount(), Money::from_minor(29_800, IDR));
        assert_eq!(
            breakdown.grand_total(),
            Money::from_minor(298_000 - 29_800 + 15_000, IDR)
        );

        Ok(())
    }

    #[test]
    fn empty_cart_grand_total_is_shipping() -> TestResult {
        let cart = Cart::new(IDR);
        let voucher = Voucher::new("7", "WELCOME10", VoucherKind::Percentage(10));
        let shipping = quote(15_000);

        let breakdown = compute_breakdown(&cart, Some(&voucher), Some(&shipping))?;

        assert_eq!(breakdown.subtotal(), Money::from_minor(0, IDR));
        assert_eq!(breakdown.discount(), Money::from_minor(0, IDR));
        assert_eq!(breakdown.grand_total(), Money::from_minor(15_000, IDR));

        Ok(())
    }

    #[test]
    fn no_quote_means_zero_shipping() -> TestResult {
        let (_, keys) = catalog();
        let soap = *keys.get(1).ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(soap, Money::from_minor(35_000, IDR))?;

        let breakdown = compute_breakdown(&cart, None, None)?;

        assert_eq!(breakdown.shipping_cost(), Money::from_minor(0, IDR));
        assert_eq!(breakdown.grand_total(), Money::from_minor(35_000, IDR));

        Ok(())
    }

    #[test]
    fn recomputation_is_idempotent() -> TestResult {
        let (_, keys) = catalog();
        let scarf = *keys.first().ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(scarf, Money::from_minor(149_000, IDR))?;

        let voucher = Voucher::new("7", "WELCOME10", VoucherKind::Percentage(10));
        let shipping = quote(15_000);

        let first = compute_breakdown(&cart, Some(&voucher), Some(&shipping))?;
        let second = compute_breakdown(&cart, Some(&voucher), Some(&shipping))?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn grand_total_is_monotonic_in_voucher_percent() -> TestResult {
        let (_, keys) = catalog();
        let scarf = *keys.first().ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(scarf, Money::from_minor(149_000, IDR))?;
        cart.increment(scarf)?;

        let shipping = quote(15_000);
        let mut previous_total = i64::MAX;

        for percent in 0..=100 {
            let voucher = Voucher::new("7", "P", VoucherKind::Percentage(percent));
            let breakdown = compute_breakdown(&cart, Some(&voucher), Some(&shipping))?;
            let total = breakdown.grand_total().to_minor_units();

            assert!(total <= previous_total, "grand total rose at p={percent}");
            assert!(
                breakdown.grand_total().to_minor_units() >= breakdown.shipping_cost().to_minor_units(),
                "total under shipping at p={percent}"
            );

            previous_total = total;
        }

        Ok(())
    }

    #[test]
    fn discount_percent_of_zero_subtotal_is_zero() -> TestResult {
        let cart = Cart::new(IDR);
        let breakdown = compute_breakdown(&cart, None, None)?;

        assert_eq!(breakdown.discount_percent(), Percentage::from(0.0));

        Ok(())
    }

    #[test]
    fn discount_percent_matches_ratio() -> TestResult {
        let (_, keys) = catalog();
        let scarf = *keys.first().ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(scarf, Money::from_minor(149_000, IDR))?;
        cart.increment(scarf)?;

        let voucher = Voucher::new("7", "WELCOME10", VoucherKind::Percentage(10));
        let breakdown = compute_breakdown(&cart, Some(&voucher), None)?;

        let expected = Decimal::from_f64(0.10).ok_or("decimal")?;

        assert_eq!(breakdown.discount_percent() * Decimal::ONE, expected);

        Ok(())
    }

    #[test]
    fn write_to_renders_items_and_summary() -> TestResult {
        let (products, keys) = catalog();
        let scarf = *keys.first().ok_or("key")?;
        let soap = *keys.get(1).ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(scarf, Money::from_minor(149_000, IDR))?;
        cart.increment(scarf)?;
        cart.add(soap, Money::from_minor(35_000, IDR))?;

        let voucher = Voucher::new("7", "WELCOME10", VoucherKind::Percentage(10));
        let shipping = quote(15_000);

        let breakdown = compute_breakdown(&cart, Some(&voucher), Some(&shipping))?;

        let mut out = Vec::new();
        breakdown.write_to(&mut out, &cart, &products)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("Batik Scarf"), "item rows rendered");
        assert!(output.contains("Herbal Soap"), "item rows rendered");
        assert!(output.contains("Subtotal:"), "summary rendered");
        assert!(output.contains("Discount:"), "summary rendered");
        assert!(output.contains("Shipping:"), "summary rendered");
        assert!(output.contains("Total:"), "summary rendered");

        Ok(())
    }

    #[test]
    fn write_to_errors_on_missing_product() -> TestResult {
        let (mut products, keys) = catalog();
        let scarf = *keys.first().ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(scarf, Money::from_minor(149_000, IDR))?;

        products.remove(scarf);

        let breakdown = compute_breakdown(&cart, None, None)?;
        let result = breakdown.write_to(Vec::new(), &cart, &products);

        assert!(matches!(result, Err(PricingError::MissingProduct(_))));

        Ok(())
    }
}
