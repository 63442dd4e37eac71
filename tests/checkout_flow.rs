//! Integration test for the full guest checkout flow.
//!
//! Drives the engine end-to-end the way the storefront does: build a cart,
//! pick a destination and carrier, apply a quote fetch, resolve a voucher,
//! recompute the breakdown, and assemble the submission. The scenarios pin
//! the documented arithmetic:
//!
//! - 2 × 149,000 with a 15,000 quote totals 313,000
//! - a 10% voucher on 298,000 discounts exactly 29,800
//! - an empty cart totals exactly the shipping cost

use rusty_money::{Money, iso::IDR};
use slotmap::SlotMap;
use testresult::TestResult;

use etalase::{
    cart::Cart,
    checkout::{
        BuyerContact, CheckoutError, PaymentMethod, ShippingAddress, ValidationError,
        build_transaction,
    },
    pricing::compute_breakdown,
    products::{Product, ProductKey},
    shipping::{ApplyOutcome, Carrier, Destination, QuoteSelector, ShippingQuote},
    vouchers::{Voucher, VoucherKind},
};

fn catalog() -> (SlotMap<ProductKey, Product<'static>>, ProductKey) {
    let mut products = SlotMap::with_key();

    let scarf = products.insert(Product {
        id: "btk-01".to_string(),
        name: "Batik Scarf".to_string(),
        price: Money::from_minor(149_000, IDR),
    });

    (products, scarf)
}

fn reg_quote() -> ShippingQuote<'static> {
    ShippingQuote::new(
        Carrier::new("jne"),
        "REG",
        "Layanan Reguler",
        Money::from_minor(15_000, IDR),
        None,
    )
}

fn buyer() -> BuyerContact {
    BuyerContact {
        name: "Siti Rahma".to_string(),
        email: "siti@example.com".to_string(),
        phone: "+62812000111".to_string(),
    }
}

fn address() -> ShippingAddress {
    ShippingAddress {
        street: "Jl. Kenanga 12".to_string(),
        province: "DI Yogyakarta".to_string(),
        city: "Yogyakarta".to_string(),
        district: Some(1574),
        postal_code: "55281".to_string(),
    }
}

fn ready_selector() -> TestResult<QuoteSelector<'static>> {
    let mut selector = QuoteSelector::new();

    selector.set_destination(Destination::District(1574));
    let ticket = selector.choose_carrier(Carrier::new("jne"))?;

    let outcome = selector.apply_fetch(ticket, Ok(vec![reg_quote()]));
    assert_eq!(outcome, ApplyOutcome::Applied, "fresh fetch must apply");

    Ok(selector)
}

#[test]
fn full_checkout_matches_the_documented_arithmetic() -> TestResult {
    let (products, scarf) = catalog();

    let mut cart = Cart::new(IDR);
    cart.add(scarf, Money::from_minor(149_000, IDR))?;
    cart.increment(scarf)?;

    let selector = ready_selector()?;

    let breakdown = compute_breakdown(&cart, None, selector.selected_quote())?;

    assert_eq!(breakdown.subtotal(), Money::from_minor(298_000, IDR));
    assert_eq!(breakdown.grand_total(), Money::from_minor(313_000, IDR));

    let request = build_transaction(
        &cart,
        &products,
        &buyer(),
        &address(),
        &selector,
        None,
        PaymentMethod::Gateway,
    )?;

    assert_eq!(request.amounts.grand_total_minor, 313_000);
    assert_eq!(request.selected_quote.cost_minor, 15_000);

    Ok(())
}

#[test]
fn voucher_discount_flows_through_to_the_submission() -> TestResult {
    let (products, scarf) = catalog();

    let mut cart = Cart::new(IDR);
    cart.add(scarf, Money::from_minor(149_000, IDR))?;
    cart.increment(scarf)?;

    let selector = ready_selector()?;
    let voucher = Voucher::new("7", "WELCOME10", VoucherKind::Percentage(10));

    let request = build_transaction(
        &cart,
        &products,
        &buyer(),
        &address(),
        &selector,
        Some(&voucher),
        PaymentMethod::Manual,
    )?;

    assert_eq!(request.amounts.discount_minor, 29_800);
    assert_eq!(request.amounts.grand_total_minor, 298_000 - 29_800 + 15_000);

    Ok(())
}

#[test]
fn destination_change_mid_checkout_forces_a_requote() -> TestResult {
    let (products, scarf) = catalog();

    let mut cart = Cart::new(IDR);
    cart.add(scarf, Money::from_minor(149_000, IDR))?;

    let mut selector = ready_selector()?;

    // The shopper edits the address after quotes came back: the selection
    // must die with the old destination, and submission must be blocked
    // until a fresh quote is fetched and selected.
    selector.set_destination(Destination::District(1601));

    assert_eq!(selector.selected_quote(), None);

    let result = build_transaction(
        &cart,
        &products,
        &buyer(),
        &address(),
        &selector,
        None,
        PaymentMethod::Gateway,
    );

    assert!(matches!(
        result,
        Err(CheckoutError::Invalid(ValidationError::NoQuoteSelected))
    ));

    // Breakdown without a quote never charges stale shipping.
    let breakdown = compute_breakdown(&cart, None, selector.selected_quote())?;

    assert_eq!(breakdown.shipping_cost(), Money::from_minor(0, IDR));

    Ok(())
}

#[test]
fn late_quote_response_for_an_old_destination_is_ignored() -> TestResult {
    let mut selector = QuoteSelector::new();

    selector.set_destination(Destination::District(1574));
    let stale_ticket = selector.choose_carrier(Carrier::new("jne"))?;

    selector.set_destination(Destination::District(1601));
    let fresh_ticket = selector.choose_carrier(Carrier::new("jne"))?;

    let fresh = ShippingQuote::new(
        Carrier::new("jne"),
        "REG",
        "Layanan Reguler",
        Money::from_minor(21_000, IDR),
        None,
    );

    assert_eq!(
        selector.apply_fetch(fresh_ticket, Ok(vec![fresh])),
        ApplyOutcome::Applied
    );

    assert_eq!(
        selector.apply_fetch(stale_ticket, Ok(vec![reg_quote()])),
        ApplyOutcome::Superseded,
        "the older fetch must lose no matter when it resolves"
    );

    assert_eq!(
        selector.selected_quote().map(|q| q.cost().to_minor_units()),
        Some(21_000)
    );

    Ok(())
}

#[test]
fn cart_survives_a_failed_submission_and_clears_on_success() -> TestResult {
    let (products, scarf) = catalog();

    let mut cart = Cart::new(IDR);
    cart.add(scarf, Money::from_minor(149_000, IDR))?;

    // Submission blocked locally: the cart must be untouched for retry.
    let mut selector = QuoteSelector::new();
    selector.set_destination(Destination::District(1574));

    let blocked = build_transaction(
        &cart,
        &products,
        &buyer(),
        &address(),
        &selector,
        None,
        PaymentMethod::Gateway,
    );

    assert!(blocked.is_err());
    assert_eq!(cart.len(), 1, "failed submission must not clear the cart");

    // Confirmed success: the caller clears explicitly.
    let ticket = selector.choose_carrier(Carrier::new("jne"))?;
    selector.apply_fetch(ticket, Ok(vec![reg_quote()]));

    let request = build_transaction(
        &cart,
        &products,
        &buyer(),
        &address(),
        &selector,
        None,
        PaymentMethod::Gateway,
    );

    assert!(request.is_ok());

    cart.clear();

    assert!(cart.is_empty());

    Ok(())
}
