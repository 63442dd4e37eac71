//! Guest Checkout Demo
//!
//! Walks a fixture cart through the full checkout pipeline: shipping quote
//! selection, voucher resolution, the rendered price breakdown, and finally
//! a simulated order-lookup payload projected onto the tracking timeline.
//!
//! Use `-f` to load a fixture set by name
//! Use `-c` to pick a carrier and `-v` to apply a voucher code
//! Use `-d` to change the destination district id

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing_subscriber::EnvFilter;

use etalase::{
    checkout::{
        BuyerContact, PaymentMethod, ShippingAddress, TransactionResponse, build_transaction,
    },
    fixtures::Fixture,
    orders::OrderRecord,
    pricing::compute_breakdown,
    shipping::{Carrier, Destination, QuoteSelector},
    timeline::{MILESTONES, StepState},
    utils::DemoCheckoutArgs,
};

/// Guest Checkout Demo
#[expect(clippy::print_stdout, reason = "Example program output to user")]
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = DemoCheckoutArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)
        .with_context(|| format!("loading fixture set `{}`", args.fixture))?;

    let cart = fixture.cart(&[("btk-01", 2), ("sbn-02", 1)])?;
    let carrier = Carrier::new(args.courier.as_str());

    let mut selector = QuoteSelector::new();
    selector.set_destination(Destination::District(args.district));

    let ticket = selector.choose_carrier(carrier.clone())?;
    selector.apply_fetch(ticket, Ok(fixture.quotes_for(&carrier)));

    println!("\nQuotes from `{carrier}`:");

    for (index, quote) in selector.quotes().iter().enumerate() {
        let eta = quote
            .eta()
            .map_or_else(|| "-".to_string(), |eta| eta.human(Truncate::Day).to_string());

        println!(
            "  [{index}] {:<6} {:<24} {}  (eta {eta})",
            quote.service(),
            quote.description(),
            quote.cost(),
        );
    }

    let voucher = args
        .voucher
        .as_deref()
        .and_then(|code| fixture.voucher_by_code(code));

    if let Some(voucher) = voucher {
        println!("\nApplying voucher `{}`", voucher.code());
    }

    let breakdown = compute_breakdown(&cart, voucher, selector.selected_quote())?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    breakdown.write_to(&mut handle, &cart, fixture.products())?;

    let buyer = BuyerContact {
        name: "Siti Rahma".to_string(),
        email: "siti@example.com".to_string(),
        phone: "+62812000111".to_string(),
    };

    let address = ShippingAddress {
        street: "Jl. Kenanga 12".to_string(),
        province: "DI Yogyakarta".to_string(),
        city: "Yogyakarta".to_string(),
        district: Some(args.district),
        postal_code: "55281".to_string(),
    };

    let request = build_transaction(
        &cart,
        fixture.products(),
        &buyer,
        &address,
        &selector,
        voucher,
        PaymentMethod::Gateway,
    )?;

    writeln!(
        handle,
        "\nSubmitting transaction:\n{}",
        serde_json::to_string_pretty(&request)?
    )?;

    // Simulated collaborator responses: the gateway redirect, then a later
    // order-lookup read while the parcel is in transit.
    let response: TransactionResponse =
        serde_json::from_str(r#"{"paymentRedirectUrl":"https://pay.example/tx/42"}"#)?;

    writeln!(handle, "Response: {response:?}")?;

    let lookup = r#"{
        "reference": "INV-2024-0042",
        "buyerName": "Siti Rahma",
        "paymentStatus": 1,
        "shipmentStatus": 1,
        "shipment": "{\"courier\":\"jne\",\"waybill\":\"JNE123\",\"service\":\"REG\"}"
    }"#;

    let record = OrderRecord::from_payload(lookup)?;
    let projection = record.timeline();

    writeln!(
        handle,
        "\nOrder {} is {} ({}%)",
        record.reference(),
        record.lifecycle(),
        projection.progress_percent()
    )?;

    for (milestone, state) in MILESTONES.iter().zip(projection.steps()) {
        let marker = match state {
            StepState::Completed => "[x]",
            StepState::Current => "[>]",
            StepState::Inactive => "[ ]",
        };

        writeln!(handle, "  {marker} {milestone}")?;
    }

    Ok(())
}
