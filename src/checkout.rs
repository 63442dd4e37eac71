//! Checkout submission
//!
//! Assembles the transaction-creation request from the current checkout
//! inputs. Validation runs before assembly and blocks submission locally;
//! an invalid checkout never reaches the network. The embedded amounts are
//! recomputed at build time from the live inputs, never copied from an
//! earlier render.
//!
//! Clearing the cart after a confirmed success is the caller's move; nothing
//! here clears it implicitly, so a failed submission leaves the cart intact
//! for retry.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    cart::Cart,
    pricing::{PricingError, compute_breakdown},
    products::{Product, ProductKey},
    shipping::{Carrier, Destination, QuoteSelector},
    vouchers::Voucher,
};

/// Input validation failures that block submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The cart has no lines.
    #[error("cannot submit an empty cart")]
    EmptyCart,

    /// A required buyer contact field is blank.
    #[error("missing buyer field: {0}")]
    MissingBuyerField(&'static str),

    /// No usable destination on the shipping address.
    #[error("shipping address has no destination")]
    MissingDestination,

    /// No shipping quote is currently selected.
    #[error("no shipping quote selected")]
    NoQuoteSelected,

    /// A cart line references a product missing from the catalog.
    #[error("cart references a product missing from the catalog")]
    UnknownProduct,
}

/// Errors building a transaction request.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Validation rejected the inputs before assembly.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Price breakdown could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Who is buying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerContact {
    /// Buyer name.
    pub name: String,

    /// Contact email.
    pub email: String,

    /// Contact phone.
    pub phone: String,
}

/// Where the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    /// Street address.
    pub street: String,

    /// Province name.
    pub province: String,

    /// City name.
    pub city: String,

    /// Canonical district id, when the region lookup resolved one.
    pub district: Option<u32>,

    /// Postal code.
    pub postal_code: String,
}

impl ShippingAddress {
    /// The destination key for quote fetching: the district id when
    /// resolved, else the raw address + postal code fallback.
    #[must_use]
    pub fn destination(&self) -> Option<Destination> {
        if let Some(district) = self.district {
            return Some(Destination::District(district));
        }

        if self.street.trim().is_empty() || self.postal_code.trim().is_empty() {
            return None;
        }

        Some(Destination::Postal {
            address: self.street.clone(),
            postal_code: self.postal_code.clone(),
        })
    }
}

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Redirect to the payment gateway.
    Gateway,

    /// Manual transfer, settled out-of-band via proof-of-payment review.
    Manual,
}

/// One submitted line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    /// Upstream product identifier.
    pub product_id: String,

    /// Product name at submission time.
    pub name: String,

    /// Unit price in minor units.
    pub unit_price_minor: i64,

    /// Units ordered.
    pub quantity: u32,
}

/// The selected quote, flattened for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    /// Carrier code.
    pub carrier: Carrier,

    /// Service code.
    pub service: String,

    /// Quoted cost in minor units.
    pub cost_minor: i64,
}

/// The authoritative amounts, recomputed at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountsSummary {
    /// Σ(unit price × quantity) in minor units.
    pub subtotal_minor: i64,

    /// Voucher discount in minor units.
    pub discount_minor: i64,

    /// Shipping cost in minor units.
    pub shipping_minor: i64,

    /// Amount to charge in minor units.
    pub grand_total_minor: i64,
}

/// The request body for the transaction-creation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Buyer contact details.
    pub buyer: BuyerContact,

    /// Shipping address.
    pub shipping_address: ShippingAddress,

    /// Submitted line items.
    pub line_items: Vec<TransactionLine>,

    /// The selected shipping quote.
    pub selected_quote: QuoteSummary,

    /// Voucher id, when one is applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_id: Option<String>,

    /// Chosen payment method.
    pub payment_method: PaymentMethod,

    /// The recomputed price breakdown.
    pub amounts: AmountsSummary,
}

/// The transaction-creation response: a gateway redirect, or a bare
/// acknowledgment for the manual flow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TransactionResponse {
    /// Gateway flow: the shopper is sent to this URL to pay.
    Redirect {
        /// Payment gateway URL.
        #[serde(rename = "paymentRedirectUrl")]
        payment_redirect_url: String,
    },

    /// Manual/offline flow: accepted; settlement happens out-of-band.
    Accepted {},
}

fn require_field(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingBuyerField(field));
    }

    Ok(())
}

/// Validates the checkout inputs and assembles the transaction request.
///
/// Checks, in order: non-empty cart, buyer fields present, a usable
/// destination, a selected quote, and every cart line resolvable in the
/// catalog. The amounts are recomputed here via [`compute_breakdown`] so a
/// stale earlier render can never be submitted.
///
/// # Errors
///
/// - [`CheckoutError::Invalid`]: a validation check failed; nothing was
///   assembled and nothing must be sent.
/// - [`CheckoutError::Pricing`]: the breakdown could not be computed.
pub fn build_transaction<'a>(
    cart: &Cart<'a>,
    products: &SlotMap<ProductKey, Product<'a>>,
    buyer: &BuyerContact,
    address: &ShippingAddress,
    selector: &QuoteSelector<'a>,
    voucher: Option<&Voucher<'a>>,
    payment_method: PaymentMethod,
) -> Result<TransactionRequest, CheckoutError> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }

    require_field(&buyer.name, "name")?;
    require_field(&buyer.email, "email")?;
    require_field(&buyer.phone, "phone")?;

    if address.destination().is_none() {
        return Err(ValidationError::MissingDestination.into());
    }

    let quote = selector
        .selected_quote()
        .ok_or(ValidationError::NoQuoteSelected)?;

    let line_items = cart
        .iter()
        .map(|line| {
            let product = products
                .get(line.product())
                .ok_or(ValidationError::UnknownProduct)?;

            Ok(TransactionLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit_price_minor: line.unit_price().to_minor_units(),
                quantity: line.quantity().get(),
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let breakdown = compute_breakdown(cart, voucher, Some(quote))?;

    Ok(TransactionRequest {
        buyer: buyer.clone(),
        shipping_address: address.clone(),
        line_items,
        selected_quote: QuoteSummary {
            carrier: quote.carrier().clone(),
            service: quote.service().to_string(),
            cost_minor: quote.cost().to_minor_units(),
        },
        voucher_id: voucher.map(|voucher| voucher.id().to_string()),
        payment_method,
        amounts: AmountsSummary {
            subtotal_minor: breakdown.subtotal().to_minor_units(),
            discount_minor: breakdown.discount().to_minor_units(),
            shipping_minor: breakdown.shipping_cost().to_minor_units(),
            grand_total_minor: breakdown.grand_total().to_minor_units(),
        },
    })
}
