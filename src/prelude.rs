//! Etalase prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartEvent, CartLine},
    checkout::{
        BuyerContact, CheckoutError, PaymentMethod, ShippingAddress, TransactionRequest,
        TransactionResponse, ValidationError, build_transaction,
    },
    fixtures::{Fixture, FixtureError},
    money::{MoneyMathError, Quantity},
    orders::{OrderPayloadError, OrderRecord, ShipmentDetail},
    pricing::{PriceBreakdown, PricingError, compute_breakdown},
    products::{Product, ProductKey, ProductSnapshot},
    shipping::{
        ApplyOutcome, Carrier, Destination, FetchTicket, QuoteRequest, QuoteSelector,
        SelectorError, SelectorPhase, ShippingQuote,
    },
    status::{OrderLifecycle, RawOrderSignal, derive_lifecycle},
    storage::{CartStore, StorageError, StoredLine},
    timeline::{MILESTONES, StepState, TimelineProjection, project},
    vouchers::{Voucher, VoucherKind, VoucherRecord, resolve_discount},
};
