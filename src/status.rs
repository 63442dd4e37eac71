//! Order status derivation
//!
//! The backend reports two independently-evolving raw codes per order: a
//! payment status and a shipment status. They can disagree transiently (a
//! shipment can advance before the payment webhook lands). This module
//! collapses them into one canonical [`OrderLifecycle`] with a fixed
//! precedence, so the tracking UI and the can-pay/can-cancel decisions never
//! contradict each other.

use serde::Deserialize;
use tracing::warn;

/// Payment status code: not yet paid.
pub const PAYMENT_UNPAID: i64 = 0;
/// Payment status code: paid, awaiting processing.
pub const PAYMENT_PAID: i64 = 1;
/// Payment status code: payment accepted, order being processed.
pub const PAYMENT_PROCESSED: i64 = 2;
/// Payment status code: order returned after fulfilment.
pub const PAYMENT_RETURNED: i64 = 3;
/// Payment status code: order cancelled.
pub const PAYMENT_CANCELLED: i64 = 4;

/// Shipment status code: not yet handed to the courier.
pub const SHIPMENT_PENDING: i64 = 0;
/// Shipment status code: in transit.
pub const SHIPMENT_SHIPPED: i64 = 1;
/// Shipment status code: delivered to the recipient.
pub const SHIPMENT_DELIVERED: i64 = 2;

/// The two raw upstream codes, exactly as the order lookup returns them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderSignal {
    /// Raw payment status code.
    #[serde(default)]
    pub payment_status: i64,

    /// Raw shipment status code.
    #[serde(default)]
    pub shipment_status: i64,
}

/// The canonical order lifecycle state.
///
/// Derived fresh from each [`RawOrderSignal`] fetch, never cached across
/// fetches and never persisted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderLifecycle {
    /// Awaiting payment.
    Pending,

    /// Paid, not yet processed.
    Paid,

    /// Payment accepted, order being prepared.
    Processed,

    /// Handed to the courier, in transit.
    Shipped,

    /// Delivered to the recipient.
    Delivered,

    /// Returned after fulfilment; terminal.
    Returned,

    /// Cancelled; terminal.
    Cancelled,
}

impl OrderLifecycle {
    /// Whether this state is off the forward fulfilment timeline.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderLifecycle::Returned | OrderLifecycle::Cancelled)
    }
}

impl std::fmt::Display for OrderLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OrderLifecycle::Pending => "Pending",
            OrderLifecycle::Paid => "Paid",
            OrderLifecycle::Processed => "Processed",
            OrderLifecycle::Shipped => "Shipped",
            OrderLifecycle::Delivered => "Delivered",
            OrderLifecycle::Returned => "Returned",
            OrderLifecycle::Cancelled => "Cancelled",
        };

        write!(f, "{label}")
    }
}

/// Derives the canonical lifecycle from the two raw codes.
///
/// Precedence, first match wins:
///
/// 1. terminal payment states (returned, cancelled) override everything,
///    including an in-flight shipment, since they are post-hoc reversals;
/// 2. shipment progress (delivered, shipped) overrides payment progress:
///    once goods are moving, a lagging payment webhook must not regress the
///    display;
/// 3. then the payment ladder (processed, paid);
/// 4. everything else is `Pending`.
///
/// Total over all integer inputs: unrecognized payment codes fall through to
/// `Pending`, and shipment codes outside 0..=2 are treated as "not yet
/// shipped". Both are logged rather than silently absorbed, since they point
/// at an upstream contract drift.
#[must_use]
pub fn derive_lifecycle(signal: &RawOrderSignal) -> OrderLifecycle {
    let RawOrderSignal {
        payment_status,
        shipment_status,
    } = *signal;

    if !(PAYMENT_UNPAID..=PAYMENT_CANCELLED).contains(&payment_status) {
        warn!(payment_status, "unrecognized payment status code");
    }

    if !(SHIPMENT_PENDING..=SHIPMENT_DELIVERED).contains(&shipment_status) {
        warn!(shipment_status, "unrecognized shipment status code");
    }

    match (payment_status, shipment_status) {
        (PAYMENT_RETURNED, _) => OrderLifecycle::Returned,
        (PAYMENT_CANCELLED, _) => OrderLifecycle::Cancelled,
        (_, SHIPMENT_DELIVERED) => OrderLifecycle::Delivered,
        (_, SHIPMENT_SHIPPED) => OrderLifecycle::Shipped,
        (PAYMENT_PROCESSED, _) => OrderLifecycle::Processed,
        (PAYMENT_PAID, _) => OrderLifecycle::Paid,
        _ => OrderLifecycle::Pending,
    }
}
