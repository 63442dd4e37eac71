//! Order records
//!
//! The order-lookup collaborator returns a loosely-shaped JSON record:
//! optional nested fields, and a shipment detail that upstream encodes as a
//! *string of JSON* inside the payload. [`OrderRecord::from_payload`] parses
//! it fail-closed (absent or malformed fields become defaults, never
//! exceptions) and the record is read-only from then on. Only the two raw
//! status codes feed derived state; everything else is displayed verbatim.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::{
    status::{OrderLifecycle, RawOrderSignal, derive_lifecycle},
    timeline::{TimelineProjection, project},
};

/// Errors parsing an order-lookup payload.
#[derive(Debug, Error)]
pub enum OrderPayloadError {
    /// The payload body itself was not a JSON object.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One descriptive line of a fetched order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemLine {
    /// Product name as sold.
    #[serde(default)]
    pub name: String,

    /// Units ordered.
    #[serde(default)]
    pub quantity: u32,

    /// Unit price in minor units at order time.
    #[serde(default)]
    pub unit_price_minor: i64,
}

/// Shipment detail, decoded from the string-encoded sub-object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDetail {
    /// Courier handling the shipment.
    #[serde(default)]
    pub courier: String,

    /// Waybill / receipt number, once assigned.
    #[serde(default)]
    pub waybill: Option<String>,

    /// Courier service code.
    #[serde(default)]
    pub service: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrderPayload {
    #[serde(default)]
    reference: String,

    #[serde(default)]
    buyer_name: String,

    #[serde(default)]
    buyer_phone: Option<String>,

    #[serde(default)]
    items: Vec<OrderItemLine>,

    #[serde(default)]
    payment_status: i64,

    #[serde(default)]
    shipment_status: i64,

    /// String-encoded JSON sub-object, as upstream sends it.
    #[serde(default)]
    shipment: Option<String>,
}

/// A fetched order, ready for the tracking view.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    reference: String,
    buyer_name: String,
    buyer_phone: Option<String>,
    items: Vec<OrderItemLine>,
    signal: RawOrderSignal,
    shipment: Option<ShipmentDetail>,
}

impl OrderRecord {
    /// Parses an order-lookup response body.
    ///
    /// Fails closed: missing fields default, and a malformed string-encoded
    /// shipment detail becomes `None` (logged) instead of failing the whole
    /// record. Status codes pass through untouched for
    /// [`derive_lifecycle`].
    ///
    /// # Errors
    ///
    /// Returns [`OrderPayloadError::Json`] only when the body itself is not
    /// a JSON object.
    pub fn from_payload(payload: &str) -> Result<Self, OrderPayloadError> {
        let raw: RawOrderPayload = serde_json::from_str(payload)?;

        let shipment = raw.shipment.as_deref().and_then(|encoded| {
            serde_json::from_str::<ShipmentDetail>(encoded)
                .map_err(|error| {
                    warn!(%error, "malformed shipment detail; dropping");
                })
                .ok()
        });

        Ok(OrderRecord {
            reference: raw.reference,
            buyer_name: raw.buyer_name,
            buyer_phone: raw.buyer_phone,
            items: raw.items,
            signal: RawOrderSignal {
                payment_status: raw.payment_status,
                shipment_status: raw.shipment_status,
            },
            shipment,
        })
    }

    /// The order reference used for lookups.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Buyer name, display-only.
    #[must_use]
    pub fn buyer_name(&self) -> &str {
        &self.buyer_name
    }

    /// Buyer phone, display-only.
    #[must_use]
    pub fn buyer_phone(&self) -> Option<&str> {
        self.buyer_phone.as_deref()
    }

    /// Descriptive order lines, display-only.
    #[must_use]
    pub fn items(&self) -> &[OrderItemLine] {
        &self.items
    }

    /// The raw upstream status codes.
    #[must_use]
    pub fn signal(&self) -> &RawOrderSignal {
        &self.signal
    }

    /// Shipment detail, when upstream sent a well-formed one.
    #[must_use]
    pub fn shipment(&self) -> Option<&ShipmentDetail> {
        self.shipment.as_ref()
    }

    /// Derives the canonical lifecycle from the current signal.
    ///
    /// Computed fresh on every call; nothing is cached across fetches.
    #[must_use]
    pub fn lifecycle(&self) -> OrderLifecycle {
        derive_lifecycle(&self.signal)
    }

    /// Projects the current lifecycle onto the tracking timeline.
    #[must_use]
    pub fn timeline(&self) -> TimelineProjection {
        project(self.lifecycle())
    }
}
