//! Shipping quotes
//!
//! Carrier-rate lookup shapes and the [`QuoteSelector`] state machine. The
//! selector is the sole authority for applying a fetch result: every
//! destination/carrier mutation bumps an input generation and discards the
//! current selection, so a cost quoted for an address the shopper has since
//! changed can never be silently charged.

use std::time::Duration;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from selector operations attempted out of order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// A carrier was chosen before any destination was set.
    #[error("a destination must be set before a carrier can be chosen")]
    NoDestination,

    /// A refetch was requested before any carrier was chosen.
    #[error("a carrier must be chosen before quotes can be fetched")]
    NoCarrier,

    /// A selection was made while no quote set is available.
    #[error("no quotes available to select from")]
    NoQuotesAvailable,

    /// The selection index is outside the fetched quote set.
    #[error("no quote at index {0} in the fetched set")]
    NoSuchQuote(usize),
}

/// Where the parcel is going.
///
/// The district id is the canonical key; the raw address + postal code pair
/// is the fallback for regions the district lookup does not cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    /// Canonical district identifier from the region lookup service.
    District(u32),

    /// Free-form address with a postal code.
    Postal {
        /// Street address as typed by the shopper.
        address: String,

        /// Postal code.
        postal_code: String,
    },
}

/// Carrier code, e.g. `jne` or `tiki`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Carrier(String);

impl Carrier {
    /// Creates a carrier code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Carrier(code.into())
    }

    /// The raw code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One priced shipping option from a carrier-rate lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingQuote<'a> {
    carrier: Carrier,
    service: String,
    description: String,
    cost: Money<'a, Currency>,
    eta: Option<Duration>,
}

impl<'a> ShippingQuote<'a> {
    /// Creates a quote.
    #[must_use]
    pub fn new(
        carrier: Carrier,
        service: impl Into<String>,
        description: impl Into<String>,
        cost: Money<'a, Currency>,
        eta: Option<Duration>,
    ) -> Self {
        Self {
            carrier,
            service: service.into(),
            description: description.into(),
            cost,
            eta,
        }
    }

    /// The carrier offering this service.
    #[must_use]
    pub fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    /// Service code, e.g. `REG` or `YES`.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Human-readable service description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Shipping cost.
    #[must_use]
    pub fn cost(&self) -> &Money<'a, Currency> {
        &self.cost
    }

    /// Worst-case delivery estimate, when the carrier provides one.
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        self.eta
    }
}

/// Parcel dimensions for a quote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    /// Length in millimetres.
    pub length_mm: u32,

    /// Width in millimetres.
    pub width_mm: u32,

    /// Height in millimetres.
    pub height_mm: u32,
}

/// The request shape sent to the carrier-rate collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest<'a> {
    /// Warehouse / origin region id.
    pub origin_id: u32,

    /// Where the parcel is going.
    pub destination: &'a Destination,

    /// Total parcel weight in grams.
    pub weight_grams: u32,

    /// Parcel dimensions, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,

    /// Carrier to quote.
    pub carrier_code: &'a Carrier,
}

/// Ticket handed out when a fetch begins; quoted back at apply time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// What [`QuoteSelector::apply_fetch`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The result belonged to the current inputs and was applied.
    Applied,

    /// The inputs changed while the fetch was in flight; the result was
    /// discarded.
    Superseded,
}

/// Coarse selector phase, for UI messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorPhase {
    /// Destination and carrier unknown.
    NoDestination,

    /// Destination known, carrier not yet chosen.
    AwaitingCarrier,

    /// A quote-list fetch is in flight.
    Fetching,

    /// Fetch succeeded with at least one quote.
    QuotesAvailable,

    /// Fetch succeeded with zero quotes for this destination/carrier pair.
    NoQuotes,

    /// Transport or server error; distinct from [`SelectorPhase::NoQuotes`]
    /// for messaging.
    FetchFailed,
}

#[derive(Debug)]
enum SelectorState<'a> {
    Idle,
    Fetching {
        generation: u64,
    },
    Quotes {
        quotes: Vec<ShippingQuote<'a>>,
        selected: usize,
    },
    NoQuotes,
    Failed {
        reason: String,
    },
}

/// Per-checkout-session shipping quote state machine.
#[derive(Debug)]
pub struct QuoteSelector<'a> {
    destination: Option<Destination>,
    carrier: Option<Carrier>,
    generation: u64,
    state: SelectorState<'a>,
}

impl Default for QuoteSelector<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> QuoteSelector<'a> {
    /// Creates a selector with no destination.
    #[must_use]
    pub fn new() -> Self {
        QuoteSelector {
            destination: None,
            carrier: None,
            generation: 0,
            state: SelectorState::Idle,
        }
    }

    /// The current destination, if set.
    #[must_use]
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// The current carrier, if chosen.
    #[must_use]
    pub fn carrier(&self) -> Option<&Carrier> {
        self.carrier.as_ref()
    }

    /// The coarse phase for UI messaging.
    #[must_use]
    pub fn phase(&self) -> SelectorPhase {
        match &self.state {
            SelectorState::Idle => {
                if self.destination.is_some() {
                    SelectorPhase::AwaitingCarrier
                } else {
                    SelectorPhase::NoDestination
                }
            }
            SelectorState::Fetching { .. } => SelectorPhase::Fetching,
            SelectorState::Quotes { .. } => SelectorPhase::QuotesAvailable,
            SelectorState::NoQuotes => SelectorPhase::NoQuotes,
            SelectorState::Failed { .. } => SelectorPhase::FetchFailed,
        }
    }

    /// The failure reason, when the last fetch failed.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            SelectorState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = SelectorState::Idle;
    }

    /// Sets or replaces the destination.
    ///
    /// Any actual change discards the chosen carrier, the fetched quotes and
    /// the selection; setting the same destination again is a no-op.
    pub fn set_destination(&mut self, destination: Destination) {
        if self.destination.as_ref() == Some(&destination) {
            return;
        }

        self.destination = Some(destination);
        self.carrier = None;
        self.invalidate();
    }

    /// Clears the destination, returning to the initial phase.
    pub fn clear_destination(&mut self) {
        self.destination = None;
        self.carrier = None;
        self.invalidate();
    }

    /// Chooses a carrier and enters the fetching phase.
    ///
    /// Choosing a carrier (including re-choosing the current one as a
    /// retry) clears any prior quotes and selection immediately. The
    /// returned ticket must be quoted back to
    /// [`QuoteSelector::apply_fetch`].
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::NoDestination`] when no destination is set.
    pub fn choose_carrier(&mut self, carrier: Carrier) -> Result<FetchTicket, SelectorError> {
        if self.destination.is_none() {
            return Err(SelectorError::NoDestination);
        }

        self.carrier = Some(carrier);
        self.generation = self.generation.wrapping_add(1);
        self.state = SelectorState::Fetching {
            generation: self.generation,
        };

        Ok(FetchTicket {
            generation: self.generation,
        })
    }

    /// Re-enters the fetching phase for the current destination/carrier pair.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::NoDestination`]: no destination is set.
    /// - [`SelectorError::NoCarrier`]: no carrier has been chosen.
    pub fn refetch(&mut self) -> Result<FetchTicket, SelectorError> {
        if self.destination.is_none() {
            return Err(SelectorError::NoDestination);
        }

        if self.carrier.is_none() {
            return Err(SelectorError::NoCarrier);
        }

        self.generation = self.generation.wrapping_add(1);
        self.state = SelectorState::Fetching {
            generation: self.generation,
        };

        Ok(FetchTicket {
            generation: self.generation,
        })
    }

    /// Applies a fetch outcome, if it still matches the current inputs.
    ///
    /// Last destination/carrier wins: a result carrying a stale ticket is
    /// discarded no matter when it arrives. A non-empty quote list
    /// auto-selects the first quote as the default; an empty list is the
    /// legitimate `NoQuotes` outcome, never a zero-cost fallback.
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<Vec<ShippingQuote<'a>>, String>,
    ) -> ApplyOutcome {
        let in_flight = matches!(
            self.state,
            SelectorState::Fetching { generation } if generation == ticket.generation
        );

        if !in_flight {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding superseded quote fetch result"
            );

            return ApplyOutcome::Superseded;
        }

        self.state = match outcome {
            Ok(quotes) if quotes.is_empty() => SelectorState::NoQuotes,
            Ok(quotes) => SelectorState::Quotes {
                quotes,
                selected: 0,
            },
            Err(reason) => {
                warn!(%reason, "quote fetch failed");

                SelectorState::Failed { reason }
            }
        };

        ApplyOutcome::Applied
    }

    /// Reselects a quote from the fetched set.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::NoQuotesAvailable`]: not in the quotes phase.
    /// - [`SelectorError::NoSuchQuote`]: index outside the fetched set.
    pub fn select(&mut self, index: usize) -> Result<&ShippingQuote<'a>, SelectorError> {
        match &mut self.state {
            SelectorState::Quotes { quotes, selected } => {
                let quote = quotes
                    .get(index)
                    .ok_or(SelectorError::NoSuchQuote(index))?;

                *selected = index;

                Ok(quote)
            }
            _ => Err(SelectorError::NoQuotesAvailable),
        }
    }

    /// The currently selected quote, if any.
    ///
    /// `None` in every phase except `QuotesAvailable`: the stale-quote
    /// invariant in one accessor.
    #[must_use]
    pub fn selected_quote(&self) -> Option<&ShippingQuote<'a>> {
        match &self.state {
            SelectorState::Quotes { quotes, selected } => quotes.get(*selected),
            _ => None,
        }
    }

    /// The fetched quote set (empty outside the quotes phase).
    #[must_use]
    pub fn quotes(&self) -> &[ShippingQuote<'a>] {
        match &self.state {
            SelectorState::Quotes { quotes, .. } => quotes,
            _ => &[],
        }
    }

    /// Builds the rate-lookup request for the current destination/carrier.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::NoDestination`]: no destination is set.
    /// - [`SelectorError::NoCarrier`]: no carrier has been chosen.
    pub fn quote_request(
        &self,
        origin_id: u32,
        weight_grams: u32,
        dimensions: Option<Dimensions>,
    ) -> Result<QuoteRequest<'_>, SelectorError> {
        let destination = self.destination.as_ref().ok_or(SelectorError::NoDestination)?;
        let carrier_code = self.carrier.as_ref().ok_or(SelectorError::NoCarrier)?;

        Ok(QuoteRequest {
            origin_id,
            destination,
            weight_grams,
            dimensions,
            carrier_code,
        })
    }
}

/// Raw quote row as the rate lookup returns it; every field optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuoteRow {
    #[serde(default)]
    service: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    cost: Option<i64>,

    #[serde(default)]
    etd: Option<String>,
}

/// Errors parsing a quote-fetch payload.
///
/// A malformed body is a failed fetch (transport-level); individually bad
/// rows inside a well-formed body are dropped instead.
#[derive(Debug, Error)]
pub enum QuotePayloadError {
    /// The payload was not a JSON array of rows.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Parses a carrier-rate payload into quotes, failing closed per row.
///
/// Rows without a usable non-negative cost are dropped and logged; an
/// unparseable delivery estimate becomes `None` rather than poisoning the
/// row.
///
/// # Errors
///
/// Returns [`QuotePayloadError::Json`] when the body itself is malformed.
pub fn parse_quote_payload(
    carrier: &Carrier,
    payload: &str,
    currency: &'static Currency,
) -> Result<Vec<ShippingQuote<'static>>, QuotePayloadError> {
    let rows: Vec<RawQuoteRow> = serde_json::from_str(payload)?;

    let quotes = rows
        .into_iter()
        .filter_map(|row| {
            let Some(cost) = row.cost.filter(|cost| *cost >= 0) else {
                warn!(
                    carrier = carrier.code(),
                    service = %row.service,
                    "dropping quote row without a usable cost"
                );

                return None;
            };

            Some(ShippingQuote::new(
                carrier.clone(),
                row.service,
                row.description,
                Money::from_minor(cost, currency),
                row.etd.as_deref().and_then(parse_etd),
            ))
        })
        .collect();

    Ok(quotes)
}

/// Parses a carrier delivery estimate like `"2-3"` (days) into a worst-case
/// duration. Unparseable estimates become `None`.
fn parse_etd(etd: &str) -> Option<Duration> {
    let upper = etd
        .split('-')
        .next_back()?
        .trim()
        .trim_end_matches(|c: char| c.is_alphabetic())
        .trim();

    let days: u64 = upper.parse().ok()?;

    Some(Duration::from_secs(days * 24 * 60 * 60))
}
