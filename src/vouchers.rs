//! Vouchers
//!
//! A voucher is a discount rule against a cart subtotal: a fixed amount or
//! an integer percentage. At most one voucher is active per checkout
//! session. Resolution is total; malformed upstream records clamp to a
//! safe discount instead of erroring, because a bad catalog row is not a
//! shopper mistake.

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::money::{self, percent_share};

/// The discount rule a voucher applies.
#[derive(Debug, Clone, PartialEq)]
pub enum VoucherKind<'a> {
    /// Take a fixed amount off the subtotal.
    Fixed(Money<'a, Currency>),

    /// Take an integer percentage (0..=100) off the subtotal.
    Percentage(i64),
}

/// A discount voucher from the external catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Voucher<'a> {
    id: String,
    code: String,
    kind: VoucherKind<'a>,
}

impl<'a> Voucher<'a> {
    /// Creates a voucher.
    #[must_use]
    pub fn new(id: impl Into<String>, code: impl Into<String>, kind: VoucherKind<'a>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            kind,
        }
    }

    /// Catalog identifier, echoed back on transaction submission.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The code the shopper typed.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The discount rule.
    #[must_use]
    pub fn kind(&self) -> &VoucherKind<'a> {
        &self.kind
    }
}

/// Computes the discount a voucher takes off a subtotal.
///
/// Total over all inputs, and clamped so the result is always in
/// `[0, subtotal]`:
///
/// - no voucher → zero
/// - fixed → `min(amount, subtotal)`, negative amounts treated as zero
/// - percentage → subtotal × p / 100, rounded half up, clamped; negative
///   or >100 percentages clamp before application
///
/// A fixed voucher denominated in a different currency than the subtotal
/// resolves to zero rather than propagating a mismatch into the breakdown.
#[must_use]
pub fn resolve_discount<'a>(
    voucher: Option<&Voucher<'a>>,
    subtotal: &Money<'a, Currency>,
) -> Money<'a, Currency> {
    let Some(voucher) = voucher else {
        return money::zero(subtotal.currency());
    };

    match voucher.kind() {
        VoucherKind::Fixed(amount) => {
            if amount.currency() != subtotal.currency() {
                warn!(
                    code = voucher.code(),
                    voucher_currency = amount.currency().iso_alpha_code,
                    subtotal_currency = subtotal.currency().iso_alpha_code,
                    "voucher currency mismatch; resolving to zero discount"
                );

                return money::zero(subtotal.currency());
            }

            let minor = amount.to_minor_units().max(0);
            let capped = minor.min(subtotal.to_minor_units().max(0));

            Money::from_minor(capped, subtotal.currency())
        }
        VoucherKind::Percentage(percent) => percent_share(subtotal, *percent),
    }
}

/// Raw voucher row as the catalog returns it.
///
/// Every field is optional upstream; parsing fails closed into defaults.
/// [`VoucherRecord::into_voucher`] carries the raw amounts through
/// unchanged; clamping happens once, in [`resolve_discount`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherRecord {
    /// Catalog identifier.
    #[serde(default)]
    pub id: String,

    /// Redemption code.
    #[serde(default)]
    pub code: String,

    /// Which of the two amounts applies.
    #[serde(default)]
    pub kind: VoucherRecordKind,

    /// Fixed amount in minor units; meaningful when `kind` is `fixed`.
    #[serde(default)]
    pub fixed_amount: i64,

    /// Integer percentage; meaningful when `kind` is `percentage`.
    #[serde(default)]
    pub percentage_amount: i64,
}

/// Discriminant for [`VoucherRecord`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherRecordKind {
    /// Fixed amount off.
    #[default]
    Fixed,

    /// Percentage off.
    Percentage,
}

impl VoucherRecord {
    /// Builds a [`Voucher`] in the storefront currency.
    #[must_use]
    pub fn into_voucher(self, currency: &'static Currency) -> Voucher<'static> {
        let kind = match self.kind {
            VoucherRecordKind::Fixed => {
                VoucherKind::Fixed(Money::from_minor(self.fixed_amount, currency))
            }
            VoucherRecordKind::Percentage => VoucherKind::Percentage(self.percentage_amount),
        };

        Voucher::new(self.id, self.code, kind)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{IDR, USD};

    use super::*;

    fn fixed(minor: i64) -> Voucher<'static> {
        Voucher::new("v1", "HEMAT", VoucherKind::Fixed(Money::from_minor(minor, IDR)))
    }

    fn percentage(percent: i64) -> Voucher<'static> {
        Voucher::new("v2", "DISKON", VoucherKind::Percentage(percent))
    }

    #[test]
    fn no_voucher_resolves_to_zero() {
        let subtotal = Money::from_minor(298_000, IDR);

        assert_eq!(
            resolve_discount(None, &subtotal),
            Money::from_minor(0, IDR)
        );
    }

    #[test]
    fn fixed_voucher_caps_at_subtotal() {
        let subtotal = Money::from_minor(10_000, IDR);

        assert_eq!(
            resolve_discount(Some(&fixed(25_000)), &subtotal),
            subtotal,
            "discount can never exceed the amount it discounts"
        );

        assert_eq!(
            resolve_discount(Some(&fixed(4_000)), &subtotal),
            Money::from_minor(4_000, IDR)
        );
    }

    #[test]
    fn negative_fixed_amount_clamps_to_zero() {
        let subtotal = Money::from_minor(10_000, IDR);

        assert_eq!(
            resolve_discount(Some(&fixed(-500)), &subtotal),
            Money::from_minor(0, IDR)
        );
    }

    #[test]
    fn percentage_voucher_rounds_half_up() {
        let subtotal = Money::from_minor(25, IDR);

        assert_eq!(
            resolve_discount(Some(&percentage(10)), &subtotal),
            Money::from_minor(3, IDR)
        );
    }

    #[test]
    fn percentage_voucher_on_catalog_subtotal() {
        let subtotal = Money::from_minor(298_000, IDR);

        assert_eq!(
            resolve_discount(Some(&percentage(10)), &subtotal),
            Money::from_minor(29_800, IDR)
        );
    }

    #[test]
    fn malformed_percentages_clamp() {
        let subtotal = Money::from_minor(1_000, IDR);

        assert_eq!(
            resolve_discount(Some(&percentage(-10)), &subtotal),
            Money::from_minor(0, IDR)
        );

        assert_eq!(
            resolve_discount(Some(&percentage(250)), &subtotal),
            subtotal
        );
    }

    #[test]
    fn percentage_is_monotonic_in_percent() {
        let subtotal = Money::from_minor(298_000, IDR);
        let mut previous = 0;

        for percent in 0..=100 {
            let discount = resolve_discount(Some(&percentage(percent)), &subtotal);
            let minor = discount.to_minor_units();

            assert!(minor >= previous, "discount decreased at p={percent}");
            assert!(minor <= subtotal.to_minor_units(), "discount over subtotal");

            previous = minor;
        }
    }

    #[test]
    fn foreign_currency_fixed_voucher_resolves_to_zero() {
        let subtotal = Money::from_minor(10_000, IDR);
        let voucher = Voucher::new(
            "v3",
            "USD5",
            VoucherKind::Fixed(Money::from_minor(500, USD)),
        );

        assert_eq!(
            resolve_discount(Some(&voucher), &subtotal),
            Money::from_minor(0, IDR)
        );
    }

    #[test]
    fn record_parses_fail_closed() {
        let record: VoucherRecord = serde_json::from_str("{}").unwrap_or_default();

        assert_eq!(record.kind, VoucherRecordKind::Fixed);
        assert_eq!(record.fixed_amount, 0);

        let voucher = record.into_voucher(IDR);
        let subtotal = Money::from_minor(5_000, IDR);

        assert_eq!(
            resolve_discount(Some(&voucher), &subtotal),
            Money::from_minor(0, IDR)
        );
    }

    #[test]
    fn record_builds_percentage_voucher() {
        let json = r#"{"id":"7","code":"WELCOME10","kind":"percentage","percentageAmount":10}"#;
        let record: VoucherRecord = serde_json::from_str(json).unwrap_or_default();
        let voucher = record.into_voucher(IDR);

        assert_eq!(voucher.code(), "WELCOME10");
        assert_eq!(voucher.kind(), &VoucherKind::Percentage(10));
    }
}
