//! Money and quantity primitives
//!
//! All monetary values are [`Money`] in minor units (rupiah, cents).
//! Anything that could introduce fractions (percentage application in
//! particular) goes through [`percent_share`], which rounds half up. There
//! is exactly one rounding rule in the crate and this is it.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors from checked money arithmetic.
#[derive(Debug, Error, PartialEq)]
pub enum MoneyMathError {
    /// Subtraction would have produced a negative amount.
    #[error("subtraction would go below zero: {minuend} - {subtrahend} minor units")]
    Underflow {
        /// Minor units of the amount being subtracted from.
        minuend: i64,
        /// Minor units of the amount being subtracted.
        subtrahend: i64,
    },

    /// Multiplication overflowed the minor-unit range.
    #[error("line total overflowed the representable amount range")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A line-item quantity, always at least 1.
///
/// A quantity of zero is not representable: a decrement past 1 returns `None`,
/// which callers treat as "remove the line".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u32);

impl Quantity {
    /// One unit.
    pub const ONE: Quantity = Quantity(1);

    /// Creates a quantity, rejecting zero.
    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Quantity(value))
    }

    /// Returns the underlying count.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns the quantity increased by one, saturating at `u32::MAX`.
    #[must_use]
    pub fn incremented(self) -> Self {
        Quantity(self.0.saturating_add(1))
    }

    /// Returns the quantity decreased by one, or `None` when already at 1.
    #[must_use]
    pub fn decremented(self) -> Option<Self> {
        Self::new(self.0.saturating_sub(1))
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A zero amount in the given currency.
#[must_use]
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(0, currency)
}

/// Adds two amounts.
///
/// # Errors
///
/// Returns [`MoneyMathError::Money`] on a currency mismatch.
pub fn add<'a>(
    a: Money<'a, Currency>,
    b: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, MoneyMathError> {
    Ok(a.add(b)?)
}

/// Subtracts `subtrahend` from `minuend`, refusing to go negative.
///
/// Callers that pre-clamp (like the discount resolver) never see the
/// underflow; callers that do not get it signalled instead of a negative
/// amount leaking into a total.
///
/// # Errors
///
/// - [`MoneyMathError::Underflow`]: the result would have been negative.
/// - [`MoneyMathError::Money`]: currency mismatch.
pub fn sub_or_underflow<'a>(
    minuend: Money<'a, Currency>,
    subtrahend: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, MoneyMathError> {
    let difference = minuend.sub(subtrahend)?;

    if difference.to_minor_units() < 0 {
        return Err(MoneyMathError::Underflow {
            minuend: minuend.to_minor_units(),
            subtrahend: subtrahend.to_minor_units(),
        });
    }

    Ok(difference)
}

/// Multiplies a unit price by a quantity.
///
/// # Errors
///
/// Returns [`MoneyMathError::Overflow`] if the product does not fit in the
/// minor-unit range.
pub fn line_total<'a>(
    unit_price: &Money<'a, Currency>,
    quantity: Quantity,
) -> Result<Money<'a, Currency>, MoneyMathError> {
    let minor = unit_price
        .to_minor_units()
        .checked_mul(i64::from(quantity.get()))
        .ok_or(MoneyMathError::Overflow)?;

    Ok(Money::from_minor(minor, unit_price.currency()))
}

/// Applies an integer percentage to an amount, rounding half up.
///
/// Total over all inputs: the percentage is clamped to `0..=100` and the
/// result is clamped to `[0, amount]`, so a malformed upstream percentage can
/// never produce a negative share or one larger than the amount itself.
#[must_use]
pub fn percent_share<'a>(amount: &Money<'a, Currency>, percent: i64) -> Money<'a, Currency> {
    let percent = percent.clamp(0, 100);
    let minor = amount.to_minor_units().max(0);

    let minor_dec = Decimal::from(minor);
    let share = minor_dec * Decimal::from(percent) / Decimal::ONE_HUNDRED;

    let rounded = share
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, minor_dec);

    // Clamped to [0, minor], so the conversion always fits.
    Money::from_minor(rounded.to_i64().unwrap_or(0), amount.currency())
}
