//! Products

use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// A catalog product.
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Upstream catalog identifier.
    pub id: String,

    /// Product name.
    pub name: String,

    /// Unit price.
    pub price: Money<'a, Currency>,
}

impl Product<'_> {
    /// Captures the denormalized snapshot persisted alongside cart lines.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            unit_price_minor: self.price.to_minor_units(),
            currency: self.price.currency().iso_alpha_code.to_string(),
        }
    }
}

/// The denormalized product copy stored with a persisted cart line.
///
/// Snapshots survive catalog changes: a stored cart renders with the price
/// the shopper saw, not the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Upstream catalog identifier.
    pub id: String,

    /// Product name at capture time.
    pub name: String,

    /// Unit price in minor units at capture time.
    pub unit_price_minor: i64,

    /// ISO alpha code of the snapshot currency.
    pub currency: String,
}

impl ProductSnapshot {
    /// Resolves the snapshot currency against the ISO table.
    #[must_use]
    pub fn currency(&self) -> Option<&'static Currency> {
        iso::find(&self.currency)
    }

    /// Rebuilds the unit price, if the snapshot currency is a known ISO code.
    #[must_use]
    pub fn unit_price(&self) -> Option<Money<'static, Currency>> {
        self.currency()
            .map(|currency| Money::from_minor(self.unit_price_minor, currency))
    }
}
