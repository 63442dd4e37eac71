//! Cart persistence
//!
//! The client-local cart store: a JSON list of `{productSnapshot, quantity}`
//! rows, rewritten atomically (temp file + rename) on every save so a crash
//! mid-write never leaves a half-serialized cart behind. Loading fails
//! closed per row: zero quantities and foreign-currency snapshots are
//! dropped with a log line, duplicate product rows are merged.

use std::{fs, io, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use thiserror::Error;
use tracing::warn;

use crate::{
    cart::{Cart, CartError, CartLine},
    money::Quantity,
    products::{Product, ProductKey, ProductSnapshot},
};

/// Errors reading or writing the persisted cart.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The stored file is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Cart reconstruction failed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// One persisted cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLine {
    /// Denormalized product copy captured at add-to-cart time.
    pub product_snapshot: ProductSnapshot,

    /// Units in the cart.
    pub quantity: u32,
}

/// File-backed cart store.
#[derive(Debug, Clone)]
pub struct CartStore {
    path: PathBuf,
}

impl CartStore {
    /// Creates a store at the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CartStore { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Persists the cart, resolving snapshots from the catalog.
    ///
    /// Lines whose product is missing from the catalog are skipped with a
    /// log line rather than failing the whole save. The write is atomic:
    /// serialized to a sibling temp file, then renamed over the target.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] or [`StorageError::Json`] on write or
    /// serialization failure.
    pub fn save(
        &self,
        cart: &Cart<'_>,
        products: &SlotMap<ProductKey, Product<'_>>,
    ) -> Result<(), StorageError> {
        let rows: Vec<StoredLine> = cart
            .iter()
            .filter_map(|line| {
                let Some(product) = products.get(line.product()) else {
                    warn!("skipping cart line with no catalog product");

                    return None;
                };

                Some(StoredLine {
                    product_snapshot: product.snapshot(),
                    quantity: line.quantity().get(),
                })
            })
            .collect();

        let body = serde_json::to_vec_pretty(&rows)?;

        let tmp_path = self.path.with_extension("tmp");

        fs::write(&tmp_path, body)?;
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Loads the persisted rows, merged and cleaned.
    ///
    /// A missing file is an empty cart. Duplicate rows for the same product
    /// id merge (first snapshot wins, quantities sum); rows with a zero
    /// quantity are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Json`] when the file exists but is not a
    /// valid row list, or [`StorageError::Io`] on read failure.
    pub fn load(&self) -> Result<Vec<StoredLine>, StorageError> {
        let body = match fs::read(&self.path) {
            Ok(body) => body,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let rows: Vec<StoredLine> = serde_json::from_slice(&body)?;

        let mut merged: Vec<StoredLine> = Vec::with_capacity(rows.len());
        let mut index: FxHashMap<String, usize> = FxHashMap::default();

        for row in rows {
            if row.quantity == 0 {
                warn!(product = %row.product_snapshot.id, "dropping zero-quantity row");

                continue;
            }

            if let Some(&at) = index.get(&row.product_snapshot.id) {
                if let Some(existing) = merged.get_mut(at) {
                    existing.quantity = existing.quantity.saturating_add(row.quantity);
                }
            } else {
                index.insert(row.product_snapshot.id.clone(), merged.len());
                merged.push(row);
            }
        }

        Ok(merged)
    }

    /// Rebuilds a cart in the storefront currency, registering snapshot
    /// products into the catalog.
    ///
    /// Rows in a different (or unknown) currency are dropped with a log
    /// line; a stale snapshot must not poison the live cart.
    ///
    /// # Errors
    ///
    /// Propagates [`StorageError::Io`] / [`StorageError::Json`] from
    /// [`CartStore::load`].
    pub fn restore(
        &self,
        currency: &'static Currency,
        products: &mut SlotMap<ProductKey, Product<'static>>,
    ) -> Result<Cart<'static>, StorageError> {
        let rows = self.load()?;

        let mut lines = Vec::with_capacity(rows.len());

        for row in rows {
            let Some(unit_price) = row.product_snapshot.unit_price() else {
                warn!(
                    product = %row.product_snapshot.id,
                    currency = %row.product_snapshot.currency,
                    "dropping row with unknown snapshot currency"
                );

                continue;
            };

            if unit_price.currency() != currency {
                warn!(
                    product = %row.product_snapshot.id,
                    currency = %row.product_snapshot.currency,
                    "dropping row in a foreign currency"
                );

                continue;
            }

            let Some(quantity) = Quantity::new(row.quantity) else {
                continue;
            };

            let key = products.insert(Product {
                id: row.product_snapshot.id.clone(),
                name: row.product_snapshot.name.clone(),
                price: unit_price,
            });

            lines.push(CartLine::new(key, unit_price, quantity));
        }

        Ok(Cart::with_lines(lines, currency)?)
    }
}
