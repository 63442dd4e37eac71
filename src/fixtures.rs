//! Fixtures
//!
//! YAML fixture sets for examples and tests: a product catalog, a voucher
//! list and canned carrier quotes per named set under `./fixtures/<set>/`.

use std::{fs, path::PathBuf, time::Duration};

use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    products::{Product, ProductKey},
    shipping::{Carrier, ShippingQuote},
    vouchers::{Voucher, VoucherRecord},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Cart construction error
    #[error("Failed to build cart: {0}")]
    Cart(#[from] CartError),
}

#[derive(Debug, Deserialize)]
struct ProductsFile {
    currency: String,
    products: Vec<ProductRow>,
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: String,
    name: String,
    price: i64,
}

#[derive(Debug, Deserialize)]
struct VouchersFile {
    vouchers: Vec<VoucherRecord>,
}

#[derive(Debug, Deserialize)]
struct QuotesFile {
    quotes: Vec<QuoteRow>,
}

#[derive(Debug, Deserialize)]
struct QuoteRow {
    carrier: String,
    service: String,
    #[serde(default)]
    description: String,
    cost: i64,
    #[serde(default)]
    etd_days: Option<u64>,
}

/// A loaded fixture set.
#[derive(Debug)]
pub struct Fixture<'a> {
    currency: &'static Currency,
    products: SlotMap<ProductKey, Product<'a>>,
    product_keys: FxHashMap<String, ProductKey>,
    vouchers: Vec<Voucher<'a>>,
    quotes: Vec<ShippingQuote<'a>>,
}

impl Fixture<'_> {
    /// Loads the named fixture set from the default `./fixtures` base path.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] when a file is missing, malformed, or
    /// names an unknown currency.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::with_base_path("./fixtures", name)
    }

    /// Loads the named fixture set from a custom base path.
    ///
    /// `products.yaml` is required; `vouchers.yaml` and `quotes.yaml` are
    /// optional and default to empty.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] when a file is missing, malformed, or
    /// names an unknown currency.
    pub fn with_base_path(base: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let set_path = base.into().join(name);

        let products_file: ProductsFile =
            serde_norway::from_str(&fs::read_to_string(set_path.join("products.yaml"))?)?;

        let currency = iso::find(&products_file.currency)
            .ok_or_else(|| FixtureError::UnknownCurrency(products_file.currency.clone()))?;

        let mut products = SlotMap::with_key();
        let mut product_keys = FxHashMap::default();

        for row in products_file.products {
            let key = products.insert(Product {
                id: row.id.clone(),
                name: row.name,
                price: Money::from_minor(row.price, currency),
            });

            product_keys.insert(row.id, key);
        }

        let vouchers = match fs::read_to_string(set_path.join("vouchers.yaml")) {
            Ok(body) => {
                let file: VouchersFile = serde_norway::from_str(&body)?;

                file.vouchers
                    .into_iter()
                    .map(|record| record.into_voucher(currency))
                    .collect()
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(error) => return Err(error.into()),
        };

        let quotes = match fs::read_to_string(set_path.join("quotes.yaml")) {
            Ok(body) => {
                let file: QuotesFile = serde_norway::from_str(&body)?;

                file.quotes
                    .into_iter()
                    .map(|row| {
                        ShippingQuote::new(
                            Carrier::new(row.carrier),
                            row.service,
                            row.description,
                            Money::from_minor(row.cost, currency),
                            row.etd_days.map(|days| Duration::from_secs(days * 86_400)),
                        )
                    })
                    .collect()
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(error) => return Err(error.into()),
        };

        Ok(Fixture {
            currency,
            products,
            product_keys,
            vouchers,
            quotes,
        })
    }
}

impl<'a> Fixture<'a> {
    /// The fixture set currency.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// The product catalog.
    #[must_use]
    pub fn products(&self) -> &SlotMap<ProductKey, Product<'a>> {
        &self.products
    }

    /// Looks up a product key by its fixture id.
    #[must_use]
    pub fn product_key(&self, id: &str) -> Option<ProductKey> {
        self.product_keys.get(id).copied()
    }

    /// Looks up a voucher by its redemption code.
    #[must_use]
    pub fn voucher_by_code(&self, code: &str) -> Option<&Voucher<'a>> {
        self.vouchers.iter().find(|voucher| voucher.code() == code)
    }

    /// Quotes offered by the given carrier.
    #[must_use]
    pub fn quotes_for(&self, carrier: &Carrier) -> Vec<ShippingQuote<'a>> {
        self.quotes
            .iter()
            .filter(|quote| quote.carrier() == carrier)
            .cloned()
            .collect()
    }

    /// Builds a cart with the given `(product id, quantity)` picks.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::ProductNotFound`] for an unknown id.
    pub fn cart(&self, picks: &[(&str, u32)]) -> Result<Cart<'a>, FixtureError> {
        let mut cart = Cart::new(self.currency);

        for (id, quantity) in picks {
            let key = self
                .product_key(id)
                .ok_or_else(|| FixtureError::ProductNotFound((*id).to_string()))?;

            let price = self
                .products
                .get(key)
                .ok_or_else(|| FixtureError::ProductNotFound((*id).to_string()))?
                .price;

            for _ in 0..*quantity {
                cart.add(key, price)?;
            }
        }

        Ok(cart)
    }
}
