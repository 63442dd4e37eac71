//! Cart
//!
//! An explicit line-item store. Mutations go through the cart so the
//! quantity invariant (every line ≥ 1) holds and subscribers hear about
//! every change; pricing stays a pure function over the current lines.

use std::fmt;

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    money::{self, MoneyMathError, Quantity},
    products::ProductKey,
};

/// Errors related to cart construction or mutation.
#[derive(Debug, Error)]
pub enum CartError {
    /// A line's currency differs from the cart currency (line currency, cart currency).
    #[error("line has currency {0}, but cart has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// No line exists for the given product.
    #[error("no cart line for product")]
    LineNotFound(ProductKey),
}

/// A change notification emitted after every successful cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEvent {
    /// A new line was created for the product.
    LineAdded(ProductKey),

    /// An existing line's quantity changed.
    QuantityChanged(ProductKey, Quantity),

    /// The line for the product was removed.
    LineRemoved(ProductKey),

    /// All lines were removed at once.
    Cleared,
}

/// One cart line: a product at a captured unit price, with a quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    product: ProductKey,
    unit_price: Money<'a, Currency>,
    quantity: Quantity,
}

impl<'a> CartLine<'a> {
    /// Creates a line with an explicit quantity.
    #[must_use]
    pub fn new(product: ProductKey, unit_price: Money<'a, Currency>, quantity: Quantity) -> Self {
        Self {
            product,
            unit_price,
            quantity,
        }
    }

    /// The product this line refers to.
    #[must_use]
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// The unit price captured when the line was created.
    #[must_use]
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// The line quantity.
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Unit price × quantity.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyMathError::Overflow`] if the product does not fit in
    /// the minor-unit range.
    pub fn line_total(&self) -> Result<Money<'a, Currency>, MoneyMathError> {
        money::line_total(&self.unit_price, self.quantity)
    }
}

/// Listener invoked with every [`CartEvent`].
type Listener = Box<dyn FnMut(&CartEvent)>;

/// Cart
pub struct Cart<'a> {
    lines: Vec<CartLine<'a>>,
    currency: &'static Currency,
    listeners: Vec<Listener>,
}

impl fmt::Debug for Cart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("lines", &self.lines)
            .field("currency", &self.currency.iso_alpha_code)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<'a> Cart<'a> {
    /// Creates an empty cart in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
            listeners: Vec::new(),
        }
    }

    /// Creates a cart from pre-built lines.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if any line's currency differs
    /// from the cart currency.
    pub fn with_lines(
        lines: impl Into<Vec<CartLine<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let lines = lines.into();

        lines.iter().try_for_each(|line| {
            let line_currency = line.unit_price().currency();

            if line_currency == currency {
                Ok(())
            } else {
                Err(CartError::CurrencyMismatch(
                    line_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ))
            }
        })?;

        Ok(Cart {
            lines,
            currency,
            listeners: Vec::new(),
        })
    }

    /// Registers a listener for subsequent cart events.
    pub fn subscribe(&mut self, listener: impl FnMut(&CartEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, event: CartEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    /// Adds one unit of a product, merging into an existing line if present.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the unit price is not in
    /// the cart currency.
    pub fn add(
        &mut self,
        product: ProductKey,
        unit_price: Money<'a, Currency>,
    ) -> Result<(), CartError> {
        if unit_price.currency() != self.currency {
            return Err(CartError::CurrencyMismatch(
                unit_price.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.product == product) {
            line.quantity = line.quantity.incremented();
            let event = CartEvent::QuantityChanged(product, line.quantity);

            self.notify(event);
        } else {
            self.lines
                .push(CartLine::new(product, unit_price, Quantity::ONE));

            self.notify(CartEvent::LineAdded(product));
        }

        Ok(())
    }

    /// Increments the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line exists for the product.
    pub fn increment(&mut self, product: ProductKey) -> Result<Quantity, CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product == product)
            .ok_or(CartError::LineNotFound(product))?;

        line.quantity = line.quantity.incremented();
        let quantity = line.quantity;

        self.notify(CartEvent::QuantityChanged(product, quantity));

        Ok(quantity)
    }

    /// Decrements the quantity of an existing line.
    ///
    /// A decrement at quantity 1 removes the line entirely and returns
    /// `None`; a zero-quantity line is never kept.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line exists for the product.
    pub fn decrement(&mut self, product: ProductKey) -> Result<Option<Quantity>, CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product == product)
            .ok_or(CartError::LineNotFound(product))?;

        let decremented = self
            .lines
            .get(index)
            .and_then(|line| line.quantity.decremented());

        match decremented {
            Some(quantity) => {
                if let Some(line) = self.lines.get_mut(index) {
                    line.quantity = quantity;
                }

                self.notify(CartEvent::QuantityChanged(product, quantity));

                Ok(Some(quantity))
            }
            None => {
                self.lines.remove(index);
                self.notify(CartEvent::LineRemoved(product));

                Ok(None)
            }
        }
    }

    /// Removes a line regardless of its quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line exists for the product.
    pub fn remove(&mut self, product: ProductKey) -> Result<(), CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product == product)
            .ok_or(CartError::LineNotFound(product))?;

        self.lines.remove(index);
        self.notify(CartEvent::LineRemoved(product));

        Ok(())
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.notify(CartEvent::Cleared);
    }

    /// Calculates the cart subtotal: Σ (unit price × quantity).
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyMathError`] if a line total overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, MoneyMathError> {
        self.lines
            .iter()
            .try_fold(money::zero(self.currency), |acc, line| {
                money::add(acc, line.line_total()?)
            })
    }

    /// Looks up the line for a product.
    #[must_use]
    pub fn get(&self, product: ProductKey) -> Option<&CartLine<'a>> {
        self.lines.iter().find(|line| line.product == product)
    }

    /// Iterates over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine<'a>> {
        self.lines.iter()
    }

    /// Number of lines (not units) in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The cart currency.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use rusty_money::iso::{IDR, USD};
    use slotmap::SlotMap;
    use testresult::TestResult;

    use super::*;

    fn keys(n: usize) -> Vec<ProductKey> {
        let mut map = SlotMap::<ProductKey, ()>::with_key();

        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn add_merges_into_existing_line() -> TestResult {
        let products = keys(1);
        let product = *products.first().ok_or("key")?;
        let mut cart = Cart::new(IDR);

        cart.add(product, Money::from_minor(149_000, IDR))?;
        cart.add(product, Money::from_minor(149_000, IDR))?;

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(product).map(|line| line.quantity().get()), Some(2));

        Ok(())
    }

    #[test]
    fn add_rejects_currency_mismatch() {
        let products = keys(1);
        let Some(&product) = products.first() else {
            return;
        };

        let mut cart = Cart::new(IDR);
        let result = cart.add(product, Money::from_minor(100, USD));

        assert!(matches!(result, Err(CartError::CurrencyMismatch(_, _))));
        assert!(cart.is_empty(), "failed add must not create a line");
    }

    #[test]
    fn decrement_removes_line_at_quantity_one() -> TestResult {
        let products = keys(1);
        let product = *products.first().ok_or("key")?;
        let mut cart = Cart::new(IDR);

        cart.add(product, Money::from_minor(50_000, IDR))?;
        cart.increment(product)?;

        assert_eq!(cart.decrement(product)?, Some(Quantity::ONE));
        assert_eq!(cart.decrement(product)?, None);
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn decrement_missing_line_errors() {
        let products = keys(1);
        let Some(&product) = products.first() else {
            return;
        };

        let mut cart = Cart::new(IDR);

        assert!(matches!(
            cart.decrement(product),
            Err(CartError::LineNotFound(_))
        ));
    }

    #[test]
    fn subtotal_sums_line_totals() -> TestResult {
        let products = keys(2);
        let first = *products.first().ok_or("key")?;
        let second = *products.get(1).ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(first, Money::from_minor(149_000, IDR))?;
        cart.increment(first)?;
        cart.add(second, Money::from_minor(35_000, IDR))?;

        assert_eq!(cart.subtotal()?, Money::from_minor(333_000, IDR));

        Ok(())
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() -> TestResult {
        let cart = Cart::new(IDR);

        assert_eq!(cart.subtotal()?, Money::from_minor(0, IDR));

        Ok(())
    }

    #[test]
    fn with_lines_validates_currency() -> TestResult {
        let products = keys(1);
        let product = *products.first().ok_or("key")?;

        let lines = [CartLine::new(
            product,
            Money::from_minor(100, USD),
            Quantity::ONE,
        )];

        assert!(matches!(
            Cart::with_lines(lines, IDR),
            Err(CartError::CurrencyMismatch("USD", "IDR"))
        ));

        Ok(())
    }

    #[test]
    fn subscribers_hear_every_mutation() -> TestResult {
        let products = keys(1);
        let product = *products.first().ok_or("key")?;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut cart = Cart::new(IDR);
        cart.subscribe(move |event| sink.borrow_mut().push(*event));

        cart.add(product, Money::from_minor(20_000, IDR))?;
        cart.increment(product)?;
        cart.remove(product)?;
        cart.clear();

        let two = Quantity::new(2).ok_or("quantity")?;

        assert_eq!(
            *seen.borrow(),
            vec![
                CartEvent::LineAdded(product),
                CartEvent::QuantityChanged(product, two),
                CartEvent::LineRemoved(product),
                CartEvent::Cleared,
            ]
        );

        Ok(())
    }

    #[test]
    fn iter_preserves_insertion_order() -> TestResult {
        let products = keys(2);
        let first = *products.first().ok_or("key")?;
        let second = *products.get(1).ok_or("key")?;

        let mut cart = Cart::new(IDR);
        cart.add(first, Money::from_minor(100, IDR))?;
        cart.add(second, Money::from_minor(200, IDR))?;

        let prices: Vec<i64> = cart
            .iter()
            .map(|line| line.unit_price().to_minor_units())
            .collect();

        assert_eq!(prices, vec![100, 200]);

        Ok(())
    }
}
