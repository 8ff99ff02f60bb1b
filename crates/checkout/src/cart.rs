//! Validated cart handed to the transactor.

use common::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};
use store::{NewOrder, NewOrderLine, NewUser};

/// Contact details of the buyer; `email` identifies the user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub instagram: Option<String>,
    pub address: Option<String>,
}

impl Customer {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Fields used to create the user when the email is not known yet.
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            telegram: self.telegram.clone(),
            instagram: self.instagram.clone(),
            address: self.address.clone(),
        }
    }
}

/// One (product, size, quantity, price) entry.
///
/// `size` is kept as the client sent it; it is checked against the supported
/// sizes when the line is decremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartLine {
    pub fn new(
        product_id: ProductId,
        size: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            size: size.into(),
            quantity,
            unit_price,
        }
    }
}

/// A cart ready for placement. Lines are processed in the order given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub customer: Customer,
    pub lines: Vec<CartLine>,
    pub declared_total: Money,
    pub shipping_address: String,
    pub promo_code: Option<String>,
}

impl Cart {
    /// Starts a cart with no lines and a zero total.
    pub fn new(customer: Customer, shipping_address: impl Into<String>) -> Self {
        Self {
            customer,
            lines: Vec::new(),
            declared_total: Money::zero(),
            shipping_address: shipping_address.into(),
            promo_code: None,
        }
    }

    /// Appends a line and adds its price to the declared total.
    ///
    /// The running total saturates; use [`Cart::line_total`] to detect overflow.
    pub fn with_line(mut self, line: CartLine) -> Self {
        self.declared_total = self.declared_total + line.unit_price.multiply(line.quantity);
        self.lines.push(line);
        self
    }

    /// Overrides the declared total.
    pub fn with_declared_total(mut self, total: Money) -> Self {
        self.declared_total = total;
        self
    }

    /// Sum of price times quantity over all lines, or `None` if it overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.unit_price.checked_multiply(line.quantity)?)
        })
    }

    pub fn with_promo_code(mut self, code: impl Into<String>) -> Self {
        self.promo_code = Some(code.into());
        self
    }

    /// Order header and lines for `user_id`. Prices are taken from the cart as given.
    pub fn to_new_order(&self, user_id: UserId) -> NewOrder {
        NewOrder {
            user_id,
            total_amount: self.declared_total,
            promo_code: self.promo_code.clone(),
            shipping_address: self.shipping_address.clone(),
            lines: self
                .lines
                .iter()
                .map(|line| NewOrderLine {
                    product_id: line.product_id,
                    size: line.size.clone(),
                    quantity: line.quantity,
                    price_at_purchase: line.unit_price,
                })
                .collect(),
        }
    }
}
