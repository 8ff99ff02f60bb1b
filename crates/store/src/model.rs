//! Storage model: users, catalog entries, orders and their lines.

use chrono::{DateTime, Utc};
use common::{CollectionId, Money, OrderId, ProductId, SizeToken, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// A customer identity, created lazily on first order and never mutated after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub instagram: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a user that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub instagram: Option<String>,
    pub address: Option<String>,
}

impl NewUser {
    /// Creates a user record with only the required fields set.
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub(crate) fn into_user(self, id: UserId, created_at: DateTime<Utc>) -> User {
        User {
            id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            telegram: self.telegram,
            instagram: self.instagram,
            address: self.address,
            created_at,
        }
    }
}

/// A catalog collection ("drop").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for seeding a collection.
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Publication status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Archived,
    #[default]
    Soon,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Archived => "archived",
            ProductStatus::Soon => "soon",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(ProductStatus::Available),
            "archived" => Ok(ProductStatus::Archived),
            "soon" => Ok(ProductStatus::Soon),
            other => Err(StoreError::DataCorruption(format!(
                "unknown product status {other:?}"
            ))),
        }
    }
}

/// One stock counter per supported size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stock {
    #[serde(rename = "stock_xs")]
    pub xs: u32,
    #[serde(rename = "stock_s")]
    pub s: u32,
    #[serde(rename = "stock_m")]
    pub m: u32,
    #[serde(rename = "stock_l")]
    pub l: u32,
    #[serde(rename = "stock_xl")]
    pub xl: u32,
    #[serde(rename = "stock_xxl")]
    pub xxl: u32,
    #[serde(rename = "stock_os")]
    pub os: u32,
}

impl Stock {
    /// Builds a stock table from `(size, count)` pairs; unnamed sizes stay at zero.
    pub fn with(levels: impl IntoIterator<Item = (SizeToken, u32)>) -> Self {
        let mut stock = Stock::default();
        for (size, count) in levels {
            *stock.counter_mut(size) = count;
        }
        stock
    }

    pub fn get(&self, size: SizeToken) -> u32 {
        match size {
            SizeToken::ExtraSmall => self.xs,
            SizeToken::Small => self.s,
            SizeToken::Medium => self.m,
            SizeToken::Large => self.l,
            SizeToken::ExtraLarge => self.xl,
            SizeToken::DoubleExtraLarge => self.xxl,
            SizeToken::OneSize => self.os,
        }
    }

    fn counter_mut(&mut self, size: SizeToken) -> &mut u32 {
        match size {
            SizeToken::ExtraSmall => &mut self.xs,
            SizeToken::Small => &mut self.s,
            SizeToken::Medium => &mut self.m,
            SizeToken::Large => &mut self.l,
            SizeToken::ExtraLarge => &mut self.xl,
            SizeToken::DoubleExtraLarge => &mut self.xxl,
            SizeToken::OneSize => &mut self.os,
        }
    }

    /// Subtracts `quantity` from the counter only if it holds at least that much.
    ///
    /// Returns whether the decrement was applied.
    pub fn decrement_if_available(&mut self, size: SizeToken, quantity: u32) -> bool {
        let counter = self.counter_mut(size);
        match counter.checked_sub(quantity) {
            Some(remaining) => {
                *counter = remaining;
                true
            }
            None => false,
        }
    }
}

/// An image attached to a product, shown in `display_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    pub display_order: i32,
}

/// A catalog product together with its collection, images and stock counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub collection: Collection,
    pub name: String,
    pub slug: String,
    pub product_type: Option<String>,
    pub description: Option<String>,
    pub base_price: Money,
    pub status: ProductStatus,
    pub stock: Stock,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
}

/// Fields for seeding a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub collection_id: CollectionId,
    pub name: String,
    pub slug: String,
    pub product_type: Option<String>,
    pub description: Option<String>,
    pub base_price: Money,
    pub status: ProductStatus,
    pub stock: Stock,
    pub images: Vec<ProductImage>,
}

/// Lifecycle status of an order. Placement always creates `Pending` orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(StoreError::DataCorruption(format!(
                "unknown order status {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted order line. `size` is the token exactly as the cart supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
    pub price_at_purchase: Money,
}

/// A persisted order with its lines in cart order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub promo_code: Option<String>,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// Largest quantity one order line or stock counter can hold (an SQL `INTEGER`).
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// A line to be written with a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
    pub price_at_purchase: Money,
}

/// An order header plus lines, written together by [`crate::OrderLedger::insert_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total_amount: Money,
    pub promo_code: Option<String>,
    pub shipping_address: String,
    pub lines: Vec<NewOrderLine>,
}

/// Outcome of a conditional decrement against one size counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decrement {
    /// The counter held at least the quantity and was reduced.
    Applied,
    /// The counter held less than the quantity; nothing changed.
    Insufficient,
    /// The size token is not one of the supported sizes; nothing changed.
    UnknownSize,
}

impl Decrement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decrement::Applied => "applied",
            Decrement::Insufficient => "insufficient",
            Decrement::UnknownSize => "unknown_size",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_decrement_applies_when_enough() {
        let mut stock = Stock::with([(SizeToken::Small, 2)]);
        assert!(stock.decrement_if_available(SizeToken::Small, 2));
        assert_eq!(stock.get(SizeToken::Small), 0);
    }

    #[test]
    fn stock_decrement_refuses_to_go_negative() {
        let mut stock = Stock::with([(SizeToken::Medium, 1)]);
        assert!(!stock.decrement_if_available(SizeToken::Medium, 2));
        assert_eq!(stock.get(SizeToken::Medium), 1);
        assert!(!stock.decrement_if_available(SizeToken::Large, 1));
    }

    #[test]
    fn stock_serializes_with_column_names() {
        let stock = Stock::with([(SizeToken::OneSize, 3)]);
        let json = serde_json::to_value(stock).unwrap();
        assert_eq!(json["stock_os"], 3);
        assert_eq!(json["stock_xs"], 0);
    }

    #[test]
    fn statuses_parse_their_own_names() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(matches!(
            ProductStatus::parse("gone"),
            Err(StoreError::DataCorruption(_))
        ));
    }
}
