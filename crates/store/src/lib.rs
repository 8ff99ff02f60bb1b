//! Storage layer for the storefront backend.
//!
//! Exposes the user directory and catalog reads on the store itself, and the
//! order and inventory ledgers on an atomic [`UnitOfWork`] opened with
//! [`Store::begin`]. Two implementations share the contract: PostgreSQL for
//! production and an in-memory store for tests and local runs.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{CollectionId, Money, OrderId, ProductId, SizeToken, UserId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryUnit};
pub use model::{
    Collection, Decrement, MAX_LINE_QUANTITY, NewCollection, NewOrder, NewOrderLine, NewProduct,
    NewUser, Order, OrderLine, OrderStatus, Product, ProductImage, ProductStatus, Stock, User,
};
pub use postgres::{PostgresStore, PostgresUnit};
pub use store::{CatalogStore, InventoryLedger, OrderLedger, Store, UnitOfWork, UserDirectory};
