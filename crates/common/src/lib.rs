//! Shared types for the storefront backend.
//!
//! Identifiers are storage-assigned integers wrapped in newtypes so a
//! product id can never be passed where an order id is expected.

pub mod money;
pub mod size;
pub mod types;

pub use money::Money;
pub use size::{ParseSizeError, SizeToken};
pub use types::{CollectionId, OrderId, ProductId, UserId};
