//! Order placement for the storefront.
//!
//! [`OrderPlacer::place_order`] turns a validated [`Cart`] into a persisted
//! order in four steps:
//! 1. Find or create the buyer by email
//! 2. Open one atomic unit of work and write the order header and lines
//! 3. Conditionally decrement the stock counter of every line, in cart order
//! 4. Commit
//!
//! The first line whose counter cannot cover its quantity, or whose size is
//! not a supported size, rolls the unit back and fails the whole placement.

pub mod cart;
pub mod error;
pub mod placer;
pub mod state;

pub use cart::{Cart, CartLine, Customer};
pub use error::PlacementError;
pub use placer::OrderPlacer;
pub use state::PlacementState;
