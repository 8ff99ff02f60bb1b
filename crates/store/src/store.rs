use async_trait::async_trait;
use common::{OrderId, ProductId};

use crate::{Collection, Decrement, NewOrder, NewUser, Order, Product, Result, User};

/// Resolves customer identities by email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by exact email match.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Inserts a new user.
    ///
    /// Fails with `UniqueViolation` if the email is already taken.
    async fn create(&self, user: NewUser) -> Result<User>;

    /// Returns the user owning `user.email`, creating it if absent.
    ///
    /// Implementations must converge concurrent callers with the same new
    /// email on a single record.
    async fn find_or_create(&self, user: NewUser) -> Result<User>;
}

/// Read-only catalog queries.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Lists active collections.
    async fn list_collections(&self) -> Result<Vec<Collection>>;

    /// Lists products, optionally restricted to one collection by slug.
    async fn list_products(&self, collection_slug: Option<&str>) -> Result<Vec<Product>>;

    /// Fetches a single product by slug.
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>>;
}

/// Writes orders inside a unit of work.
#[async_trait]
pub trait OrderLedger: Send {
    /// Persists the order header and all of its lines.
    ///
    /// The returned order carries the identities assigned by storage.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;
}

/// Conditional stock decrements inside a unit of work.
#[async_trait]
pub trait InventoryLedger: Send {
    /// Decrements the `size` counter of `product_id` by `quantity` only if it
    /// currently holds at least `quantity`.
    ///
    /// The check and the write are a single conditioned statement; a
    /// concurrent unit can never observe the counter below zero.
    async fn conditional_decrement(
        &mut self,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Decrement>;
}

/// An atomic unit of work: everything written through it commits or rolls back together.
///
/// Dropping a unit without committing rolls it back.
#[async_trait]
pub trait UnitOfWork: OrderLedger + InventoryLedger {
    /// Makes every write of this unit visible.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this unit.
    async fn rollback(self) -> Result<()>;
}

/// Core trait for store implementations.
///
/// All implementations must be thread-safe (Send + Sync); a store handle is
/// created by the process entry point and passed to whoever needs it.
#[async_trait]
pub trait Store: UserDirectory + CatalogStore {
    type Unit: UnitOfWork + 'static;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Unit>;

    /// Loads a committed order with its lines.
    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>>;
}
