use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{CollectionId, OrderId, ProductId, SizeToken, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Collection, Decrement, MAX_LINE_QUANTITY, NewCollection, NewOrder, NewProduct, NewUser, Order,
    OrderLine, OrderStatus, Product, Result, Stock, StoreError, User,
    store::{CatalogStore, InventoryLedger, OrderLedger, Store, UnitOfWork, UserDirectory},
};

#[derive(Debug, Default)]
struct Sequences {
    user: i64,
    collection: i64,
    product: i64,
    order: i64,
    line: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct StoreState {
    users: BTreeMap<UserId, User>,
    collections: BTreeMap<CollectionId, Collection>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    seq: Sequences,
}

impl StoreState {
    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email == email)
    }

    fn insert_user(&mut self, user: NewUser) -> User {
        let id = UserId::new(next(&mut self.seq.user));
        let user = user.into_user(id, Utc::now());
        self.users.insert(id, user.clone());
        user
    }
}

#[derive(Debug, Default)]
struct Faults {
    users: AtomicBool,
    order_insert: AtomicBool,
    commit: AtomicBool,
}

/// In-memory store implementation for testing and local runs.
///
/// Units of work are serialized: a unit holds the store lock from `begin`
/// until it is committed or dropped, so uncommitted writes are never seen by
/// other callers.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection.
    pub async fn add_collection(&self, collection: NewCollection) -> Collection {
        let mut state = self.state.lock().await;
        let id = CollectionId::new(next(&mut state.seq.collection));
        let collection = Collection {
            id,
            name: collection.name,
            slug: collection.slug,
            description: collection.description,
            is_active: collection.is_active,
            created_at: Utc::now(),
        };
        state.collections.insert(id, collection.clone());
        collection
    }

    /// Seeds a product. Fails if the collection does not exist.
    pub async fn add_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.lock().await;
        let collection = state
            .collections
            .get(&product.collection_id)
            .cloned()
            .ok_or_else(|| StoreError::ForeignKeyViolation {
                constraint: "products_collection_id_fkey".to_string(),
            })?;
        if state.products.values().any(|p| p.slug == product.slug) {
            return Err(StoreError::UniqueViolation {
                constraint: "products_slug_key".to_string(),
            });
        }

        let id = ProductId::new(next(&mut state.seq.product));
        let mut images = product.images;
        images.sort_by_key(|i| i.display_order);
        let product = Product {
            id,
            collection,
            name: product.name,
            slug: product.slug,
            product_type: product.product_type,
            description: product.description,
            base_price: product.base_price,
            status: product.status,
            stock: product.stock,
            images,
            created_at: Utc::now(),
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    /// Returns the committed counter for one product size.
    pub async fn stock(&self, product_id: ProductId, size: SizeToken) -> Option<u32> {
        let state = self.state.lock().await;
        state.products.get(&product_id).map(|p| p.stock.get(size))
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Returns the number of stored users.
    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    /// Makes user directory calls fail.
    pub fn set_fail_on_users(&self, fail: bool) {
        self.faults.users.store(fail, Ordering::SeqCst);
    }

    /// Makes `insert_order` fail inside units.
    pub fn set_fail_on_order_insert(&self, fail: bool) {
        self.faults.order_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes `commit` fail; the unit's writes are discarded.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.faults.commit.store(fail, Ordering::SeqCst);
    }

    fn check_users(&self) -> Result<()> {
        if self.faults.users.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("user directory"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.check_users()?;
        let state = self.state.lock().await;
        Ok(state.user_by_email(email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        self.check_users()?;
        let mut state = self.state.lock().await;
        if state.user_by_email(&user.email).is_some() {
            return Err(StoreError::UniqueViolation {
                constraint: "users_email_key".to_string(),
            });
        }
        Ok(state.insert_user(user))
    }

    async fn find_or_create(&self, user: NewUser) -> Result<User> {
        self.check_users()?;
        let mut state = self.state.lock().await;
        if let Some(existing) = state.user_by_email(&user.email) {
            return Ok(existing.clone());
        }
        Ok(state.insert_user(user))
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_collections(&self) -> Result<Vec<Collection>> {
        let state = self.state.lock().await;
        Ok(state
            .collections
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn list_products(&self, collection_slug: Option<&str>) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .filter(|p| collection_slug.is_none_or(|slug| p.collection.slug == slug))
            .cloned()
            .collect())
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.products.values().find(|p| p.slug == slug).cloned())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Unit = InMemoryUnit;

    async fn begin(&self) -> Result<InMemoryUnit> {
        let guard = self.state.clone().lock_owned().await;
        Ok(InMemoryUnit {
            guard,
            orders: Vec::new(),
            stock: BTreeMap::new(),
            faults: self.faults.clone(),
        })
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&order_id).cloned())
    }
}

/// A unit of work over [`InMemoryStore`].
///
/// New orders and changed stock rows are staged here and written to the
/// locked state only by `commit`.
pub struct InMemoryUnit {
    guard: OwnedMutexGuard<StoreState>,
    orders: Vec<Order>,
    stock: BTreeMap<ProductId, Stock>,
    faults: Arc<Faults>,
}

#[async_trait]
impl OrderLedger for InMemoryUnit {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        if self.faults.order_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("order ledger"));
        }
        if let Some(line) = order.lines.iter().find(|l| l.quantity > MAX_LINE_QUANTITY) {
            return Err(StoreError::OutOfRange(format!("line quantity {}", line.quantity)));
        }
        let state = &mut *self.guard;
        if !state.users.contains_key(&order.user_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "orders_user_id_fkey".to_string(),
            });
        }
        if let Some(line) = order
            .lines
            .iter()
            .find(|l| !state.products.contains_key(&l.product_id))
        {
            tracing::debug!(product_id = %line.product_id, "order line references unknown product");
            return Err(StoreError::ForeignKeyViolation {
                constraint: "order_items_product_id_fkey".to_string(),
            });
        }

        // Like database sequences, ids are consumed even if the unit rolls back.
        let id = OrderId::new(next(&mut state.seq.order));
        let lines = order
            .lines
            .into_iter()
            .map(|l| OrderLine {
                id: next(&mut state.seq.line),
                product_id: l.product_id,
                size: l.size,
                quantity: l.quantity,
                price_at_purchase: l.price_at_purchase,
            })
            .collect();
        let order = Order {
            id,
            user_id: order.user_id,
            status: OrderStatus::Pending,
            total_amount: order.total_amount,
            promo_code: order.promo_code,
            shipping_address: order.shipping_address,
            created_at: Utc::now(),
            lines,
        };
        self.orders.push(order.clone());
        Ok(order)
    }
}

#[async_trait]
impl InventoryLedger for InMemoryUnit {
    async fn conditional_decrement(
        &mut self,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Decrement> {
        let Ok(size) = SizeToken::parse(size) else {
            return Ok(Decrement::UnknownSize);
        };
        let Some(committed) = self.guard.products.get(&product_id).map(|p| p.stock) else {
            return Ok(Decrement::Insufficient);
        };
        let stock = self.stock.entry(product_id).or_insert(committed);
        Ok(if stock.decrement_if_available(size, quantity) {
            Decrement::Applied
        } else {
            Decrement::Insufficient
        })
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnit {
    async fn commit(self) -> Result<()> {
        if self.faults.commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("commit"));
        }
        let InMemoryUnit {
            mut guard,
            orders,
            stock,
            ..
        } = self;
        for (product_id, levels) in stock {
            if let Some(product) = guard.products.get_mut(&product_id) {
                product.stock = levels;
            }
        }
        for order in orders {
            guard.orders.insert(order.id, order);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::Money;

    use super::*;
    use crate::{NewOrderLine, ProductStatus};

    async fn seeded_store(stock: Stock) -> (InMemoryStore, Product) {
        let store = InMemoryStore::new();
        let collection = store
            .add_collection(NewCollection {
                name: "Drop 01".to_string(),
                slug: "drop-01".to_string(),
                description: None,
                is_active: true,
            })
            .await;
        let product = store
            .add_product(NewProduct {
                collection_id: collection.id,
                name: "Hoodie".to_string(),
                slug: "hoodie".to_string(),
                product_type: Some("hoodie".to_string()),
                description: None,
                base_price: Money::from_minor(189_000),
                status: ProductStatus::Available,
                stock,
                images: vec![],
            })
            .await
            .unwrap();
        (store, product)
    }

    fn new_order(user_id: UserId, product_id: ProductId) -> NewOrder {
        NewOrder {
            user_id,
            total_amount: Money::from_minor(189_000),
            promo_code: None,
            shipping_address: "Kyiv".to_string(),
            lines: vec![NewOrderLine {
                product_id,
                size: "M".to_string(),
                quantity: 1,
                price_at_purchase: Money::from_minor(189_000),
            }],
        }
    }

    #[tokio::test]
    async fn decrement_applies_and_commits() {
        let (store, product) = seeded_store(Stock::with([(SizeToken::Small, 2)])).await;

        let mut unit = store.begin().await.unwrap();
        let outcome = unit.conditional_decrement(product.id, "S", 2).await.unwrap();
        assert_eq!(outcome, Decrement::Applied);
        unit.commit().await.unwrap();

        assert_eq!(store.stock(product.id, SizeToken::Small).await, Some(0));
    }

    #[tokio::test]
    async fn decrement_reports_insufficient_without_change() {
        let (store, product) = seeded_store(Stock::with([(SizeToken::Small, 1)])).await;

        let mut unit = store.begin().await.unwrap();
        let outcome = unit.conditional_decrement(product.id, "S", 2).await.unwrap();
        assert_eq!(outcome, Decrement::Insufficient);
        unit.commit().await.unwrap();

        assert_eq!(store.stock(product.id, SizeToken::Small).await, Some(1));
    }

    #[tokio::test]
    async fn decrement_reports_unknown_size() {
        let (store, product) = seeded_store(Stock::default()).await;

        let mut unit = store.begin().await.unwrap();
        let outcome = unit
            .conditional_decrement(product.id, "XXXL", 1)
            .await
            .unwrap();
        assert_eq!(outcome, Decrement::UnknownSize);
    }

    #[tokio::test]
    async fn decrement_on_missing_product_is_insufficient() {
        let (store, _) = seeded_store(Stock::default()).await;

        let mut unit = store.begin().await.unwrap();
        let outcome = unit
            .conditional_decrement(ProductId::new(999), "M", 1)
            .await
            .unwrap();
        assert_eq!(outcome, Decrement::Insufficient);
    }

    #[tokio::test]
    async fn dropped_unit_discards_writes() {
        let (store, product) = seeded_store(Stock::with([(SizeToken::Medium, 3)])).await;
        let user = store
            .find_or_create(NewUser::new("Ann", "ann@example.com"))
            .await
            .unwrap();

        {
            let mut unit = store.begin().await.unwrap();
            unit.insert_order(new_order(user.id, product.id))
                .await
                .unwrap();
            unit.conditional_decrement(product.id, "M", 1)
                .await
                .unwrap();
        }

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.stock(product.id, SizeToken::Medium).await, Some(3));
    }

    #[tokio::test]
    async fn failed_commit_discards_writes() {
        let (store, product) = seeded_store(Stock::with([(SizeToken::Medium, 3)])).await;
        let user = store
            .find_or_create(NewUser::new("Ann", "ann@example.com"))
            .await
            .unwrap();
        store.set_fail_on_commit(true);

        let mut unit = store.begin().await.unwrap();
        unit.insert_order(new_order(user.id, product.id))
            .await
            .unwrap();
        unit.conditional_decrement(product.id, "M", 1)
            .await
            .unwrap();
        assert!(matches!(
            unit.commit().await,
            Err(StoreError::Unavailable(_))
        ));

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.stock(product.id, SizeToken::Medium).await, Some(3));
    }

    #[tokio::test]
    async fn insert_order_assigns_identities() {
        let (store, product) = seeded_store(Stock::default()).await;
        let user = store
            .find_or_create(NewUser::new("Ann", "ann@example.com"))
            .await
            .unwrap();

        let mut unit = store.begin().await.unwrap();
        let order = unit
            .insert_order(new_order(user.id, product.id))
            .await
            .unwrap();
        unit.commit().await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.lines.len(), 1);
        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn insert_order_rejects_unknown_product() {
        let (store, _) = seeded_store(Stock::default()).await;
        let user = store
            .find_or_create(NewUser::new("Ann", "ann@example.com"))
            .await
            .unwrap();

        let mut unit = store.begin().await.unwrap();
        let result = unit
            .insert_order(new_order(user.id, ProductId::new(404)))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn insert_order_rejects_quantity_beyond_column_range() {
        let (store, product) = seeded_store(Stock::default()).await;
        let user = store
            .find_or_create(NewUser::new("Ann", "ann@example.com"))
            .await
            .unwrap();

        let mut order = new_order(user.id, product.id);
        order.lines[0].quantity = MAX_LINE_QUANTITY + 1;
        let mut unit = store.begin().await.unwrap();
        let result = unit.insert_order(order).await;

        assert!(matches!(result, Err(StoreError::OutOfRange(_))));
    }

    #[tokio::test]
    async fn find_or_create_reuses_existing_user() {
        let store = InMemoryStore::new();
        let first = store
            .find_or_create(NewUser::new("Ann", "ann@example.com"))
            .await
            .unwrap();
        let second = store
            .find_or_create(NewUser::new("Ann B.", "ann@example.com"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.full_name, "Ann");
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = InMemoryStore::new();
        store
            .create(NewUser::new("Ann", "ann@example.com"))
            .await
            .unwrap();
        let result = store.create(NewUser::new("Ann", "ann@example.com")).await;
        assert!(matches!(result, Err(StoreError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn catalog_filters_by_collection_and_activity() {
        let (store, product) = seeded_store(Stock::default()).await;
        store
            .add_collection(NewCollection {
                name: "Archive".to_string(),
                slug: "archive".to_string(),
                description: None,
                is_active: false,
            })
            .await;

        assert_eq!(store.list_collections().await.unwrap().len(), 1);
        assert_eq!(store.list_products(None).await.unwrap().len(), 1);
        assert_eq!(
            store.list_products(Some("drop-01")).await.unwrap()[0].id,
            product.id
        );
        assert!(store.list_products(Some("archive")).await.unwrap().is_empty());
        assert!(store.product_by_slug("hoodie").await.unwrap().is_some());
        assert!(store.product_by_slug("missing").await.unwrap().is_none());
    }
}
