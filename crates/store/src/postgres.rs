use std::collections::HashMap;

use async_trait::async_trait;
use common::{CollectionId, Money, OrderId, ProductId, SizeToken, UserId};
use sqlx::{
    PgPool, Postgres, Row, Transaction,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    Collection, Decrement, NewOrder, NewUser, Order, OrderLine, OrderStatus, Product,
    ProductImage, ProductStatus, Result, Stock, StoreError, User,
    store::{CatalogStore, InventoryLedger, OrderLedger, Store, UnitOfWork, UserDirectory},
};

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.slug, p.type, p.description, p.base_price, p.status,
           p.stock_xs, p.stock_s, p.stock_m, p.stock_l, p.stock_xl, p.stock_xxl, p.stock_os,
           p.created_at,
           c.id AS collection_id, c.name AS collection_name, c.slug AS collection_slug,
           c.description AS collection_description, c.is_active AS collection_is_active,
           c.created_at AS collection_created_at
    FROM products p
    JOIN collections c ON c.id = p.collection_id
"#;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            telegram: row.try_get("telegram")?,
            instagram: row.try_get("instagram")?,
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_collection(row: &PgRow, prefix: &str) -> Result<Collection> {
        let col = |name: &str| format!("{prefix}{name}");
        Ok(Collection {
            id: CollectionId::new(row.try_get(col("id").as_str())?),
            name: row.try_get(col("name").as_str())?,
            slug: row.try_get(col("slug").as_str())?,
            description: row.try_get(col("description").as_str())?,
            is_active: row.try_get(col("is_active").as_str())?,
            created_at: row.try_get(col("created_at").as_str())?,
        })
    }

    fn row_to_product(row: &PgRow, images: Vec<ProductImage>) -> Result<Product> {
        let counter = |size: SizeToken| -> Result<u32> {
            let value: i32 = row.try_get(size.stock_column())?;
            u32::try_from(value).map_err(|_| {
                StoreError::DataCorruption(format!("negative {} counter: {value}", size))
            })
        };
        let status: String = row.try_get("status")?;

        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            collection: Self::row_to_collection(row, "collection_")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            product_type: row.try_get("type")?,
            description: row.try_get("description")?,
            base_price: Money::from_minor(row.try_get("base_price")?),
            status: ProductStatus::parse(&status)?,
            stock: Stock {
                xs: counter(SizeToken::ExtraSmall)?,
                s: counter(SizeToken::Small)?,
                m: counter(SizeToken::Medium)?,
                l: counter(SizeToken::Large)?,
                xl: counter(SizeToken::ExtraLarge)?,
                xxl: counter(SizeToken::DoubleExtraLarge)?,
                os: counter(SizeToken::OneSize)?,
            },
            images,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Attaches images to product rows, keeping row order.
    async fn hydrate_products(&self, rows: Vec<PgRow>) -> Result<Vec<Product>> {
        let ids = rows
            .iter()
            .map(|r| r.try_get::<i64, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut images: HashMap<i64, Vec<ProductImage>> = HashMap::new();
        if !ids.is_empty() {
            let image_rows = sqlx::query(
                r#"
                SELECT product_id, url, display_order
                FROM product_images
                WHERE product_id = ANY($1)
                ORDER BY product_id, display_order, id
                "#,
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

            for row in image_rows {
                images
                    .entry(row.try_get("product_id")?)
                    .or_default()
                    .push(ProductImage {
                        url: row.try_get("url")?,
                        display_order: row.try_get("display_order")?,
                    });
            }
        }

        rows.iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_product(row, images.remove(&id).unwrap_or_default()))
            .collect()
    }
}

#[async_trait]
impl UserDirectory for PostgresStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, email, phone, telegram, instagram, address, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (full_name, email, phone, telegram, instagram, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, full_name, email, phone, telegram, instagram, address, created_at
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.telegram)
        .bind(&user.instagram)
        .bind(&user.address)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_database)?;

        Self::row_to_user(row)
    }

    #[tracing::instrument(level = "debug", skip(self, user), fields(email = %user.email))]
    async fn find_or_create(&self, user: NewUser) -> Result<User> {
        // A concurrent insert of the same email makes this wait for the other
        // transaction; once it commits the conflict yields no row and the
        // follow-up read sees the winner.
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (full_name, email, phone, telegram, instagram, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, full_name, email, phone, telegram, instagram, address, created_at
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.telegram)
        .bind(&user.instagram)
        .bind(&user.address)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_database)?;

        if let Some(row) = inserted {
            tracing::debug!("created user");
            return Self::row_to_user(row);
        }

        self.find_by_email(&user.email)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user with email {}", user.email)))
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn list_collections(&self) -> Result<Vec<Collection>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, slug, description, is_active, created_at
            FROM collections
            WHERE is_active = TRUE
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Self::row_to_collection(row, ""))
            .collect()
    }

    async fn list_products(&self, collection_slug: Option<&str>) -> Result<Vec<Product>> {
        let sql = format!("{PRODUCT_SELECT} WHERE ($1::TEXT IS NULL OR c.slug = $1) ORDER BY p.id ASC");
        let rows = sqlx::query(&sql)
            .bind(collection_slug)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_products(rows).await
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.slug = $1");
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate_products(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Unit = PostgresUnit;

    async fn begin(&self) -> Result<PostgresUnit> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnit { tx })
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, user_id, status, total_amount, promo_code, shipping_address, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let line_rows = sqlx::query(
            r#"
            SELECT id, product_id, size, quantity, price_at_purchase
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let lines = line_rows
            .into_iter()
            .map(|r| -> Result<OrderLine> {
                let quantity: i32 = r.try_get("quantity")?;
                Ok(OrderLine {
                    id: r.try_get("id")?,
                    product_id: ProductId::new(r.try_get("product_id")?),
                    size: r.try_get("size")?,
                    quantity: u32::try_from(quantity).map_err(|_| {
                        StoreError::DataCorruption(format!("negative line quantity {quantity}"))
                    })?,
                    price_at_purchase: Money::from_minor(r.try_get("price_at_purchase")?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let status: String = row.try_get("status")?;
        Ok(Some(Order {
            id: OrderId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            status: OrderStatus::parse(&status)?,
            total_amount: Money::from_minor(row.try_get("total_amount")?),
            promo_code: row.try_get("promo_code")?,
            shipping_address: row.try_get("shipping_address")?,
            created_at: row.try_get("created_at")?,
            lines,
        }))
    }
}

/// A unit of work backed by a PostgreSQL transaction.
///
/// Dropping the unit without committing rolls the transaction back.
pub struct PostgresUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderLedger for PostgresUnit {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let header = sqlx::query(
            r#"
            INSERT INTO orders (user_id, status, total_amount, promo_code, shipping_address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(order.user_id.as_i64())
        .bind(OrderStatus::Pending.as_str())
        .bind(order.total_amount.minor())
        .bind(&order.promo_code)
        .bind(&order.shipping_address)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(StoreError::from_database)?;

        let order_id: i64 = header.try_get("id")?;

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in order.lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                StoreError::OutOfRange(format!("line quantity {}", line.quantity))
            })?;
            let line_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_items (order_id, product_id, size, quantity, price_at_purchase)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(order_id)
            .bind(line.product_id.as_i64())
            .bind(&line.size)
            .bind(quantity)
            .bind(line.price_at_purchase.minor())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(StoreError::from_database)?;

            lines.push(OrderLine {
                id: line_id,
                product_id: line.product_id,
                size: line.size,
                quantity: line.quantity,
                price_at_purchase: line.price_at_purchase,
            });
        }

        Ok(Order {
            id: OrderId::new(order_id),
            user_id: order.user_id,
            status: OrderStatus::Pending,
            total_amount: order.total_amount,
            promo_code: order.promo_code,
            shipping_address: order.shipping_address,
            created_at: header.try_get("created_at")?,
            lines,
        })
    }
}

#[async_trait]
impl InventoryLedger for PostgresUnit {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn conditional_decrement(
        &mut self,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<Decrement> {
        let Ok(size) = SizeToken::parse(size) else {
            return Ok(Decrement::UnknownSize);
        };
        // No INTEGER counter can hold more than i32::MAX units.
        let Ok(quantity) = i32::try_from(quantity) else {
            return Ok(Decrement::Insufficient);
        };

        // Check and write in one statement: a concurrent unit updating the same
        // row blocks here and the predicate is re-evaluated against its result.
        let column = size.stock_column();
        let sql = format!(
            "UPDATE products SET {column} = {column} - $1 WHERE id = $2 AND {column} >= $1"
        );
        let result = sqlx::query(&sql)
            .bind(quantity)
            .bind(product_id.as_i64())
            .execute(&mut *self.tx)
            .await
            .map_err(StoreError::from_database)?;

        Ok(if result.rows_affected() == 1 {
            Decrement::Applied
        } else {
            Decrement::Insufficient
        })
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnit {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
