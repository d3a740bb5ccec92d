use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use storefront_types::domain::order::{Order, OrderItem};
use storefront_types::domain::review::Review;
use storefront_types::domain::status::OrderStatus;
use storefront_types::ports::catalog::CatalogLookup;
use storefront_types::ports::order_store::OrderStore;
use storefront_types::ports::review_store::ReviewStore;
use storefront_types::ports::StoreError;

/// SQLite adapter. Orders and their items live in separate tables; every
/// `save_order` rewrites the whole aggregate inside one transaction so the
/// stored total and the stored item rows always move together.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

fn store_err<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(store_err)
}

fn parse_decimal(raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw).map_err(store_err)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(store_err)
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    delivery_address: Option<String>,
    quantity: i64,
    total_amount: String,
    status: String,
    order_date: String,
    delivery_date: Option<String>,
    special_notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        Ok(Order {
            id: parse_uuid(&self.id)?,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            delivery_address: self.delivery_address,
            quantity: u32::try_from(self.quantity).map_err(store_err)?,
            total_amount: parse_decimal(&self.total_amount)?,
            status: self.status.parse::<OrderStatus>().map_err(store_err)?,
            order_date: parse_timestamp(&self.order_date)?,
            delivery_date: self
                .delivery_date
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            special_notes: self.special_notes,
            items,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbItem {
    id: String,
    order_id: String,
    product_id: String,
    product_name: String,
    product_description: Option<String>,
    unit_price: String,
    quantity: i64,
    total_price: String,
    special_instructions: Option<String>,
}

impl DbItem {
    fn into_item(self) -> Result<OrderItem, StoreError> {
        Ok(OrderItem {
            id: parse_uuid(&self.id)?,
            order_id: parse_uuid(&self.order_id)?,
            product_id: parse_uuid(&self.product_id)?,
            product_name: self.product_name,
            product_description: self.product_description,
            unit_price: parse_decimal(&self.unit_price)?,
            quantity: u32::try_from(self.quantity).map_err(store_err)?,
            total_price: parse_decimal(&self.total_price)?,
            special_instructions: self.special_instructions,
        })
    }
}

#[derive(FromRow)]
struct DbReview {
    id: String,
    product_id: String,
    email: String,
    rating: i64,
    comment: String,
    created_at: String,
}

impl DbReview {
    fn into_review(self) -> Result<Review, StoreError> {
        Ok(Review {
            id: parse_uuid(&self.id)?,
            product_id: parse_uuid(&self.product_id)?,
            email: self.email,
            rating: u8::try_from(self.rating).map_err(store_err)?,
            comment: self.comment,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

const SELECT_ORDER: &str = "SELECT id, customer_name, customer_email, customer_phone, \
     delivery_address, quantity, total_amount, status, order_date, delivery_date, \
     special_notes, created_at, updated_at FROM orders";

const SELECT_ITEM: &str = "SELECT id, order_id, product_id, product_name, \
     product_description, unit_price, quantity, total_price, special_instructions \
     FROM order_items";

const SELECT_REVIEW: &str =
    "SELECT id, product_id, email, rating, comment, created_at FROM reviews";

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if let Some(dir) = Path::new(path).parent() {
                if !dir.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(dir)
                        .await
                        .context("create sqlite parent dir")?;
                }
            }
        }
        let opts = SqliteConnectOptions::from_str(database_url)
            .context("parse database url")?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opts)
            .await
            .context("connect sqlite")?;
        sqlx::query(include_str!("../migrations/0001_create_tables.sql"))
            .execute(&pool)
            .await
            .context("run migrations")?;
        Ok(Self { pool })
    }

    /// Registers a catalog product so reviews can be admitted for it.
    pub async fn add_product(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO products (id, name) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn items_of(&self, order_id: &str) -> Result<Vec<OrderItem>, StoreError> {
        let rows: Vec<DbItem> =
            sqlx::query_as(&format!("{SELECT_ITEM} WHERE order_id = ? ORDER BY position"))
                .bind(order_id)
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)?;
        rows.into_iter().map(DbItem::into_item).collect()
    }

    async fn hydrate(&self, rows: Vec<DbOrder>) -> Result<Vec<Order>, StoreError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_of(&row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn load_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row: Option<DbOrder> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        match row {
            Some(row) => {
                let items = self.items_of(&row.id).await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    async fn save_order(&self, order: Order) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(order.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        sqlx::query(
            "INSERT OR REPLACE INTO orders (id, customer_name, customer_email, \
             customer_phone, delivery_address, quantity, total_amount, status, \
             order_date, delivery_date, special_notes, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.delivery_address)
        .bind(i64::from(order.quantity))
        .bind(order.total_amount.to_string())
        .bind(order.status.as_str())
        .bind(order.order_date.to_rfc3339())
        .bind(order.delivery_date.map(|d| d.to_rfc3339()))
        .bind(&order.special_notes)
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;
        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, position, product_id, \
                 product_name, product_description, unit_price, quantity, \
                 total_price, special_instructions) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(item.id.to_string())
            .bind(order.id.to_string())
            .bind(position as i64)
            .bind(item.product_id.to_string())
            .bind(&item.product_name)
            .bind(&item.product_description)
            .bind(item.unit_price.to_string())
            .bind(i64::from(item.quantity))
            .bind(item.total_price.to_string())
            .bind(&item.special_instructions)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)?;
        Ok(order)
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_item(&self, item_id: Uuid) -> Result<Option<OrderItem>, StoreError> {
        let row: Option<DbItem> = sqlx::query_as(&format!("{SELECT_ITEM} WHERE id = ?"))
            .bind(item_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.map(DbItem::into_item).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<DbOrder> = sqlx::query_as(SELECT_ORDER)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        self.hydrate(rows).await
    }

    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE status = ?"))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
        self.hydrate(rows).await
    }

    async fn orders_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<DbOrder> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE customer_email = ?"))
                .bind(email)
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)?;
        self.hydrate(rows).await
    }

    async fn find_completed_order(
        &self,
        email: &str,
        product_id: Uuid,
    ) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM orders o \
             JOIN order_items i ON i.order_id = o.id \
             WHERE o.customer_email = ? AND o.status = ? AND i.product_id = ?)",
        )
        .bind(email)
        .bind(OrderStatus::COMPLETED_PURCHASE.as_str())
        .bind(product_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(found != 0)
    }
}

#[async_trait]
impl CatalogLookup for SqliteStore {
    async fn product_exists(&self, product_id: Uuid) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
            .bind(product_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(found != 0)
    }
}

#[async_trait]
impl ReviewStore for SqliteStore {
    async fn find_review(
        &self,
        product_id: Uuid,
        email: &str,
    ) -> Result<Option<Review>, StoreError> {
        let row: Option<DbReview> =
            sqlx::query_as(&format!("{SELECT_REVIEW} WHERE product_id = ? AND email = ?"))
                .bind(product_id.to_string())
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        row.map(DbReview::into_review).transpose()
    }

    async fn load_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        let row: Option<DbReview> = sqlx::query_as(&format!("{SELECT_REVIEW} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.map(DbReview::into_review).transpose()
    }

    async fn save_review(&self, review: Review) -> Result<Review, StoreError> {
        sqlx::query(
            "INSERT INTO reviews (id, product_id, email, rating, comment, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(review.id.to_string())
        .bind(review.product_id.to_string())
        .bind(&review.email)
        .bind(i64::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(review)
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<DbReview> =
            sqlx::query_as(&format!("{SELECT_REVIEW} WHERE product_id = ?"))
                .bind(product_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)?;
        rows.into_iter().map(DbReview::into_review).collect()
    }

    async fn average_rating(&self, product_id: Uuid) -> Result<f64, StoreError> {
        let avg: Option<f64> =
            sqlx::query_scalar("SELECT AVG(rating) FROM reviews WHERE product_id = ?")
                .bind(product_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(avg.unwrap_or(0.0))
    }

    async fn count_reviews(&self, product_id: Uuid) -> Result<u64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE product_id = ?")
                .bind(product_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(count as u64)
    }

    async fn delete_for_product(&self, product_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE product_id = ?")
            .bind(product_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected())
    }
}
