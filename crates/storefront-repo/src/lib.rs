//! Persistence adapters for the storefront ports.
//!
//! Two interchangeable backends sit behind [`Store`]: a dashmap-based
//! in-memory store and a SQLite store via sqlx. Pick one (or both) with the
//! `memory` / `sqlite` cargo features and construct with [`build_store`].

#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("storefront-repo needs at least one backend feature: `memory` or `sqlite`");

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use uuid::Uuid;

use storefront_types::domain::order::{Order, OrderItem};
use storefront_types::domain::review::Review;
use storefront_types::domain::status::OrderStatus;
use storefront_types::ports::catalog::CatalogLookup;
use storefront_types::ports::order_store::OrderStore;
use storefront_types::ports::review_store::ReviewStore;
use storefront_types::ports::StoreError;

/// The configured persistence backend, implementing every collaborator port.
#[derive(Clone)]
pub enum Store {
    #[cfg(feature = "memory")]
    Memory(memory::MemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteStore),
}

/// Builds the store for an optional database URL. A URL selects SQLite when
/// that backend is compiled in; with no URL the in-memory backend is used.
/// When only one backend is compiled, it is used either way.
pub async fn build_store(database_url: Option<&str>) -> anyhow::Result<Store> {
    Store::build(database_url).await
}

impl Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build(_database_url: Option<&str>) -> anyhow::Result<Self> {
        Ok(Store::Memory(memory::MemoryStore::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://storefront.db");
        Ok(Store::Sqlite(sqlite::SqliteStore::new(url).await?))
    }

    #[cfg(all(feature = "memory", feature = "sqlite"))]
    pub async fn build(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Store::Sqlite(sqlite::SqliteStore::new(url).await?)),
            None => Ok(Store::Memory(memory::MemoryStore::new())),
        }
    }

    /// Registers a catalog product so reviews can be admitted for it.
    pub async fn add_product(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.add_product(id, name).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.add_product(id, name).await,
        }
    }
}

#[async_trait]
impl OrderStore for Store {
    async fn load_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.load_order(id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.load_order(id).await,
        }
    }

    async fn save_order(&self, order: Order) -> Result<Order, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.save_order(order).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.save_order(order).await,
        }
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.delete_order(id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.delete_order(id).await,
        }
    }

    async fn load_item(&self, item_id: Uuid) -> Result<Option<OrderItem>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.load_item(item_id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.load_item(item_id).await,
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.list_orders().await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.list_orders().await,
        }
    }

    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.orders_by_status(status).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.orders_by_status(status).await,
        }
    }

    async fn orders_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.orders_by_email(email).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.orders_by_email(email).await,
        }
    }

    async fn find_completed_order(
        &self,
        email: &str,
        product_id: Uuid,
    ) -> Result<bool, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.find_completed_order(email, product_id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.find_completed_order(email, product_id).await,
        }
    }
}

#[async_trait]
impl CatalogLookup for Store {
    async fn product_exists(&self, product_id: Uuid) -> Result<bool, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.product_exists(product_id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.product_exists(product_id).await,
        }
    }
}

#[async_trait]
impl ReviewStore for Store {
    async fn find_review(
        &self,
        product_id: Uuid,
        email: &str,
    ) -> Result<Option<Review>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.find_review(product_id, email).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.find_review(product_id, email).await,
        }
    }

    async fn load_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.load_review(id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.load_review(id).await,
        }
    }

    async fn save_review(&self, review: Review) -> Result<Review, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.save_review(review).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.save_review(review).await,
        }
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.delete_review(id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.delete_review(id).await,
        }
    }

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.reviews_for_product(product_id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.reviews_for_product(product_id).await,
        }
    }

    async fn average_rating(&self, product_id: Uuid) -> Result<f64, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.average_rating(product_id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.average_rating(product_id).await,
        }
    }

    async fn count_reviews(&self, product_id: Uuid) -> Result<u64, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.count_reviews(product_id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.count_reviews(product_id).await,
        }
    }

    async fn delete_for_product(&self, product_id: Uuid) -> Result<u64, StoreError> {
        match self {
            #[cfg(feature = "memory")]
            Store::Memory(store) => store.delete_for_product(product_id).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(store) => store.delete_for_product(product_id).await,
        }
    }
}
