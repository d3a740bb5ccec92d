use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use storefront_types::domain::order::{Order, OrderItem};
use storefront_types::domain::review::Review;
use storefront_types::domain::status::OrderStatus;
use storefront_types::ports::catalog::CatalogLookup;
use storefront_types::ports::order_store::OrderStore;
use storefront_types::ports::review_store::ReviewStore;
use storefront_types::ports::StoreError;

/// In-memory adapter backing all three collaborator ports.
///
/// Each map entry under `orders` holds a whole aggregate, so `save_order`
/// replaces the order and its items in one shot and readers never observe
/// an order whose stored total disagrees with its stored items.
#[derive(Clone, Default)]
pub struct MemoryStore {
    orders: Arc<DashMap<Uuid, Order>>,
    reviews: Arc<DashMap<Uuid, Review>>,
    products: Arc<DashMap<Uuid, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a catalog product so reviews can be admitted for it.
    /// Catalog maintenance is out of scope; this is the seed hook used by
    /// tests, demos, and the app at startup.
    pub async fn add_product(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
        self.products.insert(id, name.to_string());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn load_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(&id).map(|kv| kv.value().clone()))
    }

    async fn save_order(&self, order: Order) -> Result<Order, StoreError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.orders.remove(&id).is_some())
    }

    async fn load_item(&self, item_id: Uuid) -> Result<Option<OrderItem>, StoreError> {
        Ok(self
            .orders
            .iter()
            .find_map(|kv| kv.value().item(item_id).cloned()))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.iter().map(|kv| kv.value().clone()).collect())
    }

    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .orders
            .iter()
            .filter(|kv| kv.value().status == status)
            .map(|kv| kv.value().clone())
            .collect())
    }

    async fn orders_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .orders
            .iter()
            .filter(|kv| kv.value().customer_email == email)
            .map(|kv| kv.value().clone())
            .collect())
    }

    async fn find_completed_order(
        &self,
        email: &str,
        product_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.orders.iter().any(|kv| {
            let order = kv.value();
            order.customer_email == email
                && order.status == OrderStatus::COMPLETED_PURCHASE
                && order.items.iter().any(|item| item.product_id == product_id)
        }))
    }
}

#[async_trait]
impl CatalogLookup for MemoryStore {
    async fn product_exists(&self, product_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.products.contains_key(&product_id))
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn find_review(
        &self,
        product_id: Uuid,
        email: &str,
    ) -> Result<Option<Review>, StoreError> {
        Ok(self
            .reviews
            .iter()
            .find(|kv| kv.value().product_id == product_id && kv.value().email == email)
            .map(|kv| kv.value().clone()))
    }

    async fn load_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        Ok(self.reviews.get(&id).map(|kv| kv.value().clone()))
    }

    async fn save_review(&self, review: Review) -> Result<Review, StoreError> {
        self.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.reviews.remove(&id).is_some())
    }

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .iter()
            .filter(|kv| kv.value().product_id == product_id)
            .map(|kv| kv.value().clone())
            .collect())
    }

    async fn average_rating(&self, product_id: Uuid) -> Result<f64, StoreError> {
        let ratings: Vec<u8> = self
            .reviews
            .iter()
            .filter(|kv| kv.value().product_id == product_id)
            .map(|kv| kv.value().rating)
            .collect();
        if ratings.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = ratings.iter().copied().map(f64::from).sum();
        Ok(sum / ratings.len() as f64)
    }

    async fn count_reviews(&self, product_id: Uuid) -> Result<u64, StoreError> {
        Ok(self
            .reviews
            .iter()
            .filter(|kv| kv.value().product_id == product_id)
            .count() as u64)
    }

    async fn delete_for_product(&self, product_id: Uuid) -> Result<u64, StoreError> {
        let ids: Vec<Uuid> = self
            .reviews
            .iter()
            .filter(|kv| kv.value().product_id == product_id)
            .map(|kv| kv.value().id)
            .collect();
        for id in &ids {
            self.reviews.remove(id);
        }
        Ok(ids.len() as u64)
    }
}
