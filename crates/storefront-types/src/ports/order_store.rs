use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderItem};
use crate::domain::status::OrderStatus;
use crate::ports::StoreError;

/// Persistence gateway for the order aggregate.
///
/// An [`Order`] and its items form one consistency unit: `save_order`
/// persists the order row together with its current items atomically, so a
/// reader can never observe an item mutation without the re-derived total
/// that belongs to it. Item-level writes go through the aggregate; only
/// reads are item-addressed.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Loads the full aggregate (order plus items, in attachment order).
    async fn load_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Upserts the aggregate as a single atomic unit.
    async fn save_order(&self, order: Order) -> Result<Order, StoreError>;

    /// Deletes the order and cascades to its items. Returns whether an
    /// order existed.
    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Item-addressed read; the returned item's `order_id` locates the
    /// owning aggregate.
    async fn load_item(&self, item_id: Uuid) -> Result<Option<OrderItem>, StoreError>;

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;

    async fn orders_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError>;

    /// True iff an order for `email` in the completed-purchase status
    /// contains an item for `product_id`. Pure read used by the review
    /// admission gate.
    async fn find_completed_order(&self, email: &str, product_id: Uuid)
        -> Result<bool, StoreError>;
}
