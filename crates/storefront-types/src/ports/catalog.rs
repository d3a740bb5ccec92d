use async_trait::async_trait;
use uuid::Uuid;

use crate::ports::StoreError;

/// Read-only view of the product catalog. Catalog maintenance lives outside
/// this core; reviews only need to know whether a product exists.
#[async_trait]
pub trait CatalogLookup: Send + Sync + 'static {
    async fn product_exists(&self, product_id: Uuid) -> Result<bool, StoreError>;
}
