use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::review::Review;
use crate::ports::StoreError;

/// Persistence gateway for reviews. Aggregates (`average_rating`,
/// `count_reviews`) are computed from the stored rows on every call;
/// nothing is cached.
#[async_trait]
pub trait ReviewStore: Send + Sync + 'static {
    /// The review by `email` for `product_id`, if one exists. Backs the
    /// one-review-per-customer-per-product rule.
    async fn find_review(&self, product_id: Uuid, email: &str)
        -> Result<Option<Review>, StoreError>;

    async fn load_review(&self, id: Uuid) -> Result<Option<Review>, StoreError>;

    async fn save_review(&self, review: Review) -> Result<Review, StoreError>;

    /// Returns whether a review existed and was removed.
    async fn delete_review(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>, StoreError>;

    /// Mean rating over the product's reviews, `0.0` when there are none.
    async fn average_rating(&self, product_id: Uuid) -> Result<f64, StoreError>;

    async fn count_reviews(&self, product_id: Uuid) -> Result<u64, StoreError>;

    /// Bulk removal used when a product disappears from the catalog.
    /// Returns how many reviews went with it.
    async fn delete_for_product(&self, product_id: Uuid) -> Result<u64, StoreError>;
}
