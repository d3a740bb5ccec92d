use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::looks_like_email;
use crate::errors::AppError;
use storefront_types::domain::review::{NewReview, Review};
use storefront_types::ports::catalog::CatalogLookup;
use storefront_types::ports::order_store::OrderStore;
use storefront_types::ports::review_store::ReviewStore;

/// Aggregate review figures for one product, recomputed from live rows on
/// every read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReviewStats {
    pub average_rating: f64,
    pub review_count: u64,
}

/// Review admission and reads. Admission is gated on a completed purchase:
/// only a customer whose delivered order contains the product may review
/// it, and only once.
pub struct ReviewService<S, C, R>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    orders: S,
    catalog: C,
    reviews: R,
}

fn validate_review(fields: &NewReview) -> Result<(), AppError> {
    if !looks_like_email(&fields.email) {
        return Err(AppError::Validation {
            field: "email",
            reason: "must be a valid email address".into(),
        });
    }
    if !(1..=5).contains(&fields.rating) {
        return Err(AppError::Validation {
            field: "rating",
            reason: "must be between 1 and 5".into(),
        });
    }
    if !(5..=1000).contains(&fields.comment.chars().count()) {
        return Err(AppError::Validation {
            field: "comment",
            reason: "must be between 5 and 1000 characters".into(),
        });
    }
    Ok(())
}

impl<S, C, R> ReviewService<S, C, R>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    pub fn new(orders: S, catalog: C, reviews: R) -> Self {
        Self {
            orders,
            catalog,
            reviews,
        }
    }

    /// True when a delivered order for `email` contains `product_id`.
    pub async fn is_verified_buyer(
        &self,
        email: &str,
        product_id: Uuid,
    ) -> Result<bool, AppError> {
        Ok(self.orders.find_completed_order(email, product_id).await?)
    }

    /// Admits a review. Checks run from most to least specific failure:
    /// field validation, product existence, the purchase gate, then the
    /// one-review-per-buyer rule; only then is the review persisted.
    pub async fn add_review(
        &self,
        product_id: Uuid,
        fields: NewReview,
    ) -> Result<Review, AppError> {
        validate_review(&fields)?;
        self.require_product(product_id).await?;
        if !self.is_verified_buyer(&fields.email, product_id).await? {
            return Err(AppError::Forbidden(format!(
                "no completed purchase of product {} for {}",
                product_id, fields.email
            )));
        }
        if self
            .reviews
            .find_review(product_id, &fields.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "{} already reviewed product {}",
                fields.email, product_id
            )));
        }
        Ok(self
            .reviews
            .save_review(Review::new(product_id, fields))
            .await?)
    }

    pub async fn product_reviews(&self, product_id: Uuid) -> Result<Vec<Review>, AppError> {
        self.require_product(product_id).await?;
        Ok(self.reviews.reviews_for_product(product_id).await?)
    }

    pub async fn get_review(&self, id: Uuid) -> Result<Review, AppError> {
        match self.reviews.load_review(id).await? {
            Some(review) => Ok(review),
            None => Err(AppError::NotFound(format!("review {}", id))),
        }
    }

    /// Average (0.0 with no reviews) and count in one payload.
    pub async fn review_stats(&self, product_id: Uuid) -> Result<ReviewStats, AppError> {
        self.require_product(product_id).await?;
        Ok(ReviewStats {
            average_rating: self.reviews.average_rating(product_id).await?,
            review_count: self.reviews.count_reviews(product_id).await?,
        })
    }

    /// Removes one review, reporting whether anything was there.
    pub async fn delete_review(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.reviews.delete_review(id).await?)
    }

    /// Removes every review of a product, returning how many went away.
    pub async fn delete_product_reviews(&self, product_id: Uuid) -> Result<u64, AppError> {
        Ok(self.reviews.delete_for_product(product_id).await?)
    }

    async fn require_product(&self, product_id: Uuid) -> Result<(), AppError> {
        if !self.catalog.product_exists(product_id).await? {
            return Err(AppError::NotFound(format!("product {}", product_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::order_service::OrderService;
    use rust_decimal_macros::dec;
    use storefront_repo::memory::MemoryStore;
    use storefront_types::domain::order::{NewItem, OrderDetails};
    use storefront_types::domain::status::OrderStatus;

    const BUYER: &str = "maya@example.com";

    fn service(store: &MemoryStore) -> ReviewService<MemoryStore, MemoryStore, MemoryStore> {
        ReviewService::new(store.clone(), store.clone(), store.clone())
    }

    fn review_by(email: &str) -> NewReview {
        NewReview {
            email: email.into(),
            rating: 4,
            comment: "Moist and not too sweet.".into(),
        }
    }

    async fn seeded_product(store: &MemoryStore) -> Uuid {
        let product_id = Uuid::new_v4();
        store.add_product(product_id, "Carrot cake").await.unwrap();
        product_id
    }

    async fn place_order(
        store: &MemoryStore,
        email: &str,
        product_id: Uuid,
    ) -> (OrderService<MemoryStore>, Uuid) {
        let orders = OrderService::new(store.clone());
        let order = orders
            .create_order(OrderDetails {
                customer_name: "Maya Steiner".into(),
                customer_email: email.into(),
                customer_phone: None,
                delivery_address: None,
                quantity: 1,
                total_amount: dec!(15.00),
                delivery_date: None,
                special_notes: None,
            })
            .await
            .unwrap();
        orders
            .add_item(
                order.id,
                NewItem {
                    product_id,
                    product_name: "Carrot cake".into(),
                    product_description: None,
                    unit_price: dec!(15.00),
                    quantity: 1,
                    special_instructions: None,
                },
            )
            .await
            .unwrap();
        (orders, order.id)
    }

    async fn complete_purchase(store: &MemoryStore, email: &str, product_id: Uuid) {
        let (orders, order_id) = place_order(store, email, product_id).await;
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::InProgress,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ] {
            orders.change_status(order_id, status).await.unwrap();
        }
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let err = svc
            .add_review(Uuid::new_v4(), review_by(BUYER))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn buyer_without_purchase_is_forbidden() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let product_id = seeded_product(&store).await;

        let err = svc.add_review(product_id, review_by(BUYER)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn undelivered_purchase_does_not_verify_the_buyer() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let product_id = seeded_product(&store).await;
        place_order(&store, BUYER, product_id).await;

        assert!(!svc.is_verified_buyer(BUYER, product_id).await.unwrap());
        assert!(matches!(
            svc.add_review(product_id, review_by(BUYER)).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn verified_buyer_review_is_admitted_once() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let product_id = seeded_product(&store).await;
        complete_purchase(&store, BUYER, product_id).await;

        assert!(svc.is_verified_buyer(BUYER, product_id).await.unwrap());
        let review = svc.add_review(product_id, review_by(BUYER)).await.unwrap();
        assert_eq!(review.product_id, product_id);
        assert_eq!(review.email, BUYER);
        assert_eq!(review.rating, 4);

        let err = svc.add_review(product_id, review_by(BUYER)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn verification_is_scoped_to_email_and_product() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let product_id = seeded_product(&store).await;
        let other_product = seeded_product(&store).await;
        complete_purchase(&store, BUYER, product_id).await;

        assert!(!svc
            .is_verified_buyer("noah@example.com", product_id)
            .await
            .unwrap());
        assert!(!svc.is_verified_buyer(BUYER, other_product).await.unwrap());
    }

    #[tokio::test]
    async fn review_validation_names_the_field() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let product_id = seeded_product(&store).await;

        let cases = [
            (
                NewReview {
                    email: "not-an-address".into(),
                    rating: 4,
                    comment: "Perfectly fine.".into(),
                },
                "email",
            ),
            (
                NewReview {
                    email: BUYER.into(),
                    rating: 0,
                    comment: "Perfectly fine.".into(),
                },
                "rating",
            ),
            (
                NewReview {
                    email: BUYER.into(),
                    rating: 6,
                    comment: "Perfectly fine.".into(),
                },
                "rating",
            ),
            (
                NewReview {
                    email: BUYER.into(),
                    rating: 4,
                    comment: "Meh.".into(),
                },
                "comment",
            ),
            (
                NewReview {
                    email: BUYER.into(),
                    rating: 4,
                    comment: "x".repeat(1001),
                },
                "comment",
            ),
        ];
        for (fields, expected) in cases {
            match svc.add_review(product_id, fields).await.unwrap_err() {
                AppError::Validation { field, .. } => assert_eq!(field, expected),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn stats_default_to_zero_and_track_deletes() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let product_id = seeded_product(&store).await;

        let empty = svc.review_stats(product_id).await.unwrap();
        assert_eq!(empty.average_rating, 0.0);
        assert_eq!(empty.review_count, 0);

        complete_purchase(&store, BUYER, product_id).await;
        complete_purchase(&store, "noah@example.com", product_id).await;
        let first = svc.add_review(product_id, review_by(BUYER)).await.unwrap();
        let mut second = review_by("noah@example.com");
        second.rating = 2;
        svc.add_review(product_id, second).await.unwrap();

        let stats = svc.review_stats(product_id).await.unwrap();
        assert_eq!(stats.average_rating, 3.0);
        assert_eq!(stats.review_count, 2);

        assert!(svc.delete_review(first.id).await.unwrap());
        assert!(!svc.delete_review(first.id).await.unwrap());
        let stats = svc.review_stats(product_id).await.unwrap();
        assert_eq!(stats.average_rating, 2.0);
        assert_eq!(stats.review_count, 1);
    }

    #[tokio::test]
    async fn listing_and_purging_reviews() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let product_id = seeded_product(&store).await;
        complete_purchase(&store, BUYER, product_id).await;
        let review = svc.add_review(product_id, review_by(BUYER)).await.unwrap();

        let listed = svc.product_reviews(product_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(svc.get_review(review.id).await.unwrap(), review);
        assert!(matches!(
            svc.product_reviews(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));

        assert_eq!(svc.delete_product_reviews(product_id).await.unwrap(), 1);
        assert!(svc.product_reviews(product_id).await.unwrap().is_empty());
        assert!(matches!(
            svc.get_review(review.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
