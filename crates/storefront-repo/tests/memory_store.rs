#![cfg(feature = "memory")]

use rust_decimal_macros::dec;
use uuid::Uuid;

use storefront_repo::memory::MemoryStore;
use storefront_types::domain::order::{NewItem, Order, OrderDetails};
use storefront_types::domain::review::{NewReview, Review};
use storefront_types::domain::status::OrderStatus;
use storefront_types::ports::catalog::CatalogLookup;
use storefront_types::ports::order_store::OrderStore;
use storefront_types::ports::review_store::ReviewStore;

fn order_for(email: &str, product_id: Uuid) -> Order {
    let mut order = Order::create(OrderDetails {
        customer_name: "Maya Steiner".into(),
        customer_email: email.into(),
        customer_phone: Some("555-0117".into()),
        delivery_address: Some("4 Pudding Lane".into()),
        quantity: 2,
        total_amount: dec!(1.00),
        delivery_date: None,
        special_notes: None,
    });
    order.attach_item(NewItem {
        product_id,
        product_name: "Lemon drizzle".into(),
        product_description: Some("eight slices".into()),
        unit_price: dec!(14.50),
        quantity: 2,
        special_instructions: None,
    });
    order.recompute_total();
    order
}

fn deliver(order: &mut Order) {
    order.transition(OrderStatus::Confirmed).unwrap();
    order.transition(OrderStatus::InProgress).unwrap();
    order.transition(OrderStatus::Ready).unwrap();
    order.transition(OrderStatus::Delivered).unwrap();
}

#[tokio::test]
async fn save_and_load_roundtrips_the_aggregate() {
    let store = MemoryStore::new();
    let order = order_for("maya@example.com", Uuid::new_v4());

    store.save_order(order.clone()).await.unwrap();
    let loaded = store.load_order(order.id).await.unwrap().unwrap();

    assert_eq!(loaded, order);
    assert_eq!(loaded.total_amount, dec!(29.00));
}

#[tokio::test]
async fn load_missing_order_is_none() {
    let store = MemoryStore::new();
    assert!(store.load_order(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_order_reports_whether_anything_was_removed() {
    let store = MemoryStore::new();
    let order = order_for("maya@example.com", Uuid::new_v4());
    store.save_order(order.clone()).await.unwrap();

    assert!(store.delete_order(order.id).await.unwrap());
    assert!(!store.delete_order(order.id).await.unwrap());
    assert!(store.load_order(order.id).await.unwrap().is_none());
}

#[tokio::test]
async fn load_item_searches_across_orders() {
    let store = MemoryStore::new();
    let first = order_for("a@example.com", Uuid::new_v4());
    let second = order_for("b@example.com", Uuid::new_v4());
    let wanted = second.items[0].clone();
    store.save_order(first).await.unwrap();
    store.save_order(second).await.unwrap();

    let found = store.load_item(wanted.id).await.unwrap().unwrap();
    assert_eq!(found, wanted);
    assert!(store.load_item(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn filters_by_status_and_email() {
    let store = MemoryStore::new();
    let mut delivered = order_for("maya@example.com", Uuid::new_v4());
    deliver(&mut delivered);
    let pending = order_for("maya@example.com", Uuid::new_v4());
    let other = order_for("noah@example.com", Uuid::new_v4());
    store.save_order(delivered.clone()).await.unwrap();
    store.save_order(pending.clone()).await.unwrap();
    store.save_order(other).await.unwrap();

    let by_status = store
        .orders_by_status(OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].id, delivered.id);

    let by_email = store.orders_by_email("maya@example.com").await.unwrap();
    assert_eq!(by_email.len(), 2);
    assert!(store
        .orders_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.list_orders().await.unwrap().len(), 3);
}

#[tokio::test]
async fn completed_purchase_needs_delivery_email_and_line_item() {
    let store = MemoryStore::new();
    let product = Uuid::new_v4();
    let mut order = order_for("maya@example.com", product);
    store.save_order(order.clone()).await.unwrap();

    // still pending
    assert!(!store
        .find_completed_order("maya@example.com", product)
        .await
        .unwrap());

    deliver(&mut order);
    store.save_order(order).await.unwrap();

    assert!(store
        .find_completed_order("maya@example.com", product)
        .await
        .unwrap());
    assert!(!store
        .find_completed_order("noah@example.com", product)
        .await
        .unwrap());
    assert!(!store
        .find_completed_order("maya@example.com", Uuid::new_v4())
        .await
        .unwrap());
}

#[tokio::test]
async fn product_registry_backs_catalog_lookup() {
    let store = MemoryStore::new();
    let product = Uuid::new_v4();
    assert!(!store.product_exists(product).await.unwrap());

    store.add_product(product, "Carrot cake").await.unwrap();
    assert!(store.product_exists(product).await.unwrap());
}

#[tokio::test]
async fn review_queries_cover_lookup_and_aggregates() {
    let store = MemoryStore::new();
    let product = Uuid::new_v4();
    let review = Review::new(
        product,
        NewReview {
            email: "maya@example.com".into(),
            rating: 4,
            comment: "Moist and not too sweet.".into(),
        },
    );
    store.save_review(review.clone()).await.unwrap();
    store
        .save_review(Review::new(
            product,
            NewReview {
                email: "noah@example.com".into(),
                rating: 2,
                comment: "Arrived squashed.".into(),
            },
        ))
        .await
        .unwrap();

    let found = store
        .find_review(product, "maya@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, review);
    assert!(store
        .find_review(product, "nobody@example.com")
        .await
        .unwrap()
        .is_none());
    assert_eq!(store.load_review(review.id).await.unwrap().unwrap(), review);

    assert_eq!(store.reviews_for_product(product).await.unwrap().len(), 2);
    assert_eq!(store.count_reviews(product).await.unwrap(), 2);
    assert_eq!(store.average_rating(product).await.unwrap(), 3.0);
    assert_eq!(store.average_rating(Uuid::new_v4()).await.unwrap(), 0.0);
}

#[tokio::test]
async fn reviews_can_be_deleted_singly_or_per_product() {
    let store = MemoryStore::new();
    let product = Uuid::new_v4();
    let first = Review::new(
        product,
        NewReview {
            email: "maya@example.com".into(),
            rating: 5,
            comment: "Best birthday cake yet.".into(),
        },
    );
    store.save_review(first.clone()).await.unwrap();
    store
        .save_review(Review::new(
            product,
            NewReview {
                email: "noah@example.com".into(),
                rating: 3,
                comment: "Decent but pricey.".into(),
            },
        ))
        .await
        .unwrap();

    assert!(store.delete_review(first.id).await.unwrap());
    assert!(!store.delete_review(first.id).await.unwrap());

    assert_eq!(store.delete_for_product(product).await.unwrap(), 1);
    assert_eq!(store.count_reviews(product).await.unwrap(), 0);
}
