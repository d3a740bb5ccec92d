///  To run :
///  cargo r --example client_example
use reqwest::StatusCode;
use storefront_client::StorefrontClient;
use storefront_hex::application::order_service::OrderService;
use storefront_hex::application::review_service::ReviewService;
use storefront_hex::inbound::http::{HttpServer, HttpServerConfig};
use storefront_repo::build_store;
use storefront_types::domain::order::{NewItem, OrderDetails};
use storefront_types::domain::review::NewReview;
use storefront_types::domain::status::OrderStatus;
use tempfile::tempdir;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start server on ephemeral port.
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("storefront.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let store = build_store(Some(&db_url)).await?;
    let product_id = Uuid::new_v4();
    store
        .add_product(product_id, "Flourless chocolate cake")
        .await?;

    let orders = OrderService::new(store.clone());
    let reviews = ReviewService::new(store.clone(), store.clone(), store);
    let server = HttpServer::new(
        orders,
        reviews,
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Use client against the running server.
    let client = StorefrontClient::new(&addr)?;
    let created = client
        .create_order(OrderDetails {
            customer_name: "Example".into(),
            customer_email: "example@example.com".into(),
            customer_phone: None,
            delivery_address: Some("12 Demo Street".into()),
            quantity: 1,
            total_amount: "24.00".parse()?,
            delivery_date: None,
            special_notes: None,
        })
        .await?;
    println!("Created order id={}", created.id);
    assert_eq!(created.status, OrderStatus::Pending);

    let item = client
        .add_item(
            created.id,
            NewItem {
                product_id,
                product_name: "Flourless chocolate cake".into(),
                product_description: None,
                unit_price: "24.00".parse()?,
                quantity: 1,
                special_instructions: None,
            },
        )
        .await?;
    println!("Added item id={}", item.id);

    let fetched = client.get_order(created.id).await?;
    println!("Order total now {}", fetched.total_amount);

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ] {
        let updated = client.update_status(created.id, status).await?;
        println!("Moved order to {:?}", updated.status);
    }

    let review = client
        .add_review(
            product_id,
            NewReview {
                email: "example@example.com".into(),
                rating: 5,
                comment: "Rich without being heavy.".into(),
            },
        )
        .await?;
    println!("Review admitted id={}", review.id);

    // A second review from the same buyer bounces with 409.
    match client
        .add_review(
            product_id,
            NewReview {
                email: "example@example.com".into(),
                rating: 4,
                comment: "Still thinking about it.".into(),
            },
        )
        .await
    {
        Ok(_) => println!("unexpected: duplicate review was admitted"),
        Err(err) => {
            if err
                .downcast_ref::<reqwest::Error>()
                .and_then(|e| e.status())
                == Some(StatusCode::CONFLICT)
            {
                println!("Duplicate review rejected with 409");
            } else {
                return Err(err);
            }
        }
    }

    let stats = client.review_stats(product_id).await?;
    println!(
        "Product has {} review(s), average {}",
        stats.review_count, stats.average_rating
    );

    client.delete_review(product_id, review.id).await?;
    client.delete_order(created.id).await?;
    println!("Cleaned up order and review");

    handle.abort();
    Ok(())
}
