use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post, put},
    serve, Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::application::review_service::{ReviewService, ReviewStats};
use crate::errors::AppError;
use storefront_types::domain::order::{NewItem, Order, OrderDetails, OrderItem};
use storefront_types::domain::review::{NewReview, Review};
use storefront_types::domain::status::OrderStatus;
use storefront_types::ports::catalog::CatalogLookup;
use storefront_types::ports::order_store::OrderStore;
use storefront_types::ports::review_store::ReviewStore;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

/// Handler state: both services behind `Arc`s so every route sees the same
/// lock registry and collaborators.
pub struct AppState<S, C, R>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    pub orders: Arc<OrderService<S>>,
    pub reviews: Arc<ReviewService<S, C, R>>,
}

impl<S, C, R> Clone for AppState<S, C, R>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            reviews: self.reviews.clone(),
        }
    }
}

pub struct HttpServer<S, C, R>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    pub state: AppState<S, C, R>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn parse_id(raw: &str, field: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::Validation {
        field,
        reason: e.to_string(),
    })
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.parse::<OrderStatus>().map_err(|e| AppError::Validation {
        field: "status",
        reason: e.to_string(),
    })
}

impl<S, C, R> HttpServer<S, C, R>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    pub async fn new(
        orders: OrderService<S>,
        reviews: ReviewService<S, C, R>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            state: AppState {
                orders: Arc::new(orders),
                reviews: Arc::new(reviews),
            },
            config,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let app = Router::new()
            .route("/health", get(health))
            .route("/orders", post(create_order::<S, C, R>))
            .route("/orders", get(list_orders::<S, C, R>))
            .route("/orders/{id}", get(get_order::<S, C, R>))
            .route("/orders/{id}", put(update_order::<S, C, R>))
            .route("/orders/{id}", delete(delete_order::<S, C, R>))
            .route("/orders/{id}/status", patch(update_status::<S, C, R>))
            .route("/orders/status/{status}", get(orders_by_status::<S, C, R>))
            .route("/orders/customer/{email}", get(orders_by_email::<S, C, R>))
            .route("/orders/{id}/items", post(add_item::<S, C, R>))
            .route("/orders/{id}/items", get(order_items::<S, C, R>))
            .route("/items/{id}", get(get_item::<S, C, R>))
            .route("/items/{id}", put(update_item::<S, C, R>))
            .route("/items/{id}", delete(delete_item::<S, C, R>))
            .route("/products/{id}/reviews", post(add_review::<S, C, R>))
            .route("/products/{id}/reviews", get(product_reviews::<S, C, R>))
            .route("/products/{id}/reviews", delete(purge_reviews::<S, C, R>))
            .route(
                "/products/{id}/reviews/stats",
                get(review_stats::<S, C, R>),
            )
            .route(
                "/products/{id}/reviews/{review_id}",
                delete(delete_review::<S, C, R>),
            )
            .layer(trace_layer)
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn create_order<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Json(payload): Json<OrderDetails>,
) -> Result<(axum::http::StatusCode, Json<Order>), AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let order = state.orders.create_order(payload).await?;
    Ok((axum::http::StatusCode::CREATED, Json(order)))
}

async fn list_orders<S, C, R>(
    State(state): State<AppState<S, C, R>>,
) -> Result<Json<Vec<Order>>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    Ok(Json(state.orders.list_orders().await?))
}

async fn get_order<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    Ok(Json(state.orders.get_order(id).await?))
}

async fn update_order<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
    Json(payload): Json<OrderDetails>,
) -> Result<Json<Order>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    Ok(Json(state.orders.update_order(id, payload).await?))
}

async fn delete_order<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    state.orders.delete_order(id).await?;
    Ok((
        axum::http::StatusCode::NO_CONTENT,
        Json(serde_json::json!({})),
    ))
}

async fn update_status<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    let next = parse_status(&payload.status)?;
    Ok(Json(state.orders.change_status(id, next).await?))
}

async fn orders_by_status<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(status): Path<String>,
) -> Result<Json<Vec<Order>>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let status = parse_status(&status)?;
    Ok(Json(state.orders.orders_by_status(status).await?))
}

async fn orders_by_email<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Order>>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    Ok(Json(state.orders.orders_by_email(&email).await?))
}

async fn add_item<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
    Json(payload): Json<NewItem>,
) -> Result<(axum::http::StatusCode, Json<OrderItem>), AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    let item = state.orders.add_item(id, payload).await?;
    Ok((axum::http::StatusCode::CREATED, Json(item)))
}

async fn order_items<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderItem>>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    Ok(Json(state.orders.order_items(id).await?))
}

async fn get_item<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
) -> Result<Json<OrderItem>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    Ok(Json(state.orders.get_item(id).await?))
}

async fn update_item<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
    Json(payload): Json<NewItem>,
) -> Result<Json<OrderItem>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    Ok(Json(state.orders.update_item(id, payload).await?))
}

async fn delete_item<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let id = parse_id(&id, "id")?;
    state.orders.delete_item(id).await?;
    Ok((
        axum::http::StatusCode::NO_CONTENT,
        Json(serde_json::json!({})),
    ))
}

async fn add_review<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
    Json(payload): Json<NewReview>,
) -> Result<(axum::http::StatusCode, Json<Review>), AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let product_id = parse_id(&id, "product_id")?;
    let review = state.reviews.add_review(product_id, payload).await?;
    Ok((axum::http::StatusCode::CREATED, Json(review)))
}

async fn product_reviews<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let product_id = parse_id(&id, "product_id")?;
    Ok(Json(state.reviews.product_reviews(product_id).await?))
}

async fn review_stats<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
) -> Result<Json<ReviewStats>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let product_id = parse_id(&id, "product_id")?;
    Ok(Json(state.reviews.review_stats(product_id).await?))
}

async fn delete_review<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let _product_id = parse_id(&id, "product_id")?;
    let review_id = parse_id(&review_id, "review_id")?;
    if !state.reviews.delete_review(review_id).await? {
        return Err(AppError::NotFound(format!("review {}", review_id)));
    }
    Ok((
        axum::http::StatusCode::NO_CONTENT,
        Json(serde_json::json!({})),
    ))
}

async fn purge_reviews<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: OrderStore,
    C: CatalogLookup,
    R: ReviewStore,
{
    let product_id = parse_id(&id, "product_id")?;
    let deleted = state.reviews.delete_product_reviews(product_id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
