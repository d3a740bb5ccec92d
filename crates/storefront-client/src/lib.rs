use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_types::domain::order::{NewItem, Order, OrderDetails, OrderItem};
use storefront_types::domain::review::{NewReview, Review};
use storefront_types::domain::status::OrderStatus;

#[derive(Clone)]
pub struct StorefrontClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct StorefrontClient {
    base: Url,
    client: reqwest::Client,
}

impl StorefrontClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<StorefrontClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(StorefrontClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn create_order(&self, details: OrderDetails) -> anyhow::Result<Order> {
        let res = self
            .client
            .post(self.url("orders")?)
            .json(&details)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn get_order(&self, id: Uuid) -> anyhow::Result<Order> {
        let res = self
            .client
            .get(self.url(&format!("orders/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self
            .client
            .get(self.url("orders")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    /// Full update of the descriptive fields; status and items are untouched.
    pub async fn update_order(&self, id: Uuid, details: OrderDetails) -> anyhow::Result<Order> {
        let res = self
            .client
            .put(self.url(&format!("orders/{id}"))?)
            .json(&details)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn update_status(&self, id: Uuid, status: OrderStatus) -> anyhow::Result<Order> {
        let res = self
            .client
            .patch(self.url(&format!("orders/{id}/status"))?)
            .json(&UpdateStatusRequest { status })
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn delete_order(&self, id: Uuid) -> anyhow::Result<()> {
        self.client
            .delete(self.url(&format!("orders/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn orders_by_status(&self, status: OrderStatus) -> anyhow::Result<Vec<Order>> {
        let res = self
            .client
            .get(self.url(&format!("orders/status/{status}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn orders_by_email(&self, email: &str) -> anyhow::Result<Vec<Order>> {
        let res = self
            .client
            .get(self.url(&format!("orders/customer/{email}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn add_item(&self, order_id: Uuid, item: NewItem) -> anyhow::Result<OrderItem> {
        let res = self
            .client
            .post(self.url(&format!("orders/{order_id}/items"))?)
            .json(&item)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn order_items(&self, order_id: Uuid) -> anyhow::Result<Vec<OrderItem>> {
        let res = self
            .client
            .get(self.url(&format!("orders/{order_id}/items"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn get_item(&self, id: Uuid) -> anyhow::Result<OrderItem> {
        let res = self
            .client
            .get(self.url(&format!("items/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn update_item(&self, id: Uuid, item: NewItem) -> anyhow::Result<OrderItem> {
        let res = self
            .client
            .put(self.url(&format!("items/{id}"))?)
            .json(&item)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn delete_item(&self, id: Uuid) -> anyhow::Result<()> {
        self.client
            .delete(self.url(&format!("items/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn add_review(&self, product_id: Uuid, review: NewReview) -> anyhow::Result<Review> {
        let res = self
            .client
            .post(self.url(&format!("products/{product_id}/reviews"))?)
            .json(&review)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn product_reviews(&self, product_id: Uuid) -> anyhow::Result<Vec<Review>> {
        let res = self
            .client
            .get(self.url(&format!("products/{product_id}/reviews"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn review_stats(&self, product_id: Uuid) -> anyhow::Result<ReviewStats> {
        let res = self
            .client
            .get(self.url(&format!("products/{product_id}/reviews/stats"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn delete_review(&self, product_id: Uuid, review_id: Uuid) -> anyhow::Result<()> {
        self.client
            .delete(self.url(&format!("products/{product_id}/reviews/{review_id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Removes every review of a product, returning how many were deleted.
    pub async fn purge_reviews(&self, product_id: Uuid) -> anyhow::Result<u64> {
        let res = self
            .client
            .delete(self.url(&format!("products/{product_id}/reviews"))?)
            .send()
            .await?
            .error_for_status()?;
        let body: PurgeResponse = res.json().await?;
        Ok(body.deleted)
    }
}

impl StorefrontClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<StorefrontClient> {
        if let Some(client) = self.client {
            return Ok(StorefrontClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        tracing::debug!(base = %self.base, "storefront client ready");
        Ok(StorefrontClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

/// Aggregate review figures returned by the stats endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ReviewStats {
    pub average_rating: f64,
    pub review_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct PurgeResponse {
    deleted: u64,
}
