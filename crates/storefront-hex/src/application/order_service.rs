use rust_decimal::Decimal;
use uuid::Uuid;

use crate::application::locks::OrderLocks;
use crate::application::looks_like_email;
use crate::errors::AppError;
use storefront_types::domain::order::{NewItem, Order, OrderDetails, OrderItem};
use storefront_types::domain::status::OrderStatus;
use storefront_types::ports::order_store::OrderStore;

/// Order lifecycle: creation, reads, full updates, status changes and item
/// mutations. Every mutation of an existing order runs under that order's
/// write lock and persists through a single `save_order`, so the derived
/// total and the items are never observable out of step.
pub struct OrderService<S: OrderStore> {
    store: S,
    locks: OrderLocks,
}

fn validate_details(details: &OrderDetails) -> Result<(), AppError> {
    if details.customer_name.trim().is_empty() {
        return Err(AppError::Validation {
            field: "customer_name",
            reason: "must not be blank".into(),
        });
    }
    if !looks_like_email(&details.customer_email) {
        return Err(AppError::Validation {
            field: "customer_email",
            reason: "must be a valid email address".into(),
        });
    }
    if details.quantity == 0 {
        return Err(AppError::Validation {
            field: "quantity",
            reason: "must be at least 1".into(),
        });
    }
    if details.total_amount <= Decimal::ZERO {
        return Err(AppError::Validation {
            field: "total_amount",
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

fn validate_item(fields: &NewItem) -> Result<(), AppError> {
    if fields.product_id.is_nil() {
        return Err(AppError::Validation {
            field: "product_id",
            reason: "must be set".into(),
        });
    }
    if fields.product_name.trim().is_empty() {
        return Err(AppError::Validation {
            field: "product_name",
            reason: "must not be blank".into(),
        });
    }
    if fields.unit_price <= Decimal::ZERO {
        return Err(AppError::Validation {
            field: "unit_price",
            reason: "must be greater than zero".into(),
        });
    }
    if !(1..=50).contains(&fields.quantity) {
        return Err(AppError::Validation {
            field: "quantity",
            reason: "must be between 1 and 50".into(),
        });
    }
    Ok(())
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: OrderLocks::new(),
        }
    }

    pub async fn create_order(&self, details: OrderDetails) -> Result<Order, AppError> {
        validate_details(&details)?;
        let order = Order::create(details);
        Ok(self.store.save_order(order).await?)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        self.require_order(id).await
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.store.list_orders().await?)
    }

    pub async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, AppError> {
        Ok(self.store.orders_by_status(status).await?)
    }

    pub async fn orders_by_email(&self, email: &str) -> Result<Vec<Order>, AppError> {
        Ok(self.store.orders_by_email(email).await?)
    }

    /// Full update of the descriptive fields. Status and items are left
    /// alone; the caller-supplied total is stored as-is, not re-derived.
    pub async fn update_order(&self, id: Uuid, details: OrderDetails) -> Result<Order, AppError> {
        let _guard = self.locks.acquire(id).await;
        let mut order = self.require_order(id).await?;
        order.apply_details(details);
        Ok(self.store.save_order(order).await?)
    }

    pub async fn change_status(&self, id: Uuid, next: OrderStatus) -> Result<Order, AppError> {
        let _guard = self.locks.acquire(id).await;
        let mut order = self.require_order(id).await?;
        order.transition(next)?;
        Ok(self.store.save_order(order).await?)
    }

    pub async fn delete_order(&self, id: Uuid) -> Result<(), AppError> {
        let _guard = self.locks.acquire(id).await;
        if !self.store.delete_order(id).await? {
            return Err(AppError::NotFound(format!("order {}", id)));
        }
        self.locks.discard(id);
        Ok(())
    }

    /// Adds a line item and re-derives the order total before persisting.
    pub async fn add_item(&self, order_id: Uuid, fields: NewItem) -> Result<OrderItem, AppError> {
        validate_item(&fields)?;
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.require_order(order_id).await?;
        let item = order.attach_item(fields).clone();
        order.recompute_total();
        self.store.save_order(order).await?;
        Ok(item)
    }

    /// Replaces a line item's fields and re-derives both totals.
    pub async fn update_item(&self, item_id: Uuid, fields: NewItem) -> Result<OrderItem, AppError> {
        validate_item(&fields)?;
        let owner = self.require_item(item_id).await?.order_id;
        let _guard = self.locks.acquire(owner).await;
        let mut order = self.require_order(owner).await?;
        let item = match order.item_mut(item_id) {
            Some(line) => {
                line.apply_fields(fields);
                line.clone()
            }
            // removed between the owner lookup and taking the lock
            None => return Err(AppError::NotFound(format!("order item {}", item_id))),
        };
        order.recompute_total();
        self.store.save_order(order).await?;
        Ok(item)
    }

    /// Removes a line item and re-derives the order total.
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), AppError> {
        let owner = self.require_item(item_id).await?.order_id;
        let _guard = self.locks.acquire(owner).await;
        let mut order = self.require_order(owner).await?;
        if order.remove_item(item_id).is_none() {
            return Err(AppError::NotFound(format!("order item {}", item_id)));
        }
        order.recompute_total();
        self.store.save_order(order).await?;
        Ok(())
    }

    pub async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        Ok(self.require_order(order_id).await?.items)
    }

    pub async fn get_item(&self, item_id: Uuid) -> Result<OrderItem, AppError> {
        self.require_item(item_id).await
    }

    async fn require_order(&self, id: Uuid) -> Result<Order, AppError> {
        match self.store.load_order(id).await? {
            Some(order) => Ok(order),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    async fn require_item(&self, item_id: Uuid) -> Result<OrderItem, AppError> {
        match self.store.load_item(item_id).await? {
            Some(item) => Ok(item),
            None => Err(AppError::NotFound(format!("order item {}", item_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use storefront_repo::memory::MemoryStore;

    fn service() -> OrderService<MemoryStore> {
        OrderService::new(MemoryStore::new())
    }

    fn details() -> OrderDetails {
        OrderDetails {
            customer_name: "Alice Martin".into(),
            customer_email: "alice@example.com".into(),
            customer_phone: None,
            delivery_address: Some("12 Baker St".into()),
            quantity: 1,
            total_amount: dec!(20.00),
            delivery_date: None,
            special_notes: None,
        }
    }

    fn item(price: Decimal, qty: u32) -> NewItem {
        NewItem {
            product_id: Uuid::new_v4(),
            product_name: "Chocolate fudge".into(),
            product_description: None,
            unit_price: price,
            quantity: qty,
            special_instructions: None,
        }
    }

    fn field_of(err: AppError) -> &'static str {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_and_fetch_order() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let got = svc.get_order(order.id).await.unwrap();
        assert_eq!(got.customer_name, "Alice Martin");
        assert_eq!(got.total_amount, dec!(20.00));
    }

    #[tokio::test]
    async fn create_validation_names_the_field() {
        let svc = service();

        let mut bad = details();
        bad.customer_name = "  ".into();
        let err = svc.create_order(bad).await.unwrap_err();
        assert_eq!(field_of(err), "customer_name");

        let mut bad = details();
        bad.customer_email = "not-an-address".into();
        let err = svc.create_order(bad).await.unwrap_err();
        assert_eq!(field_of(err), "customer_email");

        let mut bad = details();
        bad.quantity = 0;
        let err = svc.create_order(bad).await.unwrap_err();
        assert_eq!(field_of(err), "quantity");

        let mut bad = details();
        bad.total_amount = dec!(0);
        let err = svc.create_order(bad).await.unwrap_err();
        assert_eq!(field_of(err), "total_amount");
    }

    #[tokio::test]
    async fn item_mutations_rederive_the_total() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();

        svc.add_item(order.id, item(dec!(10.00), 2)).await.unwrap();
        let second = svc.add_item(order.id, item(dec!(5.00), 3)).await.unwrap();
        let total = svc.get_order(order.id).await.unwrap().total_amount;
        assert_eq!(total, dec!(35.00));

        svc.delete_item(second.id).await.unwrap();
        let total = svc.get_order(order.id).await.unwrap().total_amount;
        assert_eq!(total, dec!(20.00));
    }

    #[tokio::test]
    async fn update_item_replaces_fields_and_total() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();
        let line = svc.add_item(order.id, item(dec!(2.50), 4)).await.unwrap();
        assert_eq!(line.total_price, dec!(10.00));

        let updated = svc.update_item(line.id, item(dec!(4.00), 2)).await.unwrap();
        assert_eq!(updated.total_price, dec!(8.00));
        assert_eq!(
            svc.get_order(order.id).await.unwrap().total_amount,
            dec!(8.00)
        );
        assert_eq!(
            svc.get_item(line.id).await.unwrap().total_price,
            dec!(8.00)
        );
    }

    #[tokio::test]
    async fn item_validation_names_the_field() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();

        let mut bad = item(dec!(1.00), 1);
        bad.product_id = Uuid::nil();
        let err = svc.add_item(order.id, bad).await.unwrap_err();
        assert_eq!(field_of(err), "product_id");

        let mut bad = item(dec!(1.00), 1);
        bad.product_name = "".into();
        let err = svc.add_item(order.id, bad).await.unwrap_err();
        assert_eq!(field_of(err), "product_name");

        let err = svc.add_item(order.id, item(dec!(0), 1)).await.unwrap_err();
        assert_eq!(field_of(err), "unit_price");

        let err = svc.add_item(order.id, item(dec!(1.00), 0)).await.unwrap_err();
        assert_eq!(field_of(err), "quantity");
        let err = svc
            .add_item(order.id, item(dec!(1.00), 51))
            .await
            .unwrap_err();
        assert_eq!(field_of(err), "quantity");
        assert!(svc.add_item(order.id, item(dec!(1.00), 50)).await.is_ok());
    }

    #[tokio::test]
    async fn status_changes_follow_the_table() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();

        let confirmed = svc
            .change_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let err = svc
            .change_status(order.id, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Delivered
            }
        ));
        // rejected change leaves the stored order untouched
        let stored = svc.get_order(order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn update_order_trusts_the_caller_total() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();
        svc.add_item(order.id, item(dec!(10.00), 1)).await.unwrap();

        let mut update = details();
        update.customer_name = "Alice M. Martin".into();
        update.total_amount = dec!(99.00);
        let updated = svc.update_order(order.id, update).await.unwrap();

        assert_eq!(updated.customer_name, "Alice M. Martin");
        // the full-update path does not re-derive from items
        assert_eq!(updated.total_amount, dec!(99.00));
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn reads_filter_by_status_and_email() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();
        let mut other = details();
        other.customer_email = "noah@example.com".into();
        svc.create_order(other).await.unwrap();

        svc.change_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();

        let confirmed = svc.orders_by_status(OrderStatus::Confirmed).await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, order.id);
        assert_eq!(
            svc.orders_by_email("alice@example.com").await.unwrap().len(),
            1
        );
        assert_eq!(svc.list_orders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_records_surface_not_found() {
        let svc = service();
        let nowhere = Uuid::new_v4();
        assert!(matches!(
            svc.get_order(nowhere).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.get_item(nowhere).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_order(nowhere).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.add_item(nowhere, item(dec!(1.00), 1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.update_order(nowhere, details()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_order_removes_it_and_its_items() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();
        let line = svc.add_item(order.id, item(dec!(10.00), 1)).await.unwrap();

        svc.delete_order(order.id).await.unwrap();
        assert!(matches!(
            svc.get_order(order.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.get_item(line.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn order_items_requires_the_order() {
        let svc = service();
        let order = svc.create_order(details()).await.unwrap();
        svc.add_item(order.id, item(dec!(3.00), 2)).await.unwrap();

        assert_eq!(svc.order_items(order.id).await.unwrap().len(), 1);
        assert!(matches!(
            svc.order_items(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
