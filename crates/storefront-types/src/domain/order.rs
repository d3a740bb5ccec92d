use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::status::{OrderStatus, TransitionError};

/// Caller-supplied order fields, used both when placing an order and when
/// replacing the descriptive fields of an existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    pub quantity: u32,
    pub total_amount: Decimal,
    #[serde(default)]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub special_notes: Option<String>,
}

/// Caller-supplied line item fields. Product name/description are snapshots
/// taken at add time, never live links into the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub product_id: Uuid,
    pub product_name: String,
    #[serde(default)]
    pub product_description: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    /// Owning order. Weak back-reference only; the order owns the item.
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_description: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total_price: Decimal,
    pub special_instructions: Option<String>,
}

/// Order aggregate: the order record together with its owned, ordered items.
/// Loaded and saved as one unit; `total_amount` is re-derived from the items
/// after every item mutation made through the lifecycle service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub quantity: u32,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub special_notes: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn new(order_id: Uuid, fields: NewItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id: fields.product_id,
            product_name: fields.product_name,
            product_description: fields.product_description,
            unit_price: fields.unit_price,
            quantity: fields.quantity,
            total_price: Self::line_total(fields.unit_price, fields.quantity),
            special_instructions: fields.special_instructions,
        }
    }

    /// `unit_price × quantity` in exact decimal arithmetic.
    pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
        unit_price * Decimal::from(quantity)
    }

    /// Replaces the mutable fields and re-derives the line total.
    pub fn apply_fields(&mut self, fields: NewItem) {
        self.product_id = fields.product_id;
        self.product_name = fields.product_name;
        self.product_description = fields.product_description;
        self.unit_price = fields.unit_price;
        self.quantity = fields.quantity;
        self.special_instructions = fields.special_instructions;
        self.recompute_total();
    }

    pub fn recompute_total(&mut self) {
        self.total_price = Self::line_total(self.unit_price, self.quantity);
    }
}

impl Order {
    /// Creates a PENDING order stamped with the current time and no items.
    /// The caller-supplied total stands until items are attached.
    pub fn create(details: OrderDetails) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_name: details.customer_name,
            customer_email: details.customer_email,
            customer_phone: details.customer_phone,
            delivery_address: details.delivery_address,
            quantity: details.quantity,
            total_amount: details.total_amount,
            status: OrderStatus::Pending,
            order_date: now,
            delivery_date: details.delivery_date,
            special_notes: details.special_notes,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the descriptive fields (full-update path). Status, items and
    /// order date are untouched; the supplied total is trusted as-is.
    pub fn apply_details(&mut self, details: OrderDetails) {
        self.customer_name = details.customer_name;
        self.customer_email = details.customer_email;
        self.customer_phone = details.customer_phone;
        self.delivery_address = details.delivery_address;
        self.quantity = details.quantity;
        self.total_amount = details.total_amount;
        self.delivery_date = details.delivery_date;
        self.special_notes = details.special_notes;
        self.touch();
    }

    /// Applies a status change, rejecting anything outside the transition
    /// table before any field is modified.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), TransitionError> {
        self.status = self.status.validate_transition(next)?;
        self.touch();
        Ok(())
    }

    /// Appends a new item owned by this order and returns it. The order
    /// total is not re-derived here; callers run [`Order::recompute_total`]
    /// once the mutation is complete.
    pub fn attach_item(&mut self, fields: NewItem) -> &OrderItem {
        self.items.push(OrderItem::new(self.id, fields));
        let idx = self.items.len() - 1;
        &self.items[idx]
    }

    pub fn item(&self, item_id: Uuid) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: Uuid) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    /// Detaches an item, keeping the remaining items in order.
    pub fn remove_item(&mut self, item_id: Uuid) -> Option<OrderItem> {
        let idx = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(idx))
    }

    /// Sum of the line totals, accumulated from zero in exact decimals.
    pub fn total_of(items: &[OrderItem]) -> Decimal {
        items
            .iter()
            .fold(Decimal::ZERO, |acc, item| acc + item.total_price)
    }

    /// Re-derives `total_amount` from the current items (zero when empty).
    pub fn recompute_total(&mut self) {
        self.total_amount = Self::total_of(&self.items);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
