use serde::{Deserialize, Serialize};

/// Fulfillment lifecycle of an [`Order`](crate::domain::order::Order).
///
/// ```text
/// PENDING ──► CONFIRMED ──► IN_PROGRESS ──► READY ──► DELIVERED
///    │            │              │
///    └────────────┴──────────────┴──► CANCELLED
/// ```
///
/// `DELIVERED` and `CANCELLED` are terminal. Every change must go through
/// [`OrderStatus::validate_transition`]; there is no legal self-transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProgress,
    Ready,
    Delivered,
    Cancelled,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid status transition from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Status that counts as a completed purchase when gating reviews.
    ///
    /// The order lifecycle has no separate "completed" value; a delivered
    /// order is the qualifying purchase.
    pub const COMPLETED_PURCHASE: OrderStatus = OrderStatus::Delivered;

    /// Statuses reachable from `self` in one step.
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[InProgress, Cancelled],
            InProgress => &[Ready, Cancelled],
            Ready => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Returns `next` if the step is legal, without mutating anything.
    pub fn validate_transition(self, next: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Wire/storage token, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "IN_PROGRESS" => Ok(OrderStatus::InProgress),
            "READY" => Ok(OrderStatus::Ready),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
