use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-supplied review fields. Admission checks (purchase verification,
/// duplicate detection) are the review service's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub email: String,
    pub rating: u8,
    pub comment: String,
}

/// A product review. Immutable once written; removed individually by an
/// administrator or in bulk when its product goes away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    /// Reviewed product. Plain reference; the review does not own it.
    pub product_id: Uuid,
    pub email: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(product_id: Uuid, fields: NewReview) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            email: fields.email,
            rating: fields.rating,
            comment: fields.comment,
            created_at: Utc::now(),
        }
    }
}
