use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use storefront_types::domain::status::{OrderStatus, TransitionError};
use storefront_types::ports::StoreError;

/// Application-level failures, one variant per recoverable condition plus
/// `Unavailable` for collaborator outages. Everything except `Unavailable`
/// maps to a 4xx response.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Unavailable(#[from] StoreError),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::InvalidTransition {
            from: err.from,
            to: err.to,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = match &self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::to_string(&ErrorBody {
            error: self.to_string(),
        })
        .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_kind() {
        let cases = [
            (
                AppError::Validation {
                    field: "customer_name",
                    reason: "must not be blank".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::NotFound("order abc".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::InvalidTransition {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Delivered,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Forbidden("no completed purchase".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::Conflict("already reviewed".into()),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Unavailable(StoreError::Unavailable("db down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn transition_errors_carry_both_endpoints() {
        let err: AppError = TransitionError {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid status transition from DELIVERED to PENDING"
        );
    }
}
