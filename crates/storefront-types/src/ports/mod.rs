pub mod catalog;
pub mod order_store;
pub mod review_store;

/// Failure surfaced by a persistence or catalog collaborator. Collaborators
/// are expected to fail within their own bounded timeouts; the core wraps
/// whatever they report and never retries internally.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
