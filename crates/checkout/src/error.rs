//! Placement error types.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

/// Why an order placement failed. Nothing of a failed placement is persisted.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The customer's user record could not be found or created.
    #[error("User resolution failed: {0}")]
    UserResolutionFailed(#[source] StoreError),

    /// The unit could not be opened, or the order, its lines or a decrement
    /// could not be written.
    #[error("Order persistence failed: {0}")]
    OrderPersistenceFailed(#[source] StoreError),

    /// A line asked for more units than the size counter holds.
    #[error("Insufficient stock for product {product_id}, size {size_token}")]
    InsufficientStock {
        product_id: ProductId,
        size_token: String,
    },

    /// A line named a size outside the supported set.
    #[error("Unknown size: {size_token}")]
    UnknownSize { size_token: String },

    /// Every write succeeded but the unit failed to commit.
    #[error("Commit failed: {0}")]
    CommitFailed(#[source] StoreError),
}

impl PlacementError {
    /// Short label used for the `reason` metric tag and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            PlacementError::UserResolutionFailed(_) => "user_resolution_failed",
            PlacementError::OrderPersistenceFailed(_) => "order_persistence_failed",
            PlacementError::InsufficientStock { .. } => "insufficient_stock",
            PlacementError::UnknownSize { .. } => "unknown_size",
            PlacementError::CommitFailed(_) => "commit_failed",
        }
    }

    /// Returns true for business-rule rejections the client can correct, as
    /// opposed to storage faults.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PlacementError::InsufficientStock { .. } | PlacementError::UnknownSize { .. }
        )
    }
}
