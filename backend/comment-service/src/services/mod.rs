/// Business logic layer
///
/// Services validate caller input, delegate to the configured `CommentStore`
/// and translate store failures into `AppError` with operation context.
pub mod comments;
pub mod posts;

pub use comments::CommentService;
pub use posts::PostService;

use crate::error::{AppError, ErrorKind, Result};
use crate::models::Pagination;
use crate::storage::StoreError;
use validator::Validate;

/// Apply defaults and check `offset >= 0`, `0 <= limit <= 100`
pub(crate) fn validate_pagination(offset: Option<i64>, limit: Option<i64>) -> Result<Pagination> {
    let page = Pagination::from_optional(offset, limit);
    page.validate()?;
    Ok(page)
}

/// Map a store failure to `AppError`, logging it at a level matching its kind
pub(crate) fn store_failure(operation: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |err| {
        let err = AppError::from(err).context(operation);
        match err.kind() {
            ErrorKind::Internal => tracing::error!(operation, error = %err, "Store operation failed"),
            _ => tracing::warn!(operation, error = %err, "Store operation rejected"),
        }
        err
    }
}
