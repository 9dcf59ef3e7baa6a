//! Time bounds for backend calls.

use crate::error::{Result, StorageError};
use std::future::Future;
use std::time::Duration;

/// Runs a repository call, failing with [`StorageError::Timeout`] if it does
/// not finish within `limit`.
pub async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(format!(
            "backend call exceeded {}ms",
            limit.as_millis()
        ))),
    }
}
