//! Upper bound on gateway call duration.

use std::future::Future;
use std::time::Duration;

use super::error::{GatewayError, GatewayResult};

/// Run a gateway call with an upper bound on how long it may take.
pub async fn with_deadline<T, F>(operation: &'static str, limit: Duration, call: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::timeout(operation, limit)),
    }
}
