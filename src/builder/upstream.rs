use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Await a collaborator call, bounded by `timeout`
///
/// Collaborator errors are wrapped with the operation name and otherwise
/// passed through untouched. Nothing is retried here.
pub(crate) async fn call_upstream<T, F>(operation: &str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(Error::Upstream {
            operation: operation.to_string(),
            source,
        }),
        Err(_) => Err(Error::Timeout {
            operation: operation.to_string(),
        }),
    }
}
