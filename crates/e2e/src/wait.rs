//! Bounded waiting
//!
//! Wraps a single future in a deadline. There is no retry: when the deadline
//! passes the wait fails with [`E2eError::Timeout`] and the caller decides what
//! that means. Independent of the browser's implicit wait.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};

/// Await `fut` for at most `timeout`.
pub async fn bounded<T, F>(timeout: Duration, what: &str, fut: F) -> E2eResult<T>
where
    F: Future<Output = E2eResult<T>>,
{
    debug!("Waiting up to {} ms for {}", timeout.as_millis(), what);

    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Gave up waiting for {} after {} ms", what, timeout.as_millis());
            Err(E2eError::Timeout {
                what: what.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}
