//! Per-attempt timeout enforcement.

use std::future::Future;
use std::time::Duration;

use crate::rpc::transport::TransportFailure;

/// Run a transport future under a deadline.
///
/// An elapsed deadline becomes `TransportFailure::Timeout`; the inner future is
/// dropped, so a late reply is discarded.
pub async fn with_timeout<F, T>(limit: Duration, future: F) -> Result<T, TransportFailure>
where
    F: Future<Output = Result<T, TransportFailure>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(TransportFailure::Timeout(limit)),
    }
}
