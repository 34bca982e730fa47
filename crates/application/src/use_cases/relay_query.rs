use crate::ports::UpstreamForwarder;
use dotgate_domain::RelayError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Drives the upstream leg of one exchange: hand the client's raw query to
/// the forwarder, get the resolver's reply back.
///
/// Exchanges are causally independent; this type holds no per-exchange
/// state and a single instance serves arbitrarily many concurrent calls.
pub struct RelayQueryUseCase {
    forwarder: Arc<dyn UpstreamForwarder>,
}

impl RelayQueryUseCase {
    pub fn new(forwarder: Arc<dyn UpstreamForwarder>) -> Self {
        Self { forwarder }
    }

    /// Forward one query. One upstream attempt, no retry; a failed call
    /// leaves nothing behind for the next query to observe.
    pub async fn execute(&self, query: &[u8]) -> Result<Vec<u8>, RelayError> {
        debug_assert!(!query.is_empty(), "empty queries are dropped by the listener");

        let start = Instant::now();
        debug!(
            upstream = %self.forwarder.upstream_endpoint(),
            query_len = query.len(),
            "Forwarding query upstream"
        );

        match self.forwarder.forward(query).await {
            Ok(response) => {
                debug!(
                    upstream = %self.forwarder.upstream_endpoint(),
                    response_len = response.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream round-trip complete"
                );
                Ok(response)
            }
            Err(e) => {
                warn!(
                    upstream = %self.forwarder.upstream_endpoint(),
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream exchange failed"
                );
                Err(e)
            }
        }
    }

    pub fn upstream_endpoint(&self) -> &str {
        self.forwarder.upstream_endpoint()
    }
}
