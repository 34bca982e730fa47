use async_trait::async_trait;
use dotgate_domain::RelayError;

/// One validated, encrypted query/response round-trip against the fixed
/// upstream resolver.
///
/// Each call opens a fresh session and closes it before returning, on both
/// the success and every failure path. Sessions are never shared, pooled,
/// or reused across calls. Exactly one attempt is made per call; retry
/// policy, if any, belongs to the caller.
#[async_trait]
pub trait UpstreamForwarder: Send + Sync {
    /// Forward a non-empty query payload, returning the resolver's reply
    /// bytes unmodified. Never returns partial or fabricated data on
    /// failure.
    async fn forward(&self, query: &[u8]) -> Result<Vec<u8>, RelayError>;

    /// Human-readable upstream identity for logs and metrics labels.
    fn upstream_endpoint(&self) -> &str;
}
