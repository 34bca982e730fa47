//! Client-facing listener.
//!
//! One exchange per accepted connection, each on its own task: read the
//! query, forward it upstream, write the reply, close. Exchanges never
//! coordinate, block on, or observe each other; a slow upstream for one
//! client leaves every other exchange untouched.

use crate::metrics::RelayMetrics;
use dotgate_application::RelayQueryUseCase;
use dotgate_domain::config::RelayConfig;
use dotgate_domain::RelayError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

pub struct RelayServer {
    use_case: Arc<RelayQueryUseCase>,
    metrics: RelayMetrics,
    limits: RelayConfig,
}

impl RelayServer {
    pub fn new(use_case: Arc<RelayQueryUseCase>, metrics: RelayMetrics, limits: RelayConfig) -> Self {
        Self {
            use_case,
            metrics,
            limits,
        }
    }

    /// Bind and accept indefinitely. A bind failure is returned to the
    /// caller; nothing is served in that case.
    pub async fn serve(&self, bind_addr: &str) -> Result<(), RelayError> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| RelayError::Bind {
                addr: bind_addr.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            bind_address = %bind_addr,
            upstream = %self.use_case.upstream_endpoint(),
            "Relay listening"
        );

        self.run(listener).await
    }

    /// Accept loop over an already-bound listener.
    pub async fn run(&self, listener: TcpListener) -> Result<(), RelayError> {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let use_case = self.use_case.clone();
                    let metrics = self.metrics.clone();
                    let limits = self.limits.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, peer, use_case, metrics, limits).await;
                    });
                }
                Err(e) => {
                    // Transient accept failures (fd exhaustion and friends)
                    // must not take the loop down.
                    warn!(error = %e, "Failed to accept client connection");
                }
            }
        }
    }
}

/// One full exchange. The client connection closes exactly once, when the
/// stream drops at the end of this function, on every path.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    use_case: Arc<RelayQueryUseCase>,
    metrics: RelayMetrics,
    limits: RelayConfig,
) {
    let query = match read_query(&mut stream, &limits).await {
        Ok(Some(query)) => query,
        Ok(None) => {
            debug!(client = %peer, "Client closed without sending a query");
            return;
        }
        Err(e) => {
            debug!(client = %peer, error = %e, "Abandoning exchange");
            return;
        }
    };

    metrics.record_request();
    info!(client = %peer, query_len = query.len(), "New query");
    let start = Instant::now();

    let outcome = match tokio::time::timeout(
        limits.exchange_timeout(),
        respond(&mut stream, &query, &use_case, limits.io_timeout()),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(RelayError::ExchangeTimeout),
    };

    match outcome {
        Ok(response_len) => {
            metrics.record_success(start.elapsed());
            info!(client = %peer, response_len, "Exchange complete, closing connection");
        }
        Err(e) => {
            // The protocol has no way to tell the client what went wrong;
            // the closed connection is the only signal.
            metrics.record_failure(start.elapsed());
            warn!(client = %peer, error = %e, "Exchange failed, closing without a response");
        }
    }
}

/// Read up to the message ceiling from the client. `None` means the client
/// closed before sending anything; no upstream attempt is made for those.
async fn read_query<S>(stream: &mut S, limits: &RelayConfig) -> Result<Option<Vec<u8>>, RelayError>
where
    S: AsyncRead + Unpin,
{
    let mut query = vec![0u8; limits.max_message_bytes];
    let n = tokio::time::timeout(limits.io_timeout(), stream.read(&mut query))
        .await
        .map_err(|_| RelayError::ClientRead("timed out waiting for query".to_string()))?
        .map_err(|e| RelayError::ClientRead(e.to_string()))?;

    if n == 0 {
        return Ok(None);
    }

    query.truncate(n);
    Ok(Some(query))
}

/// Forward the query and write the reply back in full.
async fn respond<S>(
    stream: &mut S,
    query: &[u8],
    use_case: &RelayQueryUseCase,
    io_timeout: Duration,
) -> Result<usize, RelayError>
where
    S: AsyncWrite + Unpin,
{
    let response = use_case.execute(query).await?;

    tokio::time::timeout(io_timeout, async {
        stream.write_all(&response).await?;
        stream.flush().await
    })
    .await
    .map_err(|_| RelayError::ClientWrite("timed out writing response".to_string()))?
    .map_err(|e| RelayError::ClientWrite(e.to_string()))?;

    Ok(response.len())
}
