//! Upstream transport for DNS-over-TLS (RFC 7858)
//!
//! Every `forward` call runs one short-lived session:
//! Idle → Connecting → Handshaking → Writing → Reading → Closed.
//! Sessions are opened fresh per query and closed before returning; they
//! are never pooled or reused. Certificate chain validation and hostname
//! matching are rustls defaults and cannot be disabled here.

use async_trait::async_trait;
use dotgate_application::ports::UpstreamForwarder;
use dotgate_domain::config::RelayConfig;
use dotgate_domain::RelayError;
use rustls::pki_types::ServerName;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// Trust store validated for the current host. Platform trust facilities
/// are intentionally not consulted; the bundled webpki roots behave the
/// same in containers and on developer machines.
pub fn default_root_store() -> rustls::RootCertStore {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    root_store
}

/// DNS-over-TLS upstream forwarder.
pub struct TlsForwarder {
    server_addr: SocketAddr,
    tls_hostname: String,
    endpoint: String,
    tls_config: Arc<rustls::ClientConfig>,
    max_message_bytes: usize,
    io_timeout: Duration,
}

impl TlsForwarder {
    pub fn new(server_addr: SocketAddr, tls_hostname: String, limits: &RelayConfig) -> Self {
        Self::with_root_store(server_addr, tls_hostname, limits, default_root_store())
    }

    /// Same forwarder, custom trust anchors. Validation stays mandatory;
    /// only the set of trusted roots changes.
    pub fn with_root_store(
        server_addr: SocketAddr,
        tls_hostname: String,
        limits: &RelayConfig,
        root_store: rustls::RootCertStore,
    ) -> Self {
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Self {
            server_addr,
            endpoint: server_addr.to_string(),
            tls_hostname,
            tls_config: Arc::new(tls_config),
            max_message_bytes: limits.max_message_bytes,
            io_timeout: limits.io_timeout(),
        }
    }

    /// TCP connect + TLS handshake. The query has not been transmitted yet
    /// when any of these steps fails.
    async fn connect(&self) -> Result<TlsStream<TcpStream>, RelayError> {
        let server_name = ServerName::try_from(self.tls_hostname.clone())
            .map_err(|_| RelayError::InvalidTlsName(self.tls_hostname.clone()))?;

        let tcp_stream = tokio::time::timeout(self.io_timeout, TcpStream::connect(self.server_addr))
            .await
            .map_err(|_| RelayError::ConnectTimeout {
                server: self.endpoint.clone(),
            })?
            .map_err(|e| RelayError::ConnectionRefused {
                server: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let connector = TlsConnector::from(self.tls_config.clone());
        let tls_stream = tokio::time::timeout(
            self.io_timeout,
            connector.connect(server_name, tcp_stream),
        )
        .await
        .map_err(|_| RelayError::UpstreamTimeout {
            server: self.endpoint.clone(),
        })?
        .map_err(|e| RelayError::TlsHandshake {
            server: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        debug!(server = %self.endpoint, hostname = %self.tls_hostname, "TLS session established");
        Ok(tls_stream)
    }

    /// Write the query verbatim, read one response chunk. The relay is
    /// byte-transparent: no framing is added or stripped in either
    /// direction, and a single read up to the ceiling is treated as the
    /// whole response.
    async fn exchange(
        &self,
        stream: &mut TlsStream<TcpStream>,
        query: &[u8],
    ) -> Result<Vec<u8>, RelayError> {
        tokio::time::timeout(self.io_timeout, async {
            stream.write_all(query).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| RelayError::UpstreamTimeout {
            server: self.endpoint.clone(),
        })?
        .map_err(|e| RelayError::UpstreamWrite {
            server: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        let mut response = vec![0u8; self.max_message_bytes];
        let n = tokio::time::timeout(self.io_timeout, stream.read(&mut response))
            .await
            .map_err(|_| RelayError::UpstreamTimeout {
                server: self.endpoint.clone(),
            })?
            .map_err(|e| RelayError::UpstreamRead {
                server: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        if n == 0 {
            return Err(RelayError::EmptyUpstreamResponse {
                server: self.endpoint.clone(),
            });
        }

        response.truncate(n);
        Ok(response)
    }
}

#[async_trait]
impl UpstreamForwarder for TlsForwarder {
    async fn forward(&self, query: &[u8]) -> Result<Vec<u8>, RelayError> {
        let mut stream = self.connect().await?;

        let result = self.exchange(&mut stream, query).await;

        // close_notify is best effort; the session and the underlying TCP
        // connection are gone once the stream drops, on every path.
        let _ = stream.shutdown().await;

        if let Ok(response) = &result {
            debug!(
                server = %self.endpoint,
                response_len = response.len(),
                "TLS session closed after one round-trip"
            );
        }

        result
    }

    fn upstream_endpoint(&self) -> &str {
        &self.endpoint
    }
}
