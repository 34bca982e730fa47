use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RelayError {
    #[error("Cannot bind relay listener on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Invalid TLS server name '{0}'")]
    InvalidTlsName(String),

    #[error("Timeout connecting to upstream {server}")]
    ConnectTimeout { server: String },

    #[error("Connection refused by upstream {server}: {reason}")]
    ConnectionRefused { server: String, reason: String },

    #[error("TLS handshake failed with {server}: {reason}")]
    TlsHandshake { server: String, reason: String },

    #[error("Failed to write query to upstream {server}: {reason}")]
    UpstreamWrite { server: String, reason: String },

    #[error("Failed to read response from upstream {server}: {reason}")]
    UpstreamRead { server: String, reason: String },

    #[error("Timeout waiting on upstream {server}")]
    UpstreamTimeout { server: String },

    #[error("Upstream {server} closed the session without a response")]
    EmptyUpstreamResponse { server: String },

    #[error("Exchange exceeded its total deadline")]
    ExchangeTimeout,

    #[error("Failed to read query from client: {0}")]
    ClientRead(String),

    #[error("Failed to write response to client: {0}")]
    ClientWrite(String),
}

impl RelayError {
    /// True for failures of the upstream leg of an exchange: everything
    /// between opening the TCP connection and reading the response.
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTlsName(_)
                | Self::ConnectTimeout { .. }
                | Self::ConnectionRefused { .. }
                | Self::TlsHandshake { .. }
                | Self::UpstreamWrite { .. }
                | Self::UpstreamRead { .. }
                | Self::UpstreamTimeout { .. }
                | Self::EmptyUpstreamResponse { .. }
        )
    }

    /// True when the failure was a deadline, either per-step or whole-exchange.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout { .. } | Self::UpstreamTimeout { .. } | Self::ExchangeTimeout
        )
    }
}
