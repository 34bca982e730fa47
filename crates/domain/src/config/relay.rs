use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-exchange limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Ceiling on a single query or response, in bytes. Queries and
    /// responses are relayed as one opaque chunk up to this size; larger
    /// protocol messages are truncated at the transport level.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    /// Deadline for each blocking step: client read, TCP connect, TLS
    /// handshake, upstream write, upstream read, client write.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,

    /// Deadline for the rest of the exchange once a query has been read:
    /// upstream round-trip plus the response write.
    #[serde(default = "default_exchange_timeout_secs")]
    pub exchange_timeout_secs: u64,
}

impl RelayConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange_timeout_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: default_max_message_bytes(),
            io_timeout_secs: default_io_timeout_secs(),
            exchange_timeout_secs: default_exchange_timeout_secs(),
        }
    }
}

fn default_max_message_bytes() -> usize {
    1024
}

fn default_io_timeout_secs() -> u64 {
    5
}

fn default_exchange_timeout_secs() -> u64 {
    15
}
