//! dotgate infrastructure layer
//!
//! Concrete transports and the client-facing listener: `TlsForwarder`
//! performs one DNS-over-TLS round-trip per query, `RelayServer` accepts
//! plaintext DNS-over-TCP clients, `RelayMetrics` counts what happened.
pub mod metrics;
pub mod relay;

pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use relay::server::RelayServer;
pub use relay::tls::TlsForwarder;
