use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// The single DNS-over-TLS resolver every query is forwarded to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Identity the resolver's certificate must match. Chain-of-trust and
    /// hostname checks are both mandatory; there is no way to turn them off.
    #[serde(default = "default_tls_hostname")]
    pub tls_hostname: String,
}

impl UpstreamConfig {
    /// Resolved socket address, `None` when `address` is not an IP literal.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            tls_hostname: default_tls_hostname(),
        }
    }
}

fn default_address() -> String {
    "1.1.1.1".to_string()
}

fn default_port() -> u16 {
    853
}

fn default_tls_hostname() -> String {
    "cloudflare-dns.com".to_string()
}
