use serde::{Deserialize, Serialize};

/// Metrics HTTP endpoint. Bound on the relay's bind address; not required
/// for forwarding, a bind failure here never takes the relay down.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            port: default_port(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    5000
}
