mod errors;
mod logging;
mod metrics;
mod relay;
mod root;
mod server;
mod upstream;

pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use metrics::MetricsConfig;
pub use relay::RelayConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
