use clap::Parser;
use dotgate_api::AppState;
use dotgate_application::RelayQueryUseCase;
use dotgate_domain::CliOverrides;
use dotgate_infrastructure::{RelayMetrics, RelayServer, TlsForwarder};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

mod bootstrap;
mod server;

#[derive(Parser)]
#[command(name = "dotgate")]
#[command(version)]
#[command(about = "dotgate - DNS-over-TLS forwarding proxy")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Bind address for the relay listener
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Relay listener port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Upstream resolver IP address
    #[arg(short = 'u', long)]
    upstream: Option<String>,

    /// Upstream resolver port
    #[arg(long)]
    upstream_port: Option<u16>,

    /// Hostname the upstream certificate must match
    #[arg(long)]
    tls_hostname: Option<String>,

    /// Metrics endpoint port
    #[arg(short = 'm', long)]
    metrics_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        bind_address: cli.bind.clone(),
        bind_port: cli.port,
        upstream_address: cli.upstream.clone(),
        upstream_port: cli.upstream_port,
        tls_hostname: cli.tls_hostname.clone(),
        metrics_port: cli.metrics_port,
        log_level: cli.log_level.clone(),
        debug: cli.debug,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting dotgate v{}", env!("CARGO_PKG_VERSION"));

    let upstream_addr = config
        .upstream
        .socket_addr()
        .expect("validated configuration has a resolvable upstream address");

    let metrics = RelayMetrics::new();
    let forwarder = TlsForwarder::new(
        upstream_addr,
        config.upstream.tls_hostname.clone(),
        &config.relay,
    );
    let use_case = Arc::new(RelayQueryUseCase::new(Arc::new(forwarder)));
    let relay = RelayServer::new(use_case, metrics.clone(), config.relay.clone());

    // The metrics surface is optional plumbing; it must never take the
    // relay down with it.
    if config.metrics.enabled {
        let app_state = AppState::new(metrics, config.upstream.endpoint());
        let metrics_addr: SocketAddr =
            format!("{}:{}", config.server.bind_address, config.metrics.port).parse()?;
        tokio::spawn(async move {
            if let Err(e) = server::start_web_server(metrics_addr, app_state).await {
                error!(error = %e, "Metrics server error");
            }
        });
    }

    // A relay bind failure, on the other hand, is fatal.
    server::start_relay_server(&config, relay).await?;

    Ok(())
}
