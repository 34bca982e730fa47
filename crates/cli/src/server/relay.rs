use dotgate_domain::Config;
use dotgate_infrastructure::RelayServer;
use tracing::info;

pub async fn start_relay_server(config: &Config, relay: RelayServer) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr();
    info!(
        bind_address = %bind_addr,
        upstream = %config.upstream.endpoint(),
        tls_hostname = %config.upstream.tls_hostname,
        "Starting relay"
    );

    relay.serve(&bind_addr).await?;
    Ok(())
}
