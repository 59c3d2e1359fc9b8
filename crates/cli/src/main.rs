use clap::Parser;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use warden_dns_domain::CliOverrides;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "warden-dns")]
#[command(version)]
#[command(about = "Warden DNS - filtering and caching DNS proxy")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS listen port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.port,
        bind_address: cli.bind.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config.logging);

    info!("Starting Warden DNS v{}", env!("CARGO_PKG_VERSION"));

    let dns_services = di::DnsServices::new(&config).await?;
    dns_services.print_configuration.execute();

    let shutdown = CancellationToken::new();
    server::spawn_signal_handlers(dns_services.print_configuration.clone(), shutdown.clone())?;

    let dns_addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.dns_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen address: {}", e))?;

    if let Err(e) = server::start_dns_server(dns_addr, dns_services.handler, shutdown).await {
        error!(error = %e, "DNS server error");
        return Err(e);
    }

    info!("Server shutdown complete");
    Ok(())
}
