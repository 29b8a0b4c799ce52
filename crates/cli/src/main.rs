use clap::Parser;
use std::time::Duration;
use steer_dns_domain::CliOverrides;
use steer_dns_infrastructure::dns::DnsServerHandler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "steer-dns")]
#[command(version)]
#[command(about = "Steer DNS - transparent DNS relay that steers CDN answers to preferred addresses")]
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

    /// Upstream server list file
    #[arg(short = 'u', long, value_name = "FILE")]
    upstreams: Option<String>,

    /// Replacement cache file
    #[arg(long, value_name = "FILE")]
    cache: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        port: cli.port,
        bind_address: cli.bind,
        upstream_file: cli.upstreams,
        cache_path: cli.cache,
        log_level: cli.log_level,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting Steer DNS v{}", env!("CARGO_PKG_VERSION"));

    let dns_services = di::DnsServices::new(&config)
        .inspect_err(|e| error!(error = %e, "Startup failed"))?;
    let dns_handler = DnsServerHandler::new(dns_services.handler_use_case);

    let shutdown = CancellationToken::new();
    server::spawn_signal_listener(shutdown.clone());

    server::start_dns_server(
        config.server.listen_address(),
        dns_handler,
        Duration::from_secs(config.server.tcp_idle_timeout),
        shutdown,
    )
    .await
    .inspect_err(|e| error!(error = %e, "DNS server failed"))?;

    info!("Server shutdown complete");
    Ok(())
}
