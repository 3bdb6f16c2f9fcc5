use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use subdomain_proxy::config::{self, ProxyConfig};
use subdomain_proxy::lifecycle::{signals, startup, Shutdown};
use subdomain_proxy::observability::logging::{self, LogFormat};

#[derive(Parser)]
#[command(name = "subdomain-proxy")]
#[command(about = "Forwards /{subdomain}/{path} to {subdomain}.{upstream domain}/{path}", long_about = None)]
struct Cli {
    /// TOML config file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log output format (overrides the config file)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => match config::load_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("subdomain-proxy: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ProxyConfig::default(),
    };

    logging::init(
        &file_config.observability.log_level,
        cli.log_format.unwrap_or(file_config.observability.log_format),
    );

    tracing::info!("subdomain-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match config::finalize(file_config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        upstream_domain = %config.upstream.domain,
        read_timeout_secs = config.timeouts.read_secs,
        max_retries = config.retries.max_retries,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    if let Err(e) = startup::run(config, &shutdown).await {
        tracing::error!(error = %e, "Proxy failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
