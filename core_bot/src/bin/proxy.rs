use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use core_bot::{GameData, Proxy, ProxyConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Gridghost game proxy", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "gridghost.json")]
    config: PathBuf,
    /// Overrides the listen port from the configuration.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        match ProxyConfig::from_file(&cli.config) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "invalid configuration");
                return ExitCode::FAILURE;
            }
        }
    } else {
        info!(path = %cli.config.display(), "no configuration file, using defaults");
        ProxyConfig::default()
    };
    if let Some(port) = cli.port {
        config.listen_port = port;
    }

    let data = match GameData::load(&config.data_dir) {
        Ok(data) => Arc::new(data),
        Err(err) => {
            error!(error = %err, "failed to load game data");
            return ExitCode::FAILURE;
        }
    };

    let proxy = Proxy::new(config, data);
    if let Err(err) = proxy.run() {
        error!(error = %err, "proxy failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
