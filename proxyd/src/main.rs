//! PersonaChat request proxy server

use clap::Parser;
use personachat_connector_hf::HfRouterConnector;
use personachat_core::prelude::*;
use personachat_http::HttpServer;
use std::process;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

use cli::*;
use config::{AppConfig, ConfigError};

#[derive(Error, Debug)]
enum ProxydError {
    #[error("Failed to set up upstream connector: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Presentation(#[from] PresentationError),
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_level(args.verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match args.command.clone().unwrap_or(Commands::Serve) {
        Commands::Config => {
            println!("{}", config.summary());
            Ok(())
        }
        Commands::Serve => serve(config).await,
    };

    if let Err(e) = result {
        error!("personachat-proxyd failed: {}", e);
        process::exit(1);
    }
}

/// Level used when RUST_LOG is unset: -v, -vv and -vvv step from warn to trace
fn default_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn load_config(args: &Cli) -> Result<AppConfig, ConfigError> {
    let config = AppConfig::load(args.config.as_deref())?.with_overrides(args);
    config.validate()?;
    Ok(config)
}

async fn serve(config: AppConfig) -> Result<(), ProxydError> {
    config.log_summary();

    let connector = HfRouterConnector::from_config(&config.proxy)?;
    let proxy = Arc::new(RequestProxy::new(config.proxy, Arc::new(connector)));

    info!("Starting PersonaChat proxy on {}", config.server.bind_address);

    let server = HttpServer::new(config.server);
    server.start(proxy).await?;
    Ok(())
}
