//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "personachat-proxyd")]
#[command(about = "PersonaChat request proxy server")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(short, long, global = true)]
    pub bind: Option<SocketAddr>,

    /// Path the proxy is mounted on
    #[arg(short, long, global = true)]
    pub path: Option<String>,

    /// Upstream model identifier
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the proxy server (default)
    Serve,
    /// Print the resolved configuration with the secret masked
    Config,
}
