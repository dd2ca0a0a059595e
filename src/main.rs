//! RAX Tree Server - Entry Point
//!
//! Serves a directory subtree as a browsable, mutable tree over a line-based
//! TCP protocol.

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use rax_tree_server::Server;
use rax_tree_server::config::{Cli, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Launching RAX tree server...");

    let server = match Server::new(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };
    server.start().await;
}
