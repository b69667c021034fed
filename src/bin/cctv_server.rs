//!
//! cctv server binary
//! ------------------
//! Command-line entry point for the CCTV dashboard server. Supports configuration
//! via environment variables, with CLI flags taking precedence.

use anyhow::Result;
use std::env;

use cctv_server::config::{has_flag, ServerConfig, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    // Initialize tracing subscriber with env filter, defaulting to info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = ServerConfig::from_env_and_args(&args);
    cctv_server::server::run(config).await
}
