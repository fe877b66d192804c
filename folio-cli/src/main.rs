//! Binary crate for the `folio` command-line tool and HTTP server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Loading configuration and setting up logging
//! - Running the HTTP server
//! - Human-friendly output formatting

use clap::Parser;
use folio_core::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();

    dotenvy::dotenv().ok();
    let config = Config::load_with_env()?;
    init_tracing(config.debug);

    cmd.run(config).await
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "folio=debug,folio_core=debug,tower_http=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
