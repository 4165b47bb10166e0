//! Cartsync command-line driver
//!
//! Runs storefront cart and coupon actions against a live server from the terminal.

use std::{io, process};

use tracing::error;

use crate::config::CliConfig;

mod commands;
mod config;
mod confirm;
mod errors;
mod observability;
mod render;

/// Cartsync CLI entry point
#[tokio::main(flavor = "current_thread")]
pub async fn main() {
    let config = CliConfig::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = observability::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("Logging error: {error}");
        }

        process::exit(1);
    }

    let mut stdout = io::stdout().lock();

    if let Err(error) = commands::run(&config, &mut stdout).await {
        error!("{error}");

        process::exit(1);
    }
}
