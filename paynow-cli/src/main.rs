//! Command-line client for the Paynow payment gateway.
//!
//! # Usage
//!
//! ```bash
//! # Initiate an EcoCash payment and wait for it to settle
//! paynow pay --reference INV-1001 --amount 10.00 \
//!     --email user@example.com --phone 0771234567 --wait
//!
//! # Check a transaction once
//! paynow poll https://www.paynow.co.zw/interface/poll/...
//!
//! # Print the signature for a set of fields
//! paynow sign reference=INV-1001 amount=10.00 --key "$PAYNOW_INTEGRATION_KEY"
//! ```
//!
//! # Environment Variables
//!
//! - `PAYNOW_CONFIG` - Path to TOML configuration file (default: `paynow.toml`)
//! - `PAYNOW_INTEGRATION_ID`, `PAYNOW_INTEGRATION_KEY` - Credentials
//! - `PAYNOW_RESULT_URL`, `PAYNOW_RETURN_URL` - Callback URLs
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! Variables may also be set in a `.env` file in the working directory.

mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env is fine; the process environment still applies
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    if let Err(e) = args.run(&mut std::io::stdout().lock()).await {
        tracing::error!("paynow failed: {e}");
        std::process::exit(1);
    }
}
