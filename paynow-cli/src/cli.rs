//! Command-line interface.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use paynow::fields::FieldSet;
use paynow::payment::Payment;
use paynow::response::StatusResponse;
use paynow::transport::Transport;
use paynow::types::PaymentMethod;
use paynow::{PaynowClient, PaynowError};
use rust_decimal::Decimal;

use crate::config::{CliConfig, DEFAULT_CONFIG_PATH};

type BoxError = Box<dyn std::error::Error>;

#[derive(Parser, Debug)]
#[command(name = "paynow", version)]
#[command(about = "Initiate and track Paynow mobile money payments")]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(long, global = true, env = "PAYNOW_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initiate a mobile money payment
    Pay(PayCommand),
    /// Check a transaction once
    Poll(PollCommand),
    /// Print the signature for a set of fields
    Sign(SignCommand),
}

#[derive(ClapArgs, Debug)]
pub struct PayCommand {
    /// Merchant reference, e.g. an invoice number
    #[arg(long)]
    pub reference: String,
    /// Amount to charge
    #[arg(long)]
    pub amount: Decimal,
    /// Customer email
    #[arg(long)]
    pub email: String,
    /// Payer's mobile number
    #[arg(long)]
    pub phone: String,
    /// Mobile money channel (ecocash, onemoney)
    #[arg(long)]
    pub method: Option<PaymentMethod>,
    /// Keep polling until the payment settles
    #[arg(long)]
    pub wait: bool,
    /// Seconds between polls
    #[arg(long, default_value_t = 5)]
    pub interval: u64,
    /// Maximum number of polls (at least 1)
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_polls: u32,
}

#[derive(ClapArgs, Debug)]
pub struct PollCommand {
    /// Poll URL returned when the payment was initiated
    pub poll_url: String,
}

#[derive(ClapArgs, Debug)]
pub struct SignCommand {
    /// Fields as name=value pairs
    #[arg(value_parser = parse_field, required = true)]
    pub fields: Vec<(String, String)>,
    /// Integration key (defaults to the configured key)
    #[arg(long)]
    pub key: Option<String>,
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected name=value, got '{s}'"))
}

impl Args {
    pub async fn run(self, out: &mut impl Write) -> Result<(), BoxError> {
        let config = CliConfig::load(&self.config)?;
        tracing::debug!(path = %self.config.display(), "Loaded configuration");

        match self.command {
            Command::Pay(cmd) => cmd.run(&config, out).await,
            Command::Poll(cmd) => cmd.run(&config, out).await,
            Command::Sign(cmd) => cmd.run(&config, out),
        }
    }
}

fn build_client(config: &CliConfig) -> Result<PaynowClient<paynow_http::ReqwestTransport>, BoxError> {
    let mut transport = paynow_http::ReqwestTransport::new();
    if let Some(timeout) = config.timeout() {
        transport = transport.with_timeout(timeout);
    }
    Ok(PaynowClient::new(config.to_paynow()?, transport))
}

impl PayCommand {
    async fn run(self, config: &CliConfig, out: &mut impl Write) -> Result<(), BoxError> {
        let client = build_client(config)?;
        let mut payment = Payment::new(self.reference, self.amount, self.email, self.phone);
        payment.method = self.method;

        let init = client.send_mobile(&payment).await?;
        writeln!(out, "status: {}", init.status)?;
        if let Some(instructions) = &init.instructions {
            writeln!(out, "instructions: {instructions}")?;
        }
        let Some(poll_url) = init.poll_url else {
            return Ok(());
        };
        writeln!(out, "poll url: {poll_url}")?;

        if self.wait {
            let interval = Duration::from_secs(self.interval);
            let status = wait_for_settlement(&client, &poll_url, interval, self.max_polls).await?;
            print_status(out, &status)?;
            if !status.status.is_settled() {
                return Err(format!("payment not completed: {}", status.status).into());
            }
        }
        Ok(())
    }
}

impl PollCommand {
    async fn run(self, config: &CliConfig, out: &mut impl Write) -> Result<(), BoxError> {
        let client = build_client(config)?;
        let status = client.poll_transaction(&self.poll_url).await?;
        print_status(out, &status)?;
        Ok(())
    }
}

impl SignCommand {
    fn run(self, config: &CliConfig, out: &mut impl Write) -> Result<(), BoxError> {
        let key = match self.key {
            Some(key) => key,
            None => config.to_paynow()?.integration_key.expose().to_owned(),
        };
        let fields: FieldSet = self.fields.into_iter().collect();
        writeln!(out, "{}", fields.signature(&key))?;
        writeln!(out, "{}", fields.signed(&key).to_form_body())?;
        Ok(())
    }
}

/// Polls until the transaction is settled or failed, or `max_polls` is spent.
///
/// Always polls at least once, so a `max_polls` of 0 behaves like 1. Returns
/// the last status seen. Transport errors end the loop.
pub async fn wait_for_settlement<T: Transport>(
    client: &PaynowClient<T>,
    poll_url: &str,
    interval: Duration,
    max_polls: u32,
) -> Result<StatusResponse, PaynowError> {
    let mut status = client.poll_transaction(poll_url).await?;
    let mut polls = 1;
    while polls < max_polls && !status.status.is_settled() && !status.status.is_failed() {
        tracing::info!(status = %status.status, polls, "Waiting for payment");
        tokio::time::sleep(interval).await;
        status = client.poll_transaction(poll_url).await?;
        polls += 1;
    }
    Ok(status)
}

fn print_status(out: &mut impl Write, status: &StatusResponse) -> std::io::Result<()> {
    writeln!(out, "reference: {}", status.reference)?;
    writeln!(out, "paynow reference: {}", status.paynow_reference)?;
    writeln!(out, "amount: {}", status.amount)?;
    writeln!(out, "status: {}", status.status)
}
