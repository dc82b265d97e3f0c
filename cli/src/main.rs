// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Edge Matrix CLI
//!
//! Entry point for the `edgematrix` binary. Parses CLI arguments,
//! initializes logging, runs one protocol operation and prints its outcome
//! as JSON on stdout.
//!
//! The process exits with the outcome's result code: `0` on success, `1`
//! on any failure or timeout.

mod cli;
mod logging;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::json;

use edgematrix_protocol::config::{network_name, RtcConfig};
use edgematrix_protocol::crypto::{Address, PrivateKey};
use edgematrix_protocol::rpc::HttpTransport;
use edgematrix_protocol::rtc::{MessageParams, Rtc, SubmissionOutcome, SubscribeParams};
use edgematrix_protocol::stream::EmSocket;

use cli::{Commands, EdgeCli, GlobalArgs};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = EdgeCli::parse();
    logging::init_logging(
        logging::default_directives(cli.global.debug),
        cli.global.log_format,
    );

    let global = &cli.global;
    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Address => address(global),
        Commands::Count => count(global).await,
        Commands::CreateSubject => create_subject(global).await,
        Commands::Receipt(args) => receipt(global, &args.hash).await,
        Commands::Send(args) => send(global, args).await,
        Commands::Subscribe(args) => subscribe(global, args).await,
        Commands::Version => {
            print_json(&json!({
                "edgematrix": env!("CARGO_PKG_VERSION"),
                "network": network_name(global.chain_id),
                "chainId": global.chain_id,
            }))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn keygen() -> Result<ExitCode> {
    let key = PrivateKey::generate();
    let address = key.address();
    tracing::info!(%address, "generated key");
    print_json(&json!({
        "privateKey": key.to_hex(),
        "address": address.to_checksum(),
    }))?;
    Ok(ExitCode::SUCCESS)
}

fn address(global: &GlobalArgs) -> Result<ExitCode> {
    let address = signing_key(global)?.address();
    print_json(&json!({
        "address": address.to_hex(),
        "checksum": address.to_checksum(),
    }))?;
    Ok(ExitCode::SUCCESS)
}

async fn count(global: &GlobalArgs) -> Result<ExitCode> {
    let key = signing_key(global)?;
    let http = http_transport(global)?;
    let outcome = engine(global.rtc_config())
        .get_telegram_count(&key, &http)
        .await
        .map(|nonce| nonce.to_decimal());
    report(&outcome)
}

async fn create_subject(global: &GlobalArgs) -> Result<ExitCode> {
    let key = signing_key(global)?;
    let http = http_transport(global)?;
    tracing::info!(
        network = %network_name(global.chain_id),
        signer = %key.address(),
        "creating subject"
    );
    let outcome = engine(global.rtc_config())
        .create_subject(global.chain_id, &key, &http)
        .await;
    report(&outcome)
}

async fn receipt(global: &GlobalArgs, hash: &str) -> Result<ExitCode> {
    let http = http_transport(global)?;
    let outcome = engine(global.rtc_config())
        .get_telegram_receipt(hash, &http)
        .await;
    report(&outcome)
}

async fn send(global: &GlobalArgs, args: cli::SendArgs) -> Result<ExitCode> {
    let key = signing_key(global)?;
    let http = http_transport(global)?;
    let mut params =
        MessageParams::new(args.subject, args.application, args.content, global.chain_id)
            .context("invalid message")?;
    if let Some(to) = args.to {
        let to: Address = to
            .parse()
            .with_context(|| format!("invalid recipient address: {to}"))?;
        params = params.with_to(to);
    }
    let outcome = engine(global.rtc_config())
        .send_message(&params, &key, &http)
        .await;
    report(&outcome)
}

async fn subscribe(global: &GlobalArgs, args: cli::SubscribeArgs) -> Result<ExitCode> {
    let key = signing_key(global)?;
    let params = SubscribeParams::new(args.subject, args.application, "", global.chain_id)
        .context("invalid subscription")?;

    let socket = EmSocket::new(global.ws_url.clone());
    socket
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", global.ws_url))?;

    let config = RtcConfig {
        subscribe_timeout: Duration::from_millis(args.timeout_ms),
        ..global.rtc_config()
    };
    let outcome = engine(config).subscribe(&params, &key, &socket).await;
    if let Err(e) = socket.close() {
        tracing::debug!(error = %e, "socket already closed");
    }
    report(&outcome)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine(config: RtcConfig) -> Rtc {
    Rtc::new(config)
}

fn signing_key(global: &GlobalArgs) -> Result<PrivateKey> {
    let raw = global
        .private_key
        .as_deref()
        .context("a private key is required (--private-key or EDGE_PRIVATE_KEY)")?;
    PrivateKey::from_hex(raw).context("invalid private key")
}

fn http_transport(global: &GlobalArgs) -> Result<HttpTransport> {
    HttpTransport::new(&global.rpc_url)
        .with_context(|| format!("invalid rpc url: {}", global.rpc_url))
}

/// Prints the outcome and maps it to the process exit code.
fn report<T: Serialize>(outcome: &SubmissionOutcome<T>) -> Result<ExitCode> {
    print_json(outcome)?;
    Ok(ExitCode::from(outcome.result_code()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}
