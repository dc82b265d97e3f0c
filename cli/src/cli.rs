//! # CLI Interface
//!
//! Defines the command-line argument structure for `edgematrix` using
//! `clap` derive. Connection and signing options are global and may come
//! from `EDGE_*` environment variables.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use edgematrix_protocol::config::{
    PollPolicy, RtcConfig, DEFAULT_CHAIN_ID, DEFAULT_POLL_DURATION, DEFAULT_SUBSCRIBE_TIMEOUT,
};

use crate::logging::LogFormat;

/// Edge Matrix command-line client.
///
/// Creates subjects, publishes messages and subscribes to them on an Edge
/// Matrix node. Every command prints a single JSON document on stdout.
#[derive(Parser, Debug)]
#[command(
    name = "edgematrix",
    about = "Edge Matrix RTC client",
    version,
    propagate_version = true
)]
pub struct EdgeCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// JSON-RPC endpoint of the node.
    #[arg(long, global = true, env = "EDGE_RPC_URL", default_value = "http://127.0.0.1:40012")]
    pub rpc_url: String,

    /// Event stream endpoint of the node.
    #[arg(long, global = true, env = "EDGE_WS_URL", default_value = "ws://127.0.0.1:40012/edge_ws")]
    pub ws_url: String,

    /// Hex-encoded secp256k1 private key, with or without `0x`.
    #[arg(long, global = true, env = "EDGE_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Chain id transactions are bound to.
    #[arg(long, global = true, env = "EDGE_CHAIN_ID", default_value_t = DEFAULT_CHAIN_ID)]
    pub chain_id: u64,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "EDGE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Log every signed transaction and raise protocol verbosity.
    #[arg(long, global = true)]
    pub debug: bool,

    /// How long `create-subject` waits for its receipt, in milliseconds.
    #[arg(long, global = true, default_value_t = DEFAULT_POLL_DURATION.as_millis() as u64)]
    pub poll_timeout_ms: u64,

    /// Pause between two receipt lookups, in milliseconds.
    #[arg(long, global = true, default_value_t = 0)]
    pub poll_interval_ms: u64,
}

impl GlobalArgs {
    /// Engine configuration derived from the flags.
    pub fn rtc_config(&self) -> RtcConfig {
        RtcConfig {
            debug: self.debug,
            poll: PollPolicy {
                duration: Duration::from_millis(self.poll_timeout_ms),
                interval: Duration::from_millis(self.poll_interval_ms),
            },
            ..RtcConfig::default()
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh private key and print it with its address.
    Keygen,
    /// Print the address of `--private-key`.
    Address,
    /// Print the telegram count (next nonce) of `--private-key`.
    Count,
    /// Register a subject and wait for its receipt.
    CreateSubject,
    /// Look up a telegram receipt once.
    Receipt(ReceiptArgs),
    /// Publish a message to a subject.
    Send(SendArgs),
    /// Subscribe to a subject and wait for the acknowledgment.
    Subscribe(SubscribeArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `receipt` subcommand.
#[derive(Args, Debug)]
pub struct ReceiptArgs {
    /// Telegram hash returned by `create-subject`.
    pub hash: String,
}

/// Arguments for the `send` subcommand.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Subject to publish to. Hex digits are normalized to `0x`-prefixed
    /// even-length form.
    #[arg(long, short = 's')]
    pub subject: String,

    /// Application tag.
    #[arg(long, short = 'a', default_value = "edge_chat")]
    pub application: String,

    /// Message body.
    #[arg(long, short = 'c', default_value = "")]
    pub content: String,

    /// Recipient address. Defaults to the zero address.
    #[arg(long)]
    pub to: Option<String>,
}

/// Arguments for the `subscribe` subcommand.
#[derive(Args, Debug)]
pub struct SubscribeArgs {
    /// Subject to subscribe to.
    #[arg(long, short = 's')]
    pub subject: String,

    /// Application tag.
    #[arg(long, short = 'a', default_value = "edge_chat")]
    pub application: String,

    /// Acknowledgment deadline in milliseconds.
    #[arg(long, default_value_t = DEFAULT_SUBSCRIBE_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,
}
