//! arweave-uploader command line.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI flags + config file
//!          │
//!          ▼
//!   ┌──────────────┐     ┌──────────────┐     ┌───────────────┐
//!   │    config    │────▶│   Uploader   │────▶│  HTTP gateway │
//!   │ load+validate│     │ sign, commit │◀────│ anchor, price │
//!   └──────────────┘     │   confirm    │     │ commit, tx/id │
//!                        └──────┬───────┘     └───────────────┘
//!                               │
//!                        ┌──────┴───────┐
//!                        │    Wallet    │
//!                        │  JWK, PSS    │
//!                        └──────────────┘
//! ```
//!
//! Ctrl-C cancels whatever network operation is in flight.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use arweave_uploader::config::{load_config, UploaderConfig};
use arweave_uploader::ledger::client::{HttpNetworkClient, NetworkClient};
use arweave_uploader::ledger::types::{Tag, TransactionJson};
use arweave_uploader::ledger::wallet::{Wallet, DEFAULT_KEY_BITS};
use arweave_uploader::ledger::Uploader;
use arweave_uploader::lifecycle::{signals, Cancellation};
use arweave_uploader::observability;

#[derive(Parser)]
#[command(name = "arweave-uploader")]
#[command(about = "Sign and upload data to an Arweave gateway", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gateway host, overrides the config file.
    #[arg(long)]
    gateway: Option<String>,

    /// Gateway port, overrides the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Use plain HTTP on port 80.
    #[arg(long)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file as a data transaction
    Upload {
        file: PathBuf,

        /// JWK wallet file, overrides the config file.
        #[arg(short, long)]
        wallet: Option<PathBuf>,

        /// Tag as NAME=VALUE; may be repeated, order is kept.
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<Tag>,

        /// Wait until the gateway returns the transaction.
        #[arg(long)]
        confirm: bool,

        /// Give up after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print the address of a wallet
    Address {
        #[arg(short, long)]
        wallet: PathBuf,
    },
    /// Create a new wallet file
    GenerateWallet {
        #[arg(short, long)]
        out: PathBuf,

        #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
        bits: usize,
    },
    /// Look up a transaction once
    Status { id: String },
}

fn parse_tag(raw: &str) -> Result<Tag, String> {
    raw.split_once('=')
        .map(|(name, value)| Tag::new(name, value))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => UploaderConfig::default(),
    };
    if cli.insecure {
        config.gateway = config.gateway.insecure();
    }
    if let Some(host) = cli.gateway {
        config.gateway.host = host;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    observability::logging::init_logging(&config.observability);
    observability::metrics::set_enabled(config.observability.metrics_enabled);

    tracing::debug!(
        gateway = %config.gateway.base_url()?,
        poll_interval_ms = config.upload.poll_interval_ms,
        "Configuration loaded"
    );

    let scope = Cancellation::new();
    signals::cancel_on_ctrl_c(scope.clone());

    match cli.command {
        Commands::Upload {
            file,
            wallet,
            tags,
            confirm,
            timeout,
        } => {
            if wallet.is_some() {
                config.wallet.path = wallet;
            }
            if timeout.is_some() {
                config.upload.confirm_timeout_secs = timeout;
            }

            let uploader = Uploader::from_config(&config)?;
            let data = std::fs::read(&file)
                .map_err(|e| format!("failed to read {}: {}", file.display(), e))?;

            let scope = match config.upload.confirm_timeout() {
                Some(limit) => scope.with_timeout(limit),
                None => scope,
            };

            let tx = if confirm {
                uploader
                    .upload_and_confirm_with_tags(&scope, data, &tags)
                    .await?
            } else {
                uploader.upload_with_tags(&scope, data, &tags).await?
            };

            println!("{}", tx.id());
            println!("{}", config.gateway.transaction_url(&tx.id())?);
        }
        Commands::Address { wallet } => {
            let wallet = Wallet::from_file(&wallet)?;
            println!("{}", wallet.address());
        }
        Commands::GenerateWallet { out, bits } => {
            let wallet = Wallet::generate(bits)?;
            let document = serde_json::to_vec_pretty(&wallet.to_jwk()?)?;

            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&out)
                .map_err(|e| format!("failed to create {}: {}", out.display(), e))?;
            file.write_all(&document)?;

            println!("{}", wallet.address());
        }
        Commands::Status { id } => {
            let client = HttpNetworkClient::new(&config.gateway)?;
            match client.get_transaction(&scope, &id).await? {
                Some(tx) => {
                    println!("{}", serde_json::to_string_pretty(&TransactionJson::from(&tx))?);
                }
                None => println!("pending"),
            }
        }
    }

    Ok(())
}
