//! # Mix Provider Node
//!
//! ## Commands
//!
//! - `run` - start the provider and serve until Ctrl+C
//! - `add-user` - register a client's link public key
//! - `generate-keys` - create the node keys in the data directory and exit
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then `MX_*` environment overrides)
//! 2. Initialize logging
//! 3. Build the `ProviderContainer` (data dir, keys, storage, pipeline)
//! 4. Drain SURB-ACKs from the scheduler channel until shutdown

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use mx_01_user_db::UserDirectoryApi;
use mx_03_provider::ProviderApi;
use node_runtime::adapters::{ensure_data_dir, ChannelScheduler, DataDirLock, NodeKeys, UnavailableSphinx};
use node_runtime::container::{open_directory, NodeConfig, ProviderContainer};
use node_runtime::logging::init_logging;
use shared_types::{to_print_string, PublicKey};

#[derive(Parser, Debug)]
#[command(name = "node-runtime", about = "Mix network provider node", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the provider.
    Run {
        /// Path to the TOML configuration file.
        #[arg(short = 'f', long = "config")]
        config: Option<PathBuf>,
    },
    /// Register a user (the node must not be running).
    AddUser {
        #[arg(short = 'f', long = "config")]
        config: Option<PathBuf>,
        #[arg(long)]
        username: String,
        /// X25519 link public key, hex encoded.
        #[arg(long)]
        public_key: String,
    },
    /// Generate the node keys and exit.
    GenerateKeys {
        #[arg(short = 'f', long = "config")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<NodeConfig> {
    let mut config = match path {
        Some(path) => NodeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => NodeConfig::default(),
    };
    config.apply_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// The data directory comes first: a relative log file lives in it.
fn init(config: &NodeConfig) -> Result<()> {
    ensure_data_dir(&config.server.data_dir)?;
    init_logging(&config.logging, &config.server.data_dir)?;
    Ok(())
}

fn generate_keys(config: &NodeConfig) -> Result<()> {
    let data_dir = &config.server.data_dir;
    let _lock = DataDirLock::acquire(data_dir)?;
    NodeKeys::load_or_generate(data_dir).context("Failed to initialize node keys")?;
    info!("[node] Keys ready in {:?}", data_dir);
    Ok(())
}

fn add_user(config: &NodeConfig, username: &str, public_key: &str) -> Result<()> {
    let key_bytes = hex::decode(public_key.trim()).context("Public key is not valid hex")?;
    let key = PublicKey::from_slice(&key_bytes).context("Public key has the wrong length")?;

    let data_dir = &config.server.data_dir;
    let _lock = DataDirLock::acquire(data_dir).context("Is the node running?")?;

    let directory = open_directory(config)?;
    let result = directory.add(username.as_bytes(), &key);
    directory.close();
    result.context("Failed to add user")?;

    info!("[node] Added user '{}'", to_print_string(username.as_bytes()));
    Ok(())
}

async fn run(config: NodeConfig) -> Result<()> {
    if config.debug.generate_only {
        generate_keys(&config)?;
        info!("[node] generate_only is set, exiting");
        return Ok(());
    }

    let (scheduler, mut outbound) = ChannelScheduler::new();
    let container = ProviderContainer::new(
        config,
        Arc::new(UnavailableSphinx),
        Arc::new(scheduler),
    )
    .context("Failed to start provider")?;
    let container = Arc::new(container);

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let forwarder = tokio::spawn(async move {
        loop {
            tokio::select! {
                pkt = outbound.recv() => match pkt {
                    Some(pkt) => info!("[node] SURB-ACK {} ready for {:?}", pkt.id, pkt.next_node_hop()),
                    None => break,
                },
                _ = shutdown_rx.changed() => break,
            }
        }
    });

    info!("[node] Provider is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    if shutdown_tx.send(true).is_err() {
        warn!("[node] Outbound forwarder already stopped");
    }
    let halting = Arc::clone(&container);
    tokio::task::spawn_blocking(move || halting.shutdown()).await?;
    forwarder.await?;

    info!("[node] Final stats: {:?}", container.provider().stats());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { config } => {
            let config = load_config(config.as_ref())?;
            init(&config)?;
            run(config).await
        }
        Command::AddUser {
            config,
            username,
            public_key,
        } => {
            let config = load_config(config.as_ref())?;
            init(&config)?;
            if username.is_empty() {
                bail!("Username must not be empty");
            }
            add_user(&config, &username, &public_key)
        }
        Command::GenerateKeys { config } => {
            let config = load_config(config.as_ref())?;
            init(&config)?;
            generate_keys(&config)
        }
    }
}
