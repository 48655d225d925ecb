use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clientconf::settings::{default_settings_path, ResolvedSettings, StorageKind};
use clientconf::{
    ConfigManager, JsonFileStorage, MemoryStorage, NoClientCache, Operation, Storage,
    UpsertRequest,
};
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "clientconf")]
#[command(about = "Manage cloud API client credentials")]
struct Cli {
    /// Path to settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the stored client config as JSON
    Read,
    /// Create the client config or update the given fields
    Write {
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        secret_key: Option<String>,
        /// Endpoint override; pass an empty string to use the default
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Remove the client config
    Delete,
    /// Report whether a client config exists
    Exists,
    /// Show resolved settings
    Settings,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings_path = cli.settings.unwrap_or_else(default_settings_path);
    let settings = ResolvedSettings::load_or_default(&settings_path)?;

    init_tracing(&settings.log_filter);

    let storage: Box<dyn Storage> = match settings.storage {
        StorageKind::File => Box::new(JsonFileStorage::new(&settings.data_dir)),
        StorageKind::Memory => Box::new(MemoryStorage::new()),
    };
    // Nothing is cached across a one-shot invocation.
    let manager = ConfigManager::new(storage, NoClientCache);

    match cli.command {
        Command::Read => {
            let output = match manager.read()?.to_map() {
                Some(map) => json!(map),
                None => json!(null),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Write {
            access_key,
            secret_key,
            endpoint,
        } => {
            let operation = if manager.exists()? {
                Operation::Update
            } else {
                Operation::Create
            };
            let request = UpsertRequest {
                access_key,
                secret_key,
                endpoint,
                operation,
            };
            let outcome = manager.upsert(&request)?;
            let changed: Vec<&str> = outcome.changed.iter().map(|f| f.name()).collect();
            let output = json!({
                "created": outcome.created,
                "changed": changed,
                "invalidated_clients": outcome.invalidated_clients(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Delete => {
            manager.delete()?;
        }
        Command::Exists => {
            println!("{}", manager.exists()?);
        }
        Command::Settings => {
            println!("Settings file: {}", settings_path.display());
            println!("Data directory: {}", settings.data_dir.display());
            println!(
                "Storage: {}",
                match settings.storage {
                    StorageKind::File => "file",
                    StorageKind::Memory => "memory",
                }
            );
            println!("Log filter: {}", settings.log_filter);
        }
    }

    Ok(())
}
