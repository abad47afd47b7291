//! StashKV CLI
//!
//! Runs a single operation against a store.

use clap::{Parser, Subcommand};
use stashkv::{Client, StashError};
use tracing_subscriber::{fmt, EnvFilter};

/// StashKV CLI
#[derive(Parser, Debug)]
#[command(name = "stashkv-cli")]
#[command(about = "CLI for the StashKV embedded key-value store")]
#[command(version)]
struct Args {
    /// Storage directory (defaults to /tmp/stashkv)
    #[arg(short, long, default_value = "")]
    location: String,

    /// Use a transient in-memory store
    #[arg(long)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Set a key-value pair that expires
    SetTtl {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Seconds until the entry expires
        ttl: i64,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all entries under a prefix
    Scan {
        /// Key prefix (empty lists everything)
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Remove expired entries from storage
    Purge,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,stashkv=info,redb=error"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let client = match Client::connect(&args.location, args.in_memory) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&client, args.command) {
        match e {
            StashError::NotFound(key) => {
                eprintln!("(not found) {}", key);
                std::process::exit(2);
            }
            e => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run(client: &Client, command: Commands) -> stashkv::Result<()> {
    match command {
        Commands::Get { key } => println!("{}", client.get(&key)?),
        Commands::Set { key, value } => {
            client.set(&key, &value)?;
            println!("OK");
        }
        Commands::SetTtl { key, value, ttl } => {
            client.set_with_ttl(&key, &value, ttl)?;
            println!("OK");
        }
        Commands::Del { key } => {
            client.delete(&key)?;
            println!("OK");
        }
        Commands::Scan { prefix } => {
            for (key, value) in client.view_prefix(&prefix)? {
                println!("{}\t{}", key, value);
            }
        }
        Commands::Purge => {
            let purged = client.store().purge_expired()?;
            println!("purged {}", purged);
        }
    }
    Ok(())
}
