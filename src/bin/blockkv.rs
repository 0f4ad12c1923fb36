//! BlockKV CLI
//!
//! Runs a single command against a store directory.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use blockkv::{Config, KeyValueStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// BlockKV CLI
#[derive(Parser, Debug)]
#[command(name = "blockkv")]
#[command(about = "File-backed block key-value store")]
#[command(version)]
struct Args {
    /// Store directory (created if missing)
    #[arg(short, long, default_value = "./blockkv_data")]
    data_dir: PathBuf,

    /// Data file capacity in bytes
    #[arg(short, long, default_value = "1048576")]
    max_file_size: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert or replace a value
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Print a value to stdout
    Get {
        /// The key to get
        key: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Check whether a key exists
    Has {
        /// The key to check
        key: String,
    },

    /// Print key and free-list statistics
    Stat,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blockkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> blockkv::Result<()> {
    fs::create_dir_all(&args.data_dir)?;

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .max_file_size(args.max_file_size)
        .build();
    let mut store = KeyValueStore::open(config)?;

    let outcome = execute(&mut store, args.command);
    store.close()?;
    outcome
}

fn execute(store: &mut KeyValueStore, command: Commands) -> blockkv::Result<()> {
    match command {
        Commands::Put { key, value } => {
            store.upsert(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Get { key } => {
            let mut stream = store.open_value_stream(key.as_bytes())?;
            let mut stdout = io::stdout().lock();
            io::copy(&mut stream, &mut stdout)?;
            writeln!(stdout)?;
        }
        Commands::Del { key } => {
            let removed = store.remove(key.as_bytes())?;
            println!("{}", if removed { "1" } else { "0" });
        }
        Commands::Has { key } => {
            println!("{}", store.contains(key.as_bytes())?);
        }
        Commands::Stat => {
            let free = store.free_blocks()?;
            let free_bytes: u64 = free.iter().map(|b| b.size).sum();
            println!("keys: {}", store.len()?);
            println!("free blocks: {}", free.len());
            println!("free bytes: {}", free_bytes);
        }
    }
    Ok(())
}
