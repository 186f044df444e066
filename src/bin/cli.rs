//! FlatKV CLI
//!
//! Command-line interface for inspecting and editing a store file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use flatkv::{Config, FlatError, JsonFormatter, Store, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// FlatKV CLI
#[derive(Parser, Debug)]
#[command(name = "flatkv-cli")]
#[command(about = "CLI for FlatKV flat-file key-value stores")]
#[command(version)]
struct Args {
    /// Directory holding the store files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Store file extension
    #[arg(short, long, default_value = ".dat")]
    ext: String,

    /// Gzip-compress the store file
    #[arg(long)]
    gzip: bool,

    /// Encode values as JSON instead of the default serialization
    #[arg(long)]
    json: bool,

    /// Rewrite through a temp file above this many bytes (0 = always)
    #[arg(long, default_value_t = flatkv::config::DEFAULT_SWAP_MEMORY_LIMIT)]
    swap_limit: u64,

    /// Store name
    store: String,

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

        /// Parse the value as JSON (numbers, arrays, objects)
        #[arg(long)]
        json_value: bool,
    },

    /// Delete a key
    #[command(alias = "del")]
    Delete {
        /// The key to delete
        key: String,
    },

    /// List all keys
    Keys,

    /// Print every record as a JSON object
    All,

    /// Remove every record
    Flush,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> flatkv::Result<ExitCode> {
    let mut builder = Config::builder()
        .directory(&args.dir)
        .extension(args.ext.as_str())
        .compression(args.gzip)
        .cache(false)
        .swap_memory_limit(args.swap_limit);
    if args.json {
        builder = builder.formatter(Arc::new(JsonFormatter));
    }
    let config = builder.build()?;
    let store = Store::open(&args.store, &config)?;

    match args.command {
        Commands::Get { key } => match store.get(&key)? {
            Some(value) => {
                tracing::debug!(key = %key, kind = value.type_name(), "found value");
                // Strings print raw so they can be piped
                match value.as_str() {
                    Some(text) => println!("{}", text),
                    None => print_json(&value)?,
                }
            }
            None => {
                eprintln!("(not found)");
                return Ok(ExitCode::from(1));
            }
        },
        Commands::Set {
            key,
            value,
            json_value,
        } => {
            let value = if json_value {
                serde_json::from_str::<Value>(&value)
                    .map_err(|e| FlatError::InvalidValue(e.to_string()))?
            } else {
                Value::Str(value)
            };
            store.set(&key, value)?;
        }
        Commands::Delete { key } => {
            if !store.delete(&key)? {
                eprintln!("(not found)");
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Keys => {
            for key in store.keys()? {
                println!("{}", key);
            }
        }
        Commands::All => print_json(&store.get_all()?)?,
        Commands::Flush => store.flush()?,
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json<T: serde::Serialize>(value: &T) -> flatkv::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| FlatError::InvalidValue(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
