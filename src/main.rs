#![forbid(unsafe_code)]

//! Command-line inspector for settings documents

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use statefile::{StateSerializer, Value};

#[derive(Parser)]
#[command(name = "statefile", about = "Inspect persisted application-state documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a settings document and print its records
    Dump {
        /// Settings file to read (defaults to the platform settings path)
        path: Option<PathBuf>,

        /// Print records as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Print the default settings file location
    Path,
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Command::Dump { path, json } => dump(path, json),
        Command::Path => {
            println!("{}", StateSerializer::default_path().display());
            Ok(())
        }
    }
}

fn dump(path: Option<PathBuf>, json: bool) -> Result<()> {
    let path = path.unwrap_or_else(StateSerializer::default_path);
    let serializer = StateSerializer::new();
    let reader = serializer.open_read(&path)?;
    let records = reader.records()?;
    info!(path = %path.display(), records = records.len(), "decoded settings document");

    if json {
        #[derive(serde::Serialize)]
        struct DumpedRecord<'a> {
            name: &'a str,
            source: &'a str,
            value: &'a Value,
        }
        let dumped: Vec<_> = records
            .iter()
            .map(|r| DumpedRecord {
                name: &r.name,
                source: &r.source,
                value: &r.value,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&dumped)?);
    } else {
        for record in &records {
            println!(
                "{} (source: {}): {:?}",
                record.name, record.source, record.value
            );
        }
    }
    Ok(())
}
