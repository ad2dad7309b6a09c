//! oxide-query-inspect CLI
//!
//! Command-line tool for inspecting encoded query metadata documents.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use oxide_query_core::QueryMetadata;
use oxide_query_core::codec;

/// Inspect, verify and normalize encoded query metadata.
#[derive(Parser)]
#[command(name = "oxide-query-inspect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, env = "OXIDE_QUERY_LOG", default_value = "info")]
    log_level: Level,

    /// Enable verbose output (forces debug logging).
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a document and print every clause.
    Show {
        /// Encoded metadata file.
        file: PathBuf,
    },

    /// Check that a document survives a decode/encode cycle unchanged.
    Verify {
        /// Encoded metadata file.
        file: PathBuf,
    },

    /// Decode a document and write its canonical encoding.
    Normalize {
        /// Encoded metadata file.
        file: PathBuf,

        /// Emit indented output.
        #[arg(long)]
        pretty: bool,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        cli.log_level
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Show { file } => {
            let metadata = load(&file)?;
            io::stdout().write_all(describe(&metadata).as_bytes())?;
        }

        Commands::Verify { file } => {
            let metadata = load(&file)?;
            verify(&metadata)
                .with_context(|| format!("{} failed verification", file.display()))?;
            info!("{} round-trips unchanged", file.display());
        }

        Commands::Normalize {
            file,
            pretty,
            output,
        } => {
            let metadata = load(&file)?;
            let bytes = normalize(&metadata, pretty)?;
            match output {
                Some(target) => {
                    fs::write(&target, &bytes)
                        .with_context(|| format!("writing {}", target.display()))?;
                    info!("Wrote {} bytes to {}", bytes.len(), target.display());
                }
                None => io::stdout().write_all(&bytes)?,
            }
        }
    }

    Ok(())
}

fn load(file: &Path) -> anyhow::Result<QueryMetadata> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    debug!(path = %file.display(), len = bytes.len(), "Loaded document");
    let metadata =
        codec::decode(&bytes).with_context(|| format!("decoding {}", file.display()))?;
    Ok(metadata)
}

fn verify(metadata: &QueryMetadata) -> anyhow::Result<()> {
    codec::audit_round_trip(metadata)?;
    for join in metadata.joins() {
        codec::audit_round_trip(join)?;
    }
    codec::audit_round_trip(metadata.params())?;
    Ok(())
}

fn normalize(metadata: &QueryMetadata, pretty: bool) -> anyhow::Result<Vec<u8>> {
    let mut bytes = if pretty {
        codec::encode_pretty(metadata)?
    } else {
        codec::encode(metadata)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

fn describe(metadata: &QueryMetadata) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "distinct: {}", metadata.is_distinct());
    let _ = writeln!(out, "unique: {}", metadata.is_unique());

    section(
        &mut out,
        "flags",
        metadata
            .flags()
            .iter()
            .map(|flag| format!("{:?} {}", flag.position, flag.payload)),
    );
    section(&mut out, "projection", metadata.projection().iter());
    section(&mut out, "joins", metadata.joins().iter());
    if let Some(predicate) = metadata.where_clause() {
        let _ = writeln!(out, "where: {predicate}");
    }
    section(&mut out, "group by", metadata.group_by().iter());
    if let Some(predicate) = metadata.having() {
        let _ = writeln!(out, "having: {predicate}");
    }
    section(&mut out, "order by", metadata.order_by().iter());
    if metadata.modifiers().is_restricting() {
        let _ = writeln!(out, "modifiers: {}", metadata.modifiers());
    }
    section(
        &mut out,
        "params",
        metadata
            .params()
            .iter()
            .map(|(key, value)| format!("{key} = {value}")),
    );
    out
}

fn section<T: std::fmt::Display>(out: &mut String, title: &str, items: impl Iterator<Item = T>) {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return;
    }
    let _ = writeln!(out, "{title}:");
    for item in items {
        let _ = writeln!(out, "  {item}");
    }
}
