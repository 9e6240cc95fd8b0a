mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foni_core::config::DEFAULT_CONFIG_FILE;
use foni_core::{FoniConfig, OffsetField, RosterKind};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use commands::hex_utils::parse_hex_address;

#[derive(Parser)]
#[command(name = "foni")]
#[command(about = "Rename drivers in a running F1 2021 session")]
#[command(version)]
struct Args {
    /// Rename instruction file. Default names are restored when omitted.
    names_file: Option<PathBuf>,

    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "FONI_CONFIG")]
    config: PathBuf,

    /// Offset cache file (overrides the config)
    #[arg(short, long)]
    offsets: Option<PathBuf>,

    /// Target executable name (overrides the config)
    #[arg(short, long)]
    process: Option<String>,

    /// Driver roster: full, reduced or custom (overrides the config)
    #[arg(long)]
    roster: Option<RosterKind>,

    /// Ignore the offset cache and scan again
    #[arg(long)]
    rescan: bool,

    /// Log per-field detail
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan for all driver strings and rewrite the offset cache
    Scan,
    /// Print the cached offsets and check them against the running process
    Show {
        /// Also write the offsets and current strings as JSON
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Dump memory at a driver's string or at a raw address
    Hexdump {
        /// Roster name of the driver
        #[arg(requires = "field", conflicts_with = "address")]
        entity: Option<String>,

        /// Field name, e.g. combined_a or secondary_last
        field: Option<OffsetField>,

        /// Raw address in hex (with or without 0x prefix)
        #[arg(long, value_parser = parse_hex_address)]
        address: Option<u64>,

        /// Number of bytes to dump
        #[arg(short, long, default_value = "64")]
        size: usize,

        /// Hide the ASCII column
        #[arg(long)]
        no_ascii: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("foni={level},foni_core={level}")))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&args)?;

    match args.command {
        None => commands::rename::run(config, args.names_file.as_deref(), args.rescan),
        Some(Command::Scan) => commands::scan::run(config),
        Some(Command::Show { dump }) => commands::show::run(config, dump.as_deref()),
        Some(Command::Hexdump {
            entity,
            field,
            address,
            size,
            no_ascii,
        }) => {
            let target = match (address, entity, field) {
                (Some(address), _, _) => commands::hexdump::Target::Address(address),
                (None, Some(entity), Some(field)) => {
                    commands::hexdump::Target::Field(entity, field)
                }
                _ => anyhow::bail!("Give either <ENTITY> <FIELD> or --address"),
            };
            commands::hexdump::run(config, target, size, !no_ascii)
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(args: &Args) -> Result<FoniConfig> {
    let base = match FoniConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) if e.is_not_found() => {
            debug!("No config at {}, using defaults", args.config.display());
            FoniConfig::default()
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            FoniConfig::default()
        }
    };

    let mut builder = FoniConfig::builder().base(base);
    if let Some(path) = &args.offsets {
        builder = builder.cache_path(path);
    }
    if let Some(name) = &args.process {
        builder = builder.process_name(name);
    }
    if let Some(kind) = args.roster {
        builder = builder.roster(kind);
    }
    builder.build().context("Invalid configuration")
}
