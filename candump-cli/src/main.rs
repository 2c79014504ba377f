//! candump Trace Decoder CLI
//!
//! Command-line front end for the candump-decoder library. Loads DBC files,
//! routes each one to a bus interface, decodes a candump log and writes one
//! `(<ts>): <signal>: <value>` line per decoded signal.

use anyhow::{Context, Result};
use candump_decoder::types::seconds_to_datetime;
use candump_decoder::{
    open_input, open_output, DecodeStats, Decoder, DecoderError, MessageDefinition,
};
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};

mod config;

use config::{AppConfig, SchemaSource};

const DEFAULT_LOG: &str = "dump.log";
const DEFAULT_OUTPUT: &str = "output.txt";
const DEFAULT_DBC_FILES: [&str; 3] = [
    "dbc-files/ControlBus.dbc",
    "dbc-files/SensorBus.dbc",
    "dbc-files/TractiveBus.dbc",
];

/// candump decoder - turn recorded CAN traces into physical signal values
#[derive(Parser, Debug)]
#[command(name = "candump-decode")]
#[command(about = "Decode candump CAN logs with DBC files", long_about = None)]
#[command(version)]
struct Args {
    /// candump log to decode [default: dump.log]
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// DBC file, optionally pinned to an interface as IFACE=FILE (can be repeated)
    #[arg(long, value_name = "[IFACE=]FILE")]
    dbc: Vec<String>,

    /// Output file for decoded signals [default: output.txt]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the message map of every interface and exit
    #[arg(long)]
    list_messages: bool,

    /// Write run statistics as JSON
    #[arg(long, value_name = "FILE")]
    stats: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::debug!("candump-decode v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", candump_decoder::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let schemas = schema_sources(&args, &app_config);

    if args.list_messages {
        let decoder = load_schemas(&app_config, &schemas)?;
        print_bus_maps(&decoder);
        return Ok(());
    }

    let log_path = args
        .log
        .clone()
        .or_else(|| app_config.input.log.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG));
    let output_path = args
        .output
        .clone()
        .or_else(|| app_config.output.path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    // Both streams must open before any work is done
    let reader = open_input(&log_path)?;
    let mut writer = open_output(&output_path)?;

    let decoder = load_schemas(&app_config, &schemas)?;

    log::info!("Decoding {:?} into {:?}", log_path, output_path);
    let stats = decoder
        .decode_to_writer(reader, &mut writer)
        .with_context(|| format!("Failed while decoding {:?}", log_path))?;

    report(&stats);

    if let Some(stats_path) = args.stats.as_ref().or(app_config.output.stats.as_ref()) {
        write_stats(stats_path, &stats)?;
    }

    Ok(())
}

/// Command-line DBC files replace the configured ones; with neither, the
/// default vehicle buses are used
fn schema_sources(args: &Args, app_config: &AppConfig) -> Vec<SchemaSource> {
    if !args.dbc.is_empty() {
        return args.dbc.iter().map(|arg| SchemaSource::from_arg(arg)).collect();
    }

    let configured = app_config.schema_sources();
    if !configured.is_empty() {
        return configured;
    }

    DEFAULT_DBC_FILES
        .iter()
        .map(|path| SchemaSource::from_arg(path))
        .collect()
}

/// Build the decoder; a schema that fails to load is reported and skipped
fn load_schemas(app_config: &AppConfig, schemas: &[SchemaSource]) -> Result<Decoder> {
    let interfaces = app_config.interfaces.clone().unwrap_or_default();
    let mut decoder = Decoder::with_interfaces(interfaces)
        .with_duplicate_policy(app_config.registry.duplicates)
        .with_config(app_config.filtering.to_decoder_config());

    let mut loaded = 0;
    for schema in schemas {
        let result = match &schema.interface {
            Some(interface) => decoder.add_dbc_on(&schema.path, interface),
            None => decoder.add_dbc(&schema.path),
        };
        match result {
            Ok(_) => loaded += 1,
            Err(e) => log::error!("Skipping DBC {:?}: {}", schema.path, e),
        }
    }

    if loaded == 0 {
        return Err(DecoderError::NoSchemasLoaded.into());
    }

    let stats = decoder.database_stats();
    log::info!(
        "Loaded {} of {} DBC files: {} messages, {} signals on {} interfaces",
        loaded,
        schemas.len(),
        stats.num_messages,
        stats.num_signals,
        stats.num_interfaces
    );

    Ok(decoder)
}

fn print_bus_maps(decoder: &Decoder) {
    let registry = decoder.registry();
    println!("Duplicate IDs: keep {:?}", registry.policy());
    for interface in registry.interfaces() {
        println!("{} bus map:", interface);
        for message in registry.messages(interface) {
            println!("{}", bus_map_line(message));
        }
    }
}

fn bus_map_line(message: &MessageDefinition) -> String {
    let mux = if message.is_multiplexed() { " [multiplexed]" } else { "" };
    format!("  0x{:x} -> {} ({}){}", message.id, message.name, message.source, mux)
}

fn report(stats: &DecodeStats) {
    log::info!(
        "Read {} lines: {} frames, {} decoded, {} without definition, {} signals written",
        stats.lines_read,
        stats.frames_parsed,
        stats.frames_decoded,
        stats.frames_unmatched,
        stats.signals_written
    );

    let first = stats.first_timestamp.and_then(seconds_to_datetime);
    let last = stats.last_timestamp.and_then(seconds_to_datetime);
    if let (Some(first), Some(last)) = (first, last) {
        log::info!(
            "Trace spans {} to {} ({:.3} s)",
            first.format("%Y-%m-%d %H:%M:%S%.6f"),
            last.format("%Y-%m-%d %H:%M:%S%.6f"),
            (last - first).num_microseconds().unwrap_or(0) as f64 / 1e6
        );
    }
}

fn write_stats(path: &Path, stats: &DecodeStats) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create stats file: {:?}", path))?;
    serde_json::to_writer_pretty(file, stats)
        .with_context(|| format!("Failed to write stats file: {:?}", path))?;
    log::info!("Statistics written to {:?}", path);
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
