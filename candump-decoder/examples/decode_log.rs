//! Browse a candump log message by message
//!
//! Unlike the `candump-decode` binary, which writes one line per signal, this
//! tool prints each decoded frame with its message name and counts how often
//! each message appears.
//!
//! Usage:
//!   cargo run --example decode_log -- <dump.log> --dbc <file.dbc> [--dbc <file.dbc>] [--limit <count>]

use candump_decoder::{Decoder, DecodedFrame};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

#[derive(Default)]
struct FrameStats {
    decoded_frames: usize,
    signals_decoded: usize,
    unique_messages: HashMap<String, usize>,
}

impl FrameStats {
    fn record(&mut self, frame: &DecodedFrame) {
        self.decoded_frames += 1;
        self.signals_decoded += frame.signals.len();
        *self
            .unique_messages
            .entry(format!("{}/{}", frame.interface, frame.message_name))
            .or_insert(0) += 1;
    }

    fn print_summary(&self) {
        println!("\n=== DECODING SUMMARY ===");
        println!("Decoded frames: {}", self.decoded_frames);
        println!("Total signals decoded: {}", self.signals_decoded);
        println!("Unique messages: {}", self.unique_messages.len());

        if !self.unique_messages.is_empty() {
            println!("\nTop 10 Most Frequent Messages:");
            let mut sorted: Vec<_> = self.unique_messages.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1));
            for (name, count) in sorted.iter().take(10) {
                println!("  {}: {} times", name, count);
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <dump.log> --dbc <file.dbc> [--limit <count>]", args[0]);
        std::process::exit(1);
    }

    let log_file = PathBuf::from(&args[1]);
    let mut dbc_files = Vec::new();
    let mut limit: Option<usize> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--dbc" => {
                i += 1;
                if i < args.len() {
                    dbc_files.push(PathBuf::from(&args[i]));
                }
            }
            "--limit" => {
                i += 1;
                if i < args.len() {
                    limit = Some(args[i].parse()?);
                }
            }
            other => eprintln!("Unknown argument: {}", other),
        }
        i += 1;
    }

    let mut decoder = Decoder::new();
    for dbc_file in &dbc_files {
        println!("Loading DBC: {:?} -> {}", dbc_file, decoder.resolve_interface(&dbc_file.to_string_lossy()));
        decoder.add_dbc(dbc_file)?;
    }

    let db_stats = decoder.database_stats();
    println!("\n=== BUS REGISTRY ===");
    println!("Interfaces: {}", db_stats.num_interfaces);
    println!("Messages: {}", db_stats.num_messages);
    println!("Signals: {}\n", db_stats.num_signals);

    let reader = candump_decoder::open_input(&log_file)?;
    let mut stats = FrameStats::default();

    for result in decoder.decode_reader(reader) {
        let frame = result?;
        stats.record(&frame);

        if limit.map_or(true, |max| stats.decoded_frames <= max) {
            println!(
                "[{:.6}s] {} 0x{:03X} {}",
                frame.timestamp, frame.interface, frame.arbitration_id, frame.message_name
            );
            for signal in &frame.signals {
                println!("    {}: {}", signal.name, candump_decoder::format_general(signal.value, 6));
            }
        }
    }

    stats.print_summary();

    Ok(())
}
