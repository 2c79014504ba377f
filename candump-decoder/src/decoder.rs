//! Main decoder API
//!
//! The [`Decoder`] owns the bus registry built from DBC files and drives the
//! per-line pipeline: parse, look up, select multiplexed signals, decode and
//! write.

use crate::config::{DecoderConfig, DuplicatePolicy, InterfaceMap};
use crate::formats::{CandumpReader, LineOutcome};
use crate::message_decoder::decode_signals;
use crate::output::write_decoded;
use crate::registry::{BusRegistry, DatabaseStats, RegisterSummary};
use crate::signals::MessageDefinition;
use crate::types::{DecodeStats, DecodedFrame, DecoderError, Frame, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    registry: BusRegistry,
    interfaces: InterfaceMap,
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with the built-in interface table
    pub fn new() -> Self {
        Self::with_interfaces(InterfaceMap::default())
    }

    /// Create a decoder with a custom interface table
    pub fn with_interfaces(interfaces: InterfaceMap) -> Self {
        Self {
            registry: BusRegistry::new(),
            interfaces,
            config: DecoderConfig::default(),
        }
    }

    /// Builder method: set how duplicate IDs on one interface are resolved.
    ///
    /// Call before loading any schema; it starts a fresh registry.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.registry = BusRegistry::with_policy(policy);
        self
    }

    /// Builder method: set frame filters
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Interface a schema source resolves to
    pub fn resolve_interface(&self, source: &str) -> &str {
        self.interfaces.resolve(source)
    }

    /// Load a DBC file onto the interface its path resolves to
    ///
    /// # Example
    /// ```no_run
    /// use candump_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_dbc(Path::new("dbc-files/SensorBus.dbc")).unwrap();
    /// ```
    pub fn add_dbc(&mut self, path: &Path) -> Result<RegisterSummary> {
        let interface = self.interfaces.resolve(&path.to_string_lossy()).to_string();
        self.add_dbc_on(path, &interface)
    }

    /// Load a DBC file onto an explicit interface
    pub fn add_dbc_on(&mut self, path: &Path, interface: &str) -> Result<RegisterSummary> {
        log::info!("Loading DBC file {:?} on {}", path, interface);

        let messages = crate::signals::dbc::parse_dbc_file(path)?;
        let summary = self.add_messages(interface, messages);

        log::info!(
            "DBC file loaded: {:?} ({} messages, {} duplicates)",
            path,
            summary.added,
            summary.duplicates
        );
        Ok(summary)
    }

    /// Register already-parsed message definitions on an interface
    pub fn add_messages<I>(&mut self, interface: &str, messages: I) -> RegisterSummary
    where
        I: IntoIterator<Item = MessageDefinition>,
    {
        self.registry.register(interface, messages)
    }

    /// The bus registry
    pub fn registry(&self) -> &BusRegistry {
        &self.registry
    }

    /// Get statistics about the loaded definitions
    pub fn database_stats(&self) -> DatabaseStats {
        self.registry.stats()
    }

    /// Decode one frame, or `None` if it has no definition or is filtered out
    pub fn decode_frame(&self, frame: &Frame) -> Option<DecodedFrame> {
        if !self
            .config
            .should_process_frame(frame.interface(), frame.arbitration_id())
        {
            return None;
        }

        let message = self
            .registry
            .lookup(frame.interface(), frame.arbitration_id())?;

        log::trace!(
            "Decoding {} on {} (ID 0x{:X})",
            message.name,
            frame.interface(),
            frame.arbitration_id()
        );

        Some(DecodedFrame {
            timestamp: frame.timestamp(),
            interface: frame.interface().to_string(),
            arbitration_id: frame.arbitration_id(),
            message_name: message.name.clone(),
            signals: decode_signals(message, &frame.padded_payload()),
        })
    }

    /// Lazily decode a candump log, yielding one item per decoded frame.
    ///
    /// Non-frame lines and frames without a definition are skipped. Read
    /// errors are yielded as `Err` items.
    pub fn decode_reader<R: BufRead>(&self, reader: R) -> DecodingIterator<'_, R> {
        DecodingIterator::new(CandumpReader::new(reader), self)
    }

    /// Decode a whole log into the output grammar
    pub fn decode_to_writer<R: BufRead, W: Write>(&self, reader: R, writer: &mut W) -> Result<DecodeStats> {
        let mut stats = DecodeStats::default();

        for outcome in CandumpReader::new(reader) {
            stats.lines_read += 1;
            let frame = match outcome? {
                LineOutcome::Frame(frame) => frame,
                LineOutcome::Skipped => {
                    stats.lines_skipped += 1;
                    continue;
                }
            };
            stats.frames_parsed += 1;

            match self.decode_frame(&frame) {
                Some(decoded) => {
                    write_decoded(writer, &decoded)?;
                    stats.record_decoded(&decoded);
                }
                None => stats.frames_unmatched += 1,
            }
        }

        writer.flush()?;
        Ok(stats)
    }

    /// Decode a log file into an output file
    pub fn decode_file(&self, input: &Path, output: &Path) -> Result<DecodeStats> {
        let reader = open_input(input)?;
        let mut writer = open_output(output)?;
        log::info!("Decoding {:?} into {:?}", input, output);
        self.decode_to_writer(reader, &mut writer)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a log for reading
pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DecoderError::StreamOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// Create (or truncate) an output file
pub fn open_output(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| DecoderError::StreamOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// Iterator that decodes candump lines into decoded frames
pub struct DecodingIterator<'a, R> {
    lines: CandumpReader<R>,
    decoder: &'a Decoder,
}

impl<'a, R: BufRead> DecodingIterator<'a, R> {
    fn new(lines: CandumpReader<R>, decoder: &'a Decoder) -> Self {
        Self { lines, decoder }
    }
}

impl<'a, R: BufRead> Iterator for DecodingIterator<'a, R> {
    type Item = Result<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(LineOutcome::Frame(frame)) => {
                    if let Some(decoded) = self.decoder.decode_frame(&frame) {
                        return Some(Ok(decoded));
                    }
                }
                Ok(LineOutcome::Skipped) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
