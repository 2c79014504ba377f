//! Core types for the candump decoder library
//!
//! This module defines the values that flow through the decoding pipeline: the
//! parsed [`Frame`], its fixed-size [`PaddedPayload`], and the decoded output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Timestamp type used when a trace time is shown as a calendar date
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Number of data bytes in a classic CAN frame
pub const CAN_MAX_DLEN: usize = 8;

/// One CAN frame as recorded in a candump trace line.
///
/// Frames are created by the line parser and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    timestamp: f64,
    interface: String,
    arbitration_id: u32,
    payload: Vec<u8>,
}

impl Frame {
    /// Create a frame from its parsed fields
    pub fn new(timestamp: f64, interface: impl Into<String>, arbitration_id: u32, payload: Vec<u8>) -> Self {
        Self {
            timestamp,
            interface: interface.into(),
            arbitration_id,
            payload,
        }
    }

    /// Capture time in seconds, as written in the trace
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Interface token (e.g. "can1")
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Arbitration ID
    pub fn arbitration_id(&self) -> u32 {
        self.arbitration_id
    }

    /// Data bytes in wire order
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.payload.len()
    }

    /// Payload zero-padded (or truncated) to exactly eight bytes
    pub fn padded_payload(&self) -> PaddedPayload {
        PaddedPayload::from_bytes(&self.payload)
    }

    /// Capture time as a UTC date, if the timestamp is an epoch time
    pub fn datetime(&self) -> Option<Timestamp> {
        seconds_to_datetime(self.timestamp)
    }
}

/// Convert fractional epoch seconds to a UTC timestamp
pub fn seconds_to_datetime(seconds: f64) -> Option<Timestamp> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let secs = seconds.trunc() as i64;
    let nsecs = ((seconds.fract() * 1_000_000_000.0).round() as u32).min(999_999_999);
    DateTime::from_timestamp(secs, nsecs)
}

/// Fixed 8-byte data buffer handed to signal extraction.
///
/// The source bytes form the prefix and the remainder is zero. Sources longer
/// than eight bytes keep only their first eight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaddedPayload([u8; CAN_MAX_DLEN]);

impl PaddedPayload {
    /// Pad (or truncate) `data` to eight bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut bytes = [0u8; CAN_MAX_DLEN];
        let n = data.len().min(CAN_MAX_DLEN);
        bytes[..n].copy_from_slice(&data[..n]);
        Self(bytes)
    }

    /// The eight bytes
    pub fn as_bytes(&self) -> &[u8; CAN_MAX_DLEN] {
        &self.0
    }
}

impl From<&[u8]> for PaddedPayload {
    fn from(data: &[u8]) -> Self {
        Self::from_bytes(data)
    }
}

/// A decoded signal with its physical value
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the DBC
    pub name: String,
    /// Physical value (raw * factor + offset)
    pub value: f64,
}

/// All signals decoded from one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Capture time in seconds
    pub timestamp: f64,
    /// Interface the frame was recorded on
    pub interface: String,
    /// Arbitration ID
    pub arbitration_id: u32,
    /// Message name from the DBC
    pub message_name: String,
    /// Active signals in declaration order
    pub signals: Vec<DecodedSignal>,
}

/// Counters collected over one decoding run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Lines read from the input
    pub lines_read: usize,
    /// Lines that matched the frame grammar
    pub frames_parsed: usize,
    /// Lines skipped because they were not frames
    pub lines_skipped: usize,
    /// Frames with no message definition (or filtered out)
    pub frames_unmatched: usize,
    /// Frames looked up and decoded
    pub frames_decoded: usize,
    /// Output lines written
    pub signals_written: usize,
    /// Timestamp of the first decoded frame
    pub first_timestamp: Option<f64>,
    /// Timestamp of the last decoded frame
    pub last_timestamp: Option<f64>,
}

impl DecodeStats {
    pub(crate) fn record_decoded(&mut self, frame: &DecodedFrame) {
        self.frames_decoded += 1;
        self.signals_written += frame.signals.len();
        if self.first_timestamp.is_none() {
            self.first_timestamp = Some(frame.timestamp);
        }
        self.last_timestamp = Some(frame.timestamp);
    }
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to open {path:?}: {source}")]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),

    #[error("No schema source could be loaded")]
    NoSchemasLoaded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
