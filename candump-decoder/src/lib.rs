//! candump Trace Decoder Library
//!
//! Decodes recorded CAN traffic in candump text format into physical signal
//! values, using DBC network definitions assigned to each bus interface.
//!
//! # Architecture
//!
//! - Parses trace lines into frames (`formats`)
//! - Routes each DBC file to an interface and indexes its messages per
//!   interface (`config`, `registry`)
//! - Selects the signals active under multiplexing and scales them
//!   (`message_decoder`)
//! - Renders `(<ts>): <signal>: <value>` lines (`output`)
//!
//! The library does NOT:
//! - Capture live traffic
//! - Encode physical values back to raw frames
//! - Decode nested multiplexing or CAN-FD payloads
//!
//! # Example Usage
//!
//! ```no_run
//! use candump_decoder::Decoder;
//! use std::path::Path;
//!
//! let mut decoder = Decoder::new();
//! decoder.add_dbc(Path::new("dbc-files/ControlBus.dbc")).unwrap();
//! decoder.add_dbc(Path::new("dbc-files/SensorBus.dbc")).unwrap();
//!
//! let stats = decoder
//!     .decode_file(Path::new("dump.log"), Path::new("output.txt"))
//!     .unwrap();
//! println!("{} signals written", stats.signals_written);
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod formats;
pub mod message_decoder;
pub mod output;
pub mod registry;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use config::{DecoderConfig, DuplicatePolicy, InterfaceMap, InterfaceRule, DEFAULT_INTERFACE};
pub use decoder::{open_input, open_output, Decoder, DecodingIterator};
pub use formats::parse_frame;
pub use message_decoder::{decode_signals, select_signals};
pub use output::{format_decoded_line, format_general};
pub use registry::{BusRegistry, DatabaseStats, RegisterSummary};
pub use signals::{ByteOrder, MessageDefinition, MultiplexRole, SignalDefinition, ValueType};
pub use types::{
    DecodeStats, DecodedFrame, DecodedSignal, DecoderError, Frame, PaddedPayload, Result,
    Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
