//! Log file format parsers
//!
//! Each parser turns text or binary log input into [`Frame`](crate::types::Frame)s.

pub mod candump;

pub use candump::{parse_frame, CandumpReader, LineOutcome};
