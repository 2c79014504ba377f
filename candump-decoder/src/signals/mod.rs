//! Signal definitions and the DBC parser

pub mod database;
pub mod dbc;

// Re-export key types for convenience
pub use database::{ByteOrder, MessageDefinition, MultiplexRole, SignalDefinition, ValueType};
