//! DBC file parser
//!
//! Parses Vector DBC files and converts them into our internal message
//! definitions.

use crate::signals::database::{
    ByteOrder, MessageDefinition, MultiplexRole, SignalDefinition, ValueType,
};
use crate::types::{DecoderError, Result};
use std::path::Path;

/// DBC files flag extended (29-bit) IDs with bit 31
const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path).map_err(|e| {
        DecoderError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    let messages = parse_dbc_bytes(&bytes, source_filename)?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);

    Ok(messages)
}

/// Parse DBC content already in memory
pub fn parse_dbc_bytes(bytes: &[u8], source: &str) -> Result<Vec<MessageDefinition>> {
    // DBC files in the wild are often Windows-1252; fall back to Latin-1
    let dbc_content = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            log::warn!("DBC file {} is not UTF-8, trying Latin-1 encoding", source);
            bytes.iter().map(|&b| b as char).collect()
        }
    };

    let dbc = can_dbc::DBC::from_slice(dbc_content.as_bytes()).map_err(|e| {
        DecoderError::DbcParseError(format!("Failed to parse DBC file {}: {:?}", source, e))
    })?;

    dbc.messages()
        .iter()
        .map(|dbc_msg| convert_message(&dbc, dbc_msg, source))
        .collect()
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    source: &str,
) -> Result<MessageDefinition> {
    let switch_signal = dbc_msg.signals().iter().position(|s| {
        matches!(s.multiplexer_indicator(), can_dbc::MultiplexIndicator::Multiplexor)
    });

    let signals = dbc_msg
        .signals()
        .iter()
        .map(|dbc_sig| {
            let extended =
                dbc.extended_value_type_for_signal(*dbc_msg.message_id(), dbc_sig.name());
            convert_signal(dbc_sig, extended, switch_signal.is_some())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MessageDefinition {
        id: dbc_msg.message_id().0 & EXTENDED_ID_MASK,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signals,
        switch_signal,
        source: source.to_string(),
    })
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    extended: Option<&can_dbc::SignalExtendedValueType>,
    has_switch: bool,
) -> Result<SignalDefinition> {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    // SIG_VALTYPE_ overrides the +/- sign marker
    let value_type = match (extended, *dbc_sig.value_type()) {
        (Some(can_dbc::SignalExtendedValueType::IEEEfloat32Bit), _) => ValueType::Float32,
        (Some(can_dbc::SignalExtendedValueType::IEEEdouble64bit), _) => ValueType::Float64,
        (_, can_dbc::ValueType::Signed) => ValueType::Signed,
        (_, can_dbc::ValueType::Unsigned) => ValueType::Unsigned,
    };

    let float_width = match value_type {
        ValueType::Float32 => Some(32),
        ValueType::Float64 => Some(64),
        _ => None,
    };
    if let Some(width) = float_width {
        if *dbc_sig.signal_size() != width {
            log::warn!(
                "Float signal '{}' is {} bits wide, expected {}",
                dbc_sig.name(),
                dbc_sig.signal_size(),
                width
            );
        }
    }

    // m<N>M (extended multiplexing) is gated by the top-level switch only
    let role = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::Plain => MultiplexRole::Unmultiplexed,
        can_dbc::MultiplexIndicator::Multiplexor => MultiplexRole::SwitchSignal,
        can_dbc::MultiplexIndicator::MultiplexedSignal(code)
        | can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(code) => {
            if !has_switch {
                log::warn!(
                    "Multiplexed signal '{}' has no multiplexor in its message",
                    dbc_sig.name()
                );
            }
            MultiplexRole::ValueSignal(code)
        }
    };

    let start_bit = u16::try_from(*dbc_sig.start_bit()).map_err(|_| {
        DecoderError::InvalidSignalDefinition(format!(
            "Signal '{}' start bit {} out of range",
            dbc_sig.name(),
            dbc_sig.start_bit()
        ))
    })?;
    let length = u16::try_from(*dbc_sig.signal_size()).map_err(|_| {
        DecoderError::InvalidSignalDefinition(format!(
            "Signal '{}' size {} out of range",
            dbc_sig.name(),
            dbc_sig.signal_size()
        ))
    })?;

    Ok(SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit,
        length,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        min: *dbc_sig.min(),
        max: *dbc_sig.max(),
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
        role,
    })
}
