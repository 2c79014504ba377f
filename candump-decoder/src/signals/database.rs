//! Message and signal definitions
//!
//! The in-memory form of a DBC network: messages with their ordered signals,
//! the multiplexing role of each signal, and the bit extraction and scaling
//! used to turn a payload into physical values.

use crate::types::PaddedPayload;
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// A complete CAN message definition
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    /// CAN message ID
    pub id: u32,
    /// Message name
    pub name: String,
    /// Message size in bytes
    pub size: usize,
    /// Sender ECU name (optional)
    pub sender: Option<String>,
    /// All signals in declaration order
    pub signals: Vec<SignalDefinition>,
    /// Index into `signals` of the multiplexor switch, if any
    pub switch_signal: Option<usize>,
    /// Source file (DBC filename)
    pub source: String,
}

impl MessageDefinition {
    /// The multiplexor switch signal, if this message has one
    pub fn switch(&self) -> Option<&SignalDefinition> {
        self.switch_signal.and_then(|idx| self.signals.get(idx))
    }

    /// True if any signal is gated by a switch value
    pub fn is_multiplexed(&self) -> bool {
        self.signals
            .iter()
            .any(|s| matches!(s.role, MultiplexRole::ValueSignal(_)))
    }
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Start bit as written in the DBC (LSB for Intel, MSB for Motorola)
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Minimum physical value
    pub min: f64,
    /// Maximum physical value
    pub max: f64,
    /// Engineering unit (e.g., "km/h", "V")
    pub unit: Option<String>,
    /// Multiplexing role
    pub role: MultiplexRole,
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Signed,
    Unsigned,
    /// IEEE 754 single precision (`SIG_VALTYPE_ ... : 1`)
    Float32,
    /// IEEE 754 double precision (`SIG_VALTYPE_ ... : 2`)
    Float64,
}

/// How a signal takes part in multiplexing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplexRole {
    /// Present in every frame
    Unmultiplexed,
    /// The switch that selects the active signal group
    SwitchSignal,
    /// Present only when the switch decodes to this value
    ValueSignal(u64),
}

impl SignalDefinition {
    /// Extract the raw value of this signal from a padded payload.
    ///
    /// Signed signals are sign-extended from `length` bits. Bits that fall
    /// outside the eight-byte buffer read as zero. Float signals return their
    /// bit pattern unchanged; use [`physical_value`](Self::physical_value) to
    /// read them as numbers.
    pub fn decode(&self, payload: &PaddedPayload) -> i64 {
        let raw = self.extract_bits(payload);
        match self.value_type {
            ValueType::Signed => sign_extend(raw, self.length as u32),
            ValueType::Unsigned | ValueType::Float32 | ValueType::Float64 => raw as i64,
        }
    }

    /// The `length` bits of this signal, right-aligned
    fn extract_bits(&self, payload: &PaddedPayload) -> u64 {
        let length = self.length as u32;
        if length == 0 {
            return 0;
        }

        match self.byte_order {
            ByteOrder::LittleEndian => {
                let word = LittleEndian::read_u64(payload.as_bytes());
                word.checked_shr(self.start_bit as u32).unwrap_or(0) & mask(length)
            }
            ByteOrder::BigEndian => {
                let word = BigEndian::read_u64(payload.as_bytes());
                let start = self.start_bit as i64;
                // Motorola start bit names the MSB; map it onto the big-endian word.
                let msb = 8 * (start / 8) + 7 - start % 8;
                // Negative when the signal runs past the last byte; the
                // missing low bits are zero.
                let shift = 64 - (msb + length as i64);
                let aligned = if shift >= 0 {
                    word.checked_shr(shift as u32).unwrap_or(0)
                } else {
                    word.checked_shl((-shift) as u32).unwrap_or(0)
                };
                aligned & mask(length)
            }
        }
    }

    /// Apply factor and offset to a raw integer value
    pub fn raw_to_physical(&self, raw: i64) -> f64 {
        raw as f64 * self.factor + self.offset
    }

    /// Decode and scale in one step
    pub fn physical_value(&self, payload: &PaddedPayload) -> f64 {
        let value = match self.value_type {
            ValueType::Float32 => f32::from_bits(self.extract_bits(payload) as u32) as f64,
            ValueType::Float64 => f64::from_bits(self.extract_bits(payload)),
            ValueType::Signed | ValueType::Unsigned => self.decode(payload) as f64,
        };
        value * self.factor + self.offset
    }
}

fn mask(length: u32) -> u64 {
    if length >= 64 {
        u64::MAX
    } else {
        (1u64 << length) - 1
    }
}

/// Sign-extend a value from N bits to 64 bits
fn sign_extend(value: u64, bit_length: u32) -> i64 {
    if bit_length >= 64 {
        return value as i64;
    }

    let sign_bit = 1u64 << (bit_length - 1);
    if value & sign_bit != 0 {
        (value | (!0u64 << bit_length)) as i64
    } else {
        value as i64
    }
}
