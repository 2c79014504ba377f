//! Decoded output lines
//!
//! `(<timestamp, 6 decimals>): <signal>: <value>` where the value uses the
//! shortest general notation with six significant digits, the way C's `%g`
//! prints it.

use crate::types::{DecodedFrame, Result};
use std::io::Write;

/// Significant digits in rendered signal values
pub const VALUE_PRECISION: usize = 6;

/// Render one decoded signal as an output line (without terminator)
pub fn format_decoded_line(timestamp: f64, signal_name: &str, value: f64) -> String {
    format!(
        "({:.6}): {}: {}",
        timestamp,
        signal_name,
        format_general(value, VALUE_PRECISION)
    )
}

/// Write one line per signal of a decoded frame
pub fn write_decoded<W: Write>(writer: &mut W, frame: &DecodedFrame) -> Result<()> {
    for signal in &frame.signals {
        writeln!(
            writer,
            "{}",
            format_decoded_line(frame.timestamp, &signal.name, signal.value)
        )?;
    }
    Ok(())
}

/// Format like `%.{precision}g`: fixed or exponential notation depending on
/// magnitude, trailing zeros removed.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);

    // The exponent after rounding to `precision` digits picks the notation
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_trailing_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
