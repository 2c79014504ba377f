//! candump text log parser
//!
//! Parses lines of the form `(1730892639.316946) can1 709#FF7F0080A3BC` as
//! written by `candump -l`. Anything that does not match is not a frame and is
//! skipped without an error.

use crate::types::{Frame, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;

static FRAME_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((\d+\.\d+)\)\s+(\S+)\s+([0-9A-Fa-f]+)#([0-9A-Fa-f]*)")
        .expect("frame grammar is a valid regex")
});

/// Parse one trace line into a frame.
///
/// Returns `None` for lines that do not match the grammar, for odd-length
/// payloads and for IDs that do not fit in 32 bits.
pub fn parse_frame(line: &str) -> Option<Frame> {
    let caps = FRAME_LINE.captures(line)?;

    let timestamp: f64 = caps[1].parse().ok()?;
    let interface = &caps[2];
    let arbitration_id = u32::from_str_radix(&caps[3], 16).ok()?;
    // Odd digit counts fail with OddLength
    let payload = hex::decode(&caps[4]).ok()?;

    Some(Frame::new(timestamp, interface, arbitration_id, payload))
}

/// What one input line turned into
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Frame(Frame),
    Skipped,
}

/// Iterator over the lines of a candump log.
///
/// Lines are read as raw bytes, so text that is not valid UTF-8 is skipped
/// like any other non-frame line instead of ending the read.
pub struct CandumpReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> CandumpReader<R> {
    /// Wrap a buffered reader positioned at the start of a log
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for CandumpReader<R> {
    type Item = Result<LineOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => return Some(Err(e.into())),
        }

        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end_matches(['\n', '\r']);

        Some(Ok(match parse_frame(line) {
            Some(frame) => LineOutcome::Frame(frame),
            None => {
                log::trace!("Skipping non-frame line: {:?}", line);
                LineOutcome::Skipped
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_reference_line() {
        let frame = parse_frame("(1730892639.316946) can1 709#FF7F0080A3BC").unwrap();
        assert_eq!(frame.timestamp(), 1730892639.316946);
        assert_eq!(frame.interface(), "can1");
        assert_eq!(frame.arbitration_id(), 0x709);
        assert_eq!(frame.payload(), &[0xFF, 0x7F, 0x00, 0x80, 0xA3, 0xBC]);
    }

    #[test]
    fn test_payload_length_is_half_hex_length() {
        for hex in ["", "00", "0102", "A1B2C3", "0011223344556677"] {
            let line = format!("(1.000000) can0 123#{}", hex);
            let frame = parse_frame(&line).unwrap();
            assert_eq!(frame.dlc(), hex.len() / 2);
        }
    }

    #[test]
    fn test_empty_payload() {
        let frame = parse_frame("(0.5) vcan0 7DF#").unwrap();
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_odd_payload_rejected() {
        assert!(parse_frame("(1.0) can0 123#ABC").is_none());
        assert!(parse_frame("(1.0) can0 123#0").is_none());
    }

    #[test]
    fn test_lowercase_hex_and_trailing_text() {
        let frame = parse_frame("(12.25) can2 1aBc#deadBEEF R").unwrap();
        assert_eq!(frame.arbitration_id(), 0x1ABC);
        assert_eq!(frame.payload(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_non_frame_lines_rejected() {
        assert!(parse_frame("").is_none());
        assert!(parse_frame("# comment").is_none());
        assert!(parse_frame("(1730892639) can1 709#00").is_none());
        assert!(parse_frame("(1.0) can1 709 00").is_none());
        assert!(parse_frame("can1 709#00").is_none());
    }

    #[test]
    fn test_oversized_id_rejected() {
        assert!(parse_frame("(1.0) can1 1FFFFFFFF#00").is_none());
        assert!(parse_frame("(1.0) can1 FFFFFFFF#00").is_some());
    }

    #[test]
    fn test_reader_yields_frames_and_skips() {
        let input = "header line\n(1.0) can0 100#01\n\n(2.0) can1 200#0203\n";
        let outcomes: Vec<_> = CandumpReader::new(Cursor::new(input))
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0], LineOutcome::Skipped);
        assert!(matches!(&outcomes[1], LineOutcome::Frame(f) if f.arbitration_id() == 0x100));
        assert_eq!(outcomes[2], LineOutcome::Skipped);
        assert!(matches!(&outcomes[3], LineOutcome::Frame(f) if f.payload() == [0x02, 0x03]));
    }

    #[test]
    fn test_reader_skips_invalid_utf8_line() {
        let input: &[u8] = b"(1.0) can0 100#01\ngarbage \xff\xfe line\r\n(2.0) can0 100#02";
        let outcomes: Vec<_> = CandumpReader::new(input)
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(&outcomes[0], LineOutcome::Frame(f) if f.payload() == [0x01]));
        assert_eq!(outcomes[1], LineOutcome::Skipped);
        assert!(matches!(&outcomes[2], LineOutcome::Frame(f) if f.timestamp() == 2.0));
    }
}
