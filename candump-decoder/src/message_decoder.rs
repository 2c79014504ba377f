//! Message Decoding Engine
//!
//! Decides which signals of a message are present in a given payload and
//! turns them into physical values. Supports one level of multiplexing: a
//! single switch signal selecting among value-tagged signal groups.

use crate::signals::{MessageDefinition, MultiplexRole, SignalDefinition};
use crate::types::{DecodedSignal, PaddedPayload};

/// Signals active for this payload, in declaration order.
///
/// Unmultiplexed signals and the switch itself are always active. A signal
/// tagged with switch value `code` is active only when the message has a
/// switch and the switch decodes to exactly `code`.
pub fn select_signals<'a>(
    message: &'a MessageDefinition,
    payload: &PaddedPayload,
) -> Vec<&'a SignalDefinition> {
    let switch_value = message
        .switch()
        .and_then(|switch| u64::try_from(switch.decode(payload)).ok());

    message
        .signals
        .iter()
        .filter(|signal| match signal.role {
            MultiplexRole::Unmultiplexed | MultiplexRole::SwitchSignal => true,
            MultiplexRole::ValueSignal(code) => switch_value == Some(code),
        })
        .collect()
}

/// Decode every active signal of `message` from `payload`
pub fn decode_signals(message: &MessageDefinition, payload: &PaddedPayload) -> Vec<DecodedSignal> {
    select_signals(message, payload)
        .into_iter()
        .map(|signal| DecodedSignal {
            name: signal.name.clone(),
            value: signal.physical_value(payload),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::database::tests::signal;

    fn muxed_message(with_switch: bool) -> MessageDefinition {
        let mut signals = vec![
            signal("Counter", 16, 8, MultiplexRole::Unmultiplexed),
            signal("Page0", 8, 8, MultiplexRole::ValueSignal(0)),
            signal("Page1", 8, 8, MultiplexRole::ValueSignal(1)),
            signal("Page1b", 24, 8, MultiplexRole::ValueSignal(1)),
        ];
        let switch_signal = if with_switch {
            signals.insert(1, signal("Page", 0, 8, MultiplexRole::SwitchSignal));
            Some(1)
        } else {
            None
        };
        MessageDefinition {
            id: 0x400,
            name: "Paged".to_string(),
            size: 8,
            sender: None,
            signals,
            switch_signal,
            source: "test.dbc".to_string(),
        }
    }

    fn names(signals: &[&SignalDefinition]) -> Vec<String> {
        signals.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_select_by_switch_value() {
        let msg = muxed_message(true);

        let page0 = PaddedPayload::from_bytes(&[0, 0xAA, 0x05]);
        assert_eq!(names(&select_signals(&msg, &page0)), ["Counter", "Page", "Page0"]);

        let page1 = PaddedPayload::from_bytes(&[1, 0xAA, 0x05, 0x10]);
        assert_eq!(
            names(&select_signals(&msg, &page1)),
            ["Counter", "Page", "Page1", "Page1b"]
        );
    }

    #[test]
    fn test_unknown_switch_value_selects_no_group() {
        let msg = muxed_message(true);
        let payload = PaddedPayload::from_bytes(&[7]);
        assert_eq!(names(&select_signals(&msg, &payload)), ["Counter", "Page"]);
    }

    #[test]
    fn test_value_signals_need_a_switch() {
        let msg = muxed_message(false);
        for first in [0u8, 1, 2] {
            let payload = PaddedPayload::from_bytes(&[first, 0xAA]);
            assert_eq!(names(&select_signals(&msg, &payload)), ["Counter"]);
        }
    }

    #[test]
    fn test_decode_values_in_declaration_order() {
        let mut msg = muxed_message(true);
        msg.signals[0].factor = 0.5;
        msg.signals[0].offset = 10.0;

        let payload = PaddedPayload::from_bytes(&[1, 0x2A, 0x04, 0x03]);
        let decoded = decode_signals(&msg, &payload);

        assert_eq!(
            decoded,
            vec![
                DecodedSignal { name: "Counter".to_string(), value: 12.0 },
                DecodedSignal { name: "Page".to_string(), value: 1.0 },
                DecodedSignal { name: "Page1".to_string(), value: 42.0 },
                DecodedSignal { name: "Page1b".to_string(), value: 3.0 },
            ]
        );
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let msg = muxed_message(true);
        let payload = PaddedPayload::from_bytes(&[0, 0x11, 0x22, 0x33]);
        assert_eq!(decode_signals(&msg, &payload), decode_signals(&msg, &payload));
    }

    #[test]
    fn test_negative_switch_never_matches() {
        let mut msg = muxed_message(true);
        msg.signals[1].value_type = crate::signals::ValueType::Signed;
        let payload = PaddedPayload::from_bytes(&[0xFF, 0xAA]);
        assert_eq!(names(&select_signals(&msg, &payload)), ["Counter", "Page"]);
    }
}
