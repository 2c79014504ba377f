//! Bus registry
//!
//! Per-interface index from arbitration ID to message definition. Built once
//! from the loaded DBC files before any frame is decoded, then only read.

use crate::config::DuplicatePolicy;
use crate::signals::MessageDefinition;
use std::collections::HashMap;

/// Outcome of registering one batch of messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterSummary {
    /// Messages that took a new slot
    pub added: usize,
    /// Messages whose ID was already present on the interface
    pub duplicates: usize,
}

/// Registry statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of interfaces with at least one message
    pub num_interfaces: usize,
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}

/// interface → (arbitration ID → message)
#[derive(Debug, Default)]
pub struct BusRegistry {
    buses: HashMap<String, HashMap<u32, MessageDefinition>>,
    policy: DuplicatePolicy,
}

impl BusRegistry {
    /// Create an empty registry where the first definition of an ID wins
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with an explicit duplicate policy
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            buses: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Add messages to an interface.
    ///
    /// An ID already present on the interface is reported as a duplicate and
    /// resolved according to the registry's [`DuplicatePolicy`].
    pub fn register<I>(&mut self, interface: &str, messages: I) -> RegisterSummary
    where
        I: IntoIterator<Item = MessageDefinition>,
    {
        let bus = self.buses.entry(interface.to_string()).or_default();
        let mut summary = RegisterSummary::default();

        for message in messages {
            match bus.get(&message.id) {
                None => {
                    bus.insert(message.id, message);
                    summary.added += 1;
                }
                Some(existing) => {
                    summary.duplicates += 1;
                    match self.policy {
                        DuplicatePolicy::First => {
                            log::warn!(
                                "{}: duplicate ID 0x{:X} ({} from {}) ignored, keeping {} from {}",
                                interface, message.id, message.name, message.source,
                                existing.name, existing.source
                            );
                        }
                        DuplicatePolicy::Last => {
                            log::warn!(
                                "{}: duplicate ID 0x{:X} ({} from {}) replaces {} from {}",
                                interface, message.id, message.name, message.source,
                                existing.name, existing.source
                            );
                            bus.insert(message.id, message);
                        }
                    }
                }
            }
        }

        summary
    }

    /// Find the message for an ID on an interface
    pub fn lookup(&self, interface: &str, can_id: u32) -> Option<&MessageDefinition> {
        self.buses.get(interface)?.get(&can_id)
    }

    /// Interface names, sorted
    pub fn interfaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.buses.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Messages on an interface, sorted by ID
    pub fn messages(&self, interface: &str) -> Vec<&MessageDefinition> {
        let mut messages: Vec<&MessageDefinition> = self
            .buses
            .get(interface)
            .map(|bus| bus.values().collect())
            .unwrap_or_default();
        messages.sort_unstable_by_key(|m| m.id);
        messages
    }

    /// Get registry statistics
    pub fn stats(&self) -> DatabaseStats {
        let messages = self.buses.values().flat_map(|bus| bus.values());
        DatabaseStats {
            num_interfaces: self.buses.values().filter(|bus| !bus.is_empty()).count(),
            num_messages: self.buses.values().map(HashMap::len).sum(),
            num_signals: messages.map(|m| m.signals.len()).sum(),
        }
    }
}
