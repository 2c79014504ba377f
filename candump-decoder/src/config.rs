//! Decoder configuration types
//!
//! The interface resolution table that routes each DBC file to a bus, the
//! duplicate-ID policy of the bus registry, and optional frame filters.

use serde::{Deserialize, Serialize};

/// Interface label used when no keyword matches
pub const DEFAULT_INTERFACE: &str = "can0";

/// One keyword → interface rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRule {
    /// Substring looked for in the schema source path
    pub keyword: String,
    /// Interface assigned on match
    pub label: String,
}

impl InterfaceRule {
    pub fn new(keyword: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            label: label.into(),
        }
    }
}

/// Maps a schema source (file path or name) to the interface it describes.
///
/// Rules are checked in order and the first keyword found in the source wins.
/// Sources matching no rule get `default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceMap {
    #[serde(default)]
    pub rules: Vec<InterfaceRule>,
    #[serde(default = "default_interface")]
    pub default: String,
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

impl Default for InterfaceMap {
    /// Tractive bus on can2, sensor bus on can1, everything else on can0
    fn default() -> Self {
        Self {
            rules: vec![
                InterfaceRule::new("Tractive", "can2"),
                InterfaceRule::new("Sensor", "can1"),
            ],
            default: default_interface(),
        }
    }
}

impl InterfaceMap {
    /// A map with no rules, resolving everything to `default`
    pub fn empty(default: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            default: default.into(),
        }
    }

    /// Builder method: append a rule (lowest priority so far)
    pub fn with_rule(mut self, keyword: impl Into<String>, label: impl Into<String>) -> Self {
        self.rules.push(InterfaceRule::new(keyword, label));
        self
    }

    /// Resolve a schema source to its interface label
    pub fn resolve(&self, source: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| source.contains(rule.keyword.as_str()))
            .map(|rule| rule.label.as_str())
            .unwrap_or(self.default.as_str())
    }
}

/// What happens when two schemas define the same ID on the same interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the definition registered first
    #[default]
    First,
    /// Replace with the definition registered last
    Last,
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Optional: only decode frames from these interfaces
    #[serde(default)]
    pub interface_filter: Option<Vec<String>>,

    /// Optional: only decode these specific CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set interface filter
    pub fn with_interface_filter(mut self, interfaces: Vec<String>) -> Self {
        self.interface_filter = Some(interfaces);
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Check if a frame should be processed based on filters
    pub fn should_process_frame(&self, interface: &str, can_id: u32) -> bool {
        let interface_ok = match &self.interface_filter {
            Some(interfaces) => interfaces.iter().any(|i| i == interface),
            None => true,
        };
        let message_ok = match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        };
        interface_ok && message_ok
    }
}
