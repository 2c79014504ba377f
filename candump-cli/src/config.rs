//! Configuration loading and parsing

use anyhow::{Context, Result};
use candump_decoder::{DecoderConfig, DuplicatePolicy, InterfaceMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub interfaces: Option<InterfaceMap>,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub filtering: FilteringConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub log: Option<PathBuf>,
    /// DBC files routed by the interface table
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,
    /// DBC files with an explicit interface
    #[serde(default)]
    pub schemas: Vec<SchemaSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaSource {
    pub path: PathBuf,
    pub interface: Option<String>,
}

impl SchemaSource {
    /// Parse `IFACE=PATH` or a bare `PATH`
    pub fn from_arg(arg: &str) -> Self {
        match arg.split_once('=') {
            Some((interface, path)) if !interface.is_empty() && !path.is_empty() => Self {
                path: PathBuf::from(path),
                interface: Some(interface.to_string()),
            },
            _ => Self {
                path: PathBuf::from(arg),
                interface: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    /// Write run statistics as JSON here
    pub stats: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilteringConfig {
    pub interfaces: Option<Vec<String>>,
    pub message_ids: Option<Vec<u32>>,
}

impl FilteringConfig {
    pub fn to_decoder_config(&self) -> DecoderConfig {
        let mut config = DecoderConfig::new();
        if let Some(interfaces) = &self.interfaces {
            config = config.with_interface_filter(interfaces.clone());
        }
        if let Some(ids) = &self.message_ids {
            config = config.with_message_filter(ids.clone());
        }
        config
    }
}

impl AppConfig {
    /// All schema sources, routed ones first
    pub fn schema_sources(&self) -> Vec<SchemaSource> {
        self.input
            .dbc_files
            .iter()
            .map(|path| SchemaSource {
                path: path.clone(),
                interface: None,
            })
            .chain(self.input.schemas.iter().cloned())
            .collect()
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
