use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    /// Instance specifier of the diagnostic server owning the router
    #[serde(default = "default_specifier")]
    pub specifier: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig { specifier: default_specifier() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RequiredServiceConfig {
    pub service_id: u16,
    /// 0xFFFF = any instance
    #[serde(default = "default_instance_id")]
    pub instance_id: u16,
    /// 0xFF = any major version
    #[serde(default = "default_major_version")]
    pub major_version: u8,
    /// Whether the client wants the service from the start
    #[serde(default = "default_requested")]
    pub requested: bool,
}

/// Service Discovery client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SdClientConfig {
    /// How long `wait_for_service` blocks (ms, default: 2000)
    #[serde(default = "default_find_timeout")]
    pub find_timeout_ms: u64,
}

impl Default for SdClientConfig {
    fn default() -> Self {
        SdClientConfig { find_timeout_ms: default_find_timeout() }
    }
}

fn default_specifier() -> String { "DiagnosticServer".to_string() }
fn default_instance_id() -> u16 { 0xFFFF }
fn default_major_version() -> u8 { 0xFF }
fn default_requested() -> bool { true }
fn default_find_timeout() -> u64 { 2000 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InstanceConfig {
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub required: HashMap<String, RequiredServiceConfig>,
    #[serde(default)]
    pub sd: SdClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SystemConfig {
    pub instances: HashMap<String, InstanceConfig>,
}

impl SystemConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn instance(&self, name: &str) -> Result<&InstanceConfig, ConfigError> {
        self.instances
            .get(name)
            .ok_or_else(|| ConfigError::UnknownInstance(name.to_string()))
    }
}
