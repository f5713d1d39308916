//! Configuration management for RoomOSC GW
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use tokio::fs;

use crate::commands::DEFAULT_NAMESPACE;
use crate::feedback::FeedbackBinding;
use crate::osc::normalize_path;

pub use watcher::ConfigWatcher;

/// Inbound address prefix used when none is configured
pub const DEFAULT_OUTPUT_HEADER: &str = "/roomosc";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedbacks: Vec<FeedbackBinding>,
}

/// Controller endpoint and telemetry settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// IP address of the controller application
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the controller receives commands on
    #[serde(default = "default_command_port")]
    pub command_port: u16,
    /// Local telemetry port, 0 disables listening
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Address prefix of inbound telemetry
    #[serde(default = "default_output_header")]
    pub output_header: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            command_port: default_command_port(),
            listen_port: default_listen_port(),
            output_header: default_output_header(),
        }
    }
}

impl DeviceConfig {
    /// Output header with a guaranteed leading `/`
    pub fn output_header(&self) -> String {
        normalize_path(&self.output_header)
    }

    /// Command destination; fails if the host is not an IP address
    pub fn command_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid device host '{}': expected an IP address", self.host))?;
        Ok(SocketAddr::new(ip, self.command_port))
    }

    pub fn listening(&self) -> bool {
        self.listen_port != 0
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            namespace: default_namespace(),
            feedbacks: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {}", path))?;

        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        self.device.command_addr()?;

        if self.device.command_port == 0 {
            anyhow::bail!("device.command_port must be between 1 and 65535");
        }
        if self.device.output_header.trim_matches('/').is_empty() {
            anyhow::bail!("device.output_header cannot be empty");
        }
        if self.namespace.trim_matches('/').is_empty() {
            anyhow::bail!("namespace cannot be empty");
        }

        let mut ids = HashSet::new();
        for (idx, binding) in self.feedbacks.iter().enumerate() {
            if binding.id.is_empty() {
                anyhow::bail!("Feedback {} id cannot be empty", idx);
            }
            if !ids.insert(binding.id.as_str()) {
                anyhow::bail!("Duplicate feedback id '{}'", binding.id);
            }
        }

        Ok(())
    }

    /// Outbound namespace without surrounding slashes
    pub fn namespace(&self) -> &str {
        self.namespace.trim_matches('/')
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_command_port() -> u16 { 9090 }
fn default_listen_port() -> u16 { 1234 }
fn default_output_header() -> String { DEFAULT_OUTPUT_HEADER.to_string() }
fn default_namespace() -> String { DEFAULT_NAMESPACE.to_string() }
