//! Configuration Management
//!
//! Handles persistent configuration storage for acrctl.

use crate::azure::auth;
use crate::azure::client::DEFAULT_ENDPOINT;
use crate::output::OutputFormat;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the Resource Manager endpoint
pub const ENDPOINT_ENV: &str = "AZURE_RESOURCE_MANAGER_ENDPOINT";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Subscription used when none is given on the command line
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Location used by `acr create` when none is given
    #[serde(default)]
    pub location: Option<String>,
    /// Default output format
    #[serde(default)]
    pub output: Option<OutputFormat>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("acrctl").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective subscription (CLI > environment > config > Azure CLI default)
    pub fn effective_subscription(&self, cli: Option<&str>) -> Option<String> {
        if let Some(subscription) = cli {
            return Some(subscription.to_string());
        }
        if let Some(subscription) = std::env::var("AZURE_SUBSCRIPTION_ID")
            .ok()
            .filter(|s| auth::validate_subscription_id(s))
        {
            return Some(subscription);
        }
        self.subscription_id
            .clone()
            .or_else(auth::get_default_subscription)
    }

    /// Get effective endpoint (CLI > environment > public cloud)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> String {
        cli.map(|e| e.to_string())
            .or_else(|| std::env::var(ENDPOINT_ENV).ok().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Get effective output format (CLI > config > json)
    pub fn effective_output(&self, cli: Option<OutputFormat>) -> OutputFormat {
        cli.or(self.output).unwrap_or_default()
    }

    /// Get effective location for new registries (CLI > config)
    pub fn effective_location(&self, cli: Option<&str>) -> Option<String> {
        cli.map(|l| l.to_string()).or_else(|| self.location.clone())
    }

    /// Set subscription and save
    pub fn set_subscription(&mut self, subscription_id: &str) -> Result<()> {
        if !auth::validate_subscription_id(subscription_id) {
            return Err(anyhow::anyhow!(
                "'{}' is not a valid subscription id",
                subscription_id
            ));
        }
        self.subscription_id = Some(subscription_id.to_string());
        self.save()
    }

    /// Set location and save
    pub fn set_location(&mut self, location: &str) -> Result<()> {
        self.location = Some(location.to_string());
        self.save()
    }

    /// Set output format and save
    pub fn set_output(&mut self, output: OutputFormat) -> Result<()> {
        self.output = Some(output);
        self.save()
    }
}
