//! Host settings, loaded from a YAML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::branding::Branding;
use crate::error::{Error, Result};
use crate::flags::FlagFiles;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub branding: Branding,
    pub flag_files: FlagFiles,
    pub network: NetworkTimings,
    /// Seeds the `username` key, standing in for the users step.
    pub username: Option<String>,
    /// Module map handed to the desktop packages step.
    pub de_packages: serde_yaml::Value,
    /// Module map handed to the network setup step.
    pub network_setup: serde_yaml::Value,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Delays of the network page, in milliseconds.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct NetworkTimings {
    /// Wait before the first scan so the adapter can settle.
    pub scan_settle_ms: u64,
    /// Wait between requesting a scan and reading the results.
    pub scan_wait_ms: u64,
    pub connectivity_interval_ms: u64,
    /// Wait after a successful connect before reloading.
    pub connect_settle_ms: u64,
}

impl Default for NetworkTimings {
    fn default() -> Self {
        Self {
            scan_settle_ms: 500,
            scan_wait_ms: 3000,
            connectivity_interval_ms: 2000,
            connect_settle_ms: 3000,
        }
    }
}

impl NetworkTimings {
    pub fn scan_settle(&self) -> Duration {
        Duration::from_millis(self.scan_settle_ms)
    }

    pub fn scan_wait(&self) -> Duration {
        Duration::from_millis(self.scan_wait_ms)
    }

    pub fn connectivity_interval(&self) -> Duration {
        Duration::from_millis(self.connectivity_interval_ms)
    }

    pub fn connect_settle(&self) -> Duration {
        Duration::from_millis(self.connect_settle_ms)
    }
}
