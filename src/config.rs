//! Persistent configuration.
//!
//! A small TOML file holding the media-control server address plus a few
//! timing knobs, kept at the XDG config path. The server address is the
//! only required value; on first run it is asked for interactively and
//! saved back here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name or IP of the media-control server, without scheme or port.
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Poll cadence for now-playing state, in milliseconds.
    pub refresh_interval_ms: u64,
    /// Render loop target, frames per second.
    pub fps: u32,
    /// Delay between marquee steps for oversized labels, in milliseconds.
    pub marquee_step_ms: u64,
}

fn default_port() -> u16 {
    8000
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 5000,
            fps: 30,
            marquee_step_ms: 200,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                address: String::new(),
                port: default_port(),
            },
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("could not parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Default XDG config path (~/.config/coverdeck/config.toml).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("coverdeck").join("config.toml"))
    }

    /// Load from the default path; `None` when the file does not exist or
    /// does not parse (first run keeps going and asks for the address).
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("Warning: {:#}\nUsing defaults.", e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("could not create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("could not write config at {}", path.display()))?;
        Ok(())
    }

    /// Persist to the default path, quietly skipping when no config
    /// directory can be determined.
    pub fn save_to_default_path(&self) -> Result<()> {
        match Self::default_path() {
            Some(path) => self.save(&path),
            None => Ok(()),
        }
    }

    pub fn has_address(&self) -> bool {
        !self.server.address.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.server.address = "192.168.1.20".into();
        config.server.port = 9001;
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.server.address, "192.168.1.20");
        assert_eq!(back.server.port, 9001);
        assert_eq!(back.display.refresh_interval_ms, 5000);
    }

    #[test]
    fn missing_optional_sections_use_defaults() {
        let config: Config = toml::from_str("[server]\naddress = \"10.0.0.5\"\n").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.display.fps, 30);
        assert_eq!(config.display.marquee_step_ms, 200);
        assert!(config.has_address());
    }

    #[test]
    fn blank_address_counts_as_absent() {
        let config = Config::default();
        assert!(!config.has_address());
    }
}
