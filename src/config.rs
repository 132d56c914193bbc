// src/config.rs
//! Configuration: defaults, optional JSON file, command line overrides

use crate::error::{GpsError, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Command line options
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "gps-fix-server", version, about = "Serve the latest GPS fix as JSON over HTTP")]
pub struct Cli {
    /// Enable verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    /// Serial connection.
    #[arg(long)]
    pub tty: Option<String>,

    /// Baudrate of the serial connection.
    #[arg(long)]
    pub baudrate: Option<u32>,

    /// Host to listen on.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Path of a JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List available serial ports and exit.
    #[arg(long)]
    pub list_ports: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub tty: String,
    pub baudrate: u32,
    pub host: String,
    pub port: u16,
    pub read_timeout_secs: u64,
    /// Zero keeps reading forever.
    pub max_consecutive_read_errors: u32,
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tty: "/dev/ttyUSB0".to_string(),
            baudrate: 115200,
            host: "localhost".to_string(),
            port: 54321,
            read_timeout_secs: 5,
            max_consecutive_read_errors: 0,
            verbose: false,
        }
    }
}

impl ServerConfig {
    /// Build the effective configuration for a command line.
    ///
    /// An explicit `--config` file must exist; the per-user file is used
    /// only when present.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::get_config_path() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_cli(cli);
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GpsError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Per-user config file path
    pub fn get_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("gps-fix-server")
                .join("config.json"),
        )
    }

    /// Command line flags win over file values
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(tty) = &cli.tty {
            self.tty = tty.clone();
        }
        if let Some(baudrate) = cli.baudrate {
            self.baudrate = baudrate;
        }
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        self.verbose |= cli.verbose;
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}
