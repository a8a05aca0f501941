use crate::constants::{DEFAULT_LISTEN_PORT, DEFAULT_ROOT_DIR, DEFAULT_TRANSFER_BUFFER_SIZE};
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// How the passive data port is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataPortMode {
    /// One listener on control port + 1, shared by every session of the process.
    Fixed,
    /// One OS-assigned port per session, reported in the 227 reply.
    Ephemeral,
}

/// Which storage backend sessions navigate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Auto,
    Path,
    Document,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: IpAddr,
    pub listen_port: u16,
    pub pasv_address: Option<Ipv4Addr>,
    pub data_port_mode: DataPortMode,
    pub root_dir: PathBuf,
    pub storage: StorageKind,
    pub transfer_buffer_size: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: DEFAULT_LISTEN_PORT,
            pasv_address: None,
            data_port_mode: DataPortMode::Fixed,
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            storage: StorageKind::Auto,
            transfer_buffer_size: DEFAULT_TRANSFER_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    /// Chunk size used by RETR and STOR, never zero.
    pub fn buffer_size(&self) -> usize {
        self.transfer_buffer_size.max(1)
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    info!("  Listen Address: {}", config.server.listen_address);
    info!("  Listen Port: {}", config.server.listen_port);
    match config.server.pasv_address {
        Some(addr) => info!("  PASV Address: {}", addr),
        None => info!("  PASV Address: <control socket address>"),
    }
    info!("  Data Port Mode: {:?}", config.server.data_port_mode);
    info!("  Root Directory: {}", config.server.root_dir.display());
    info!("  Storage: {:?}", config.server.storage);
    info!(
        "  Transfer Buffer Size: {} bytes",
        config.server.buffer_size()
    );
}
