use crate::config::{Config, StorageKind};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "pocketftpd", about = "Share a storage root over FTP.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Control port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory served by the path backend
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Storage backend to use
    #[arg(short, long, value_enum)]
    pub storage: Option<StorageKind>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies the flags given on the command line over `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.listen_port = port;
        }
        if let Some(root) = &self.root {
            config.server.root_dir = root.clone();
        }
        if let Some(storage) = self.storage {
            config.server.storage = storage;
        }
    }
}
