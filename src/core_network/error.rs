use crate::core_vfs::VfsError;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataChannelError {
    #[error("Failed to bind data port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to accept data connection: {0}")]
    Accept(#[source] io::Error),

    #[error("Data channel was closed before a client connected")]
    Closed,

    #[error("No IPv4 address available for passive mode")]
    NotIpv4,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DataChannelError {
    pub fn to_ftp_response(&self) -> String {
        "425 Can't open data connection.\r\n".to_string()
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind control port {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Data port for control port {0} is out of range")]
    InvalidDataPort(u16),

    #[error("Storage unavailable: {0}")]
    Storage(#[from] VfsError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
