use crate::core_log::StatusSink;
use crate::core_network::DataChannelManager;
use crate::core_vfs::Vfs;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

/// Per-connection state, owned by exactly one control connection task.
pub struct Session {
    pub vfs: Box<dyn Vfs>,
    pub data_channel: DataChannelManager,
    pub transfer_type: TransferType,
    /// Source recorded by RNFR, consumed by the next RNTO.
    pub rename_from: Option<String>,
    pub peer_addr: SocketAddr,
    /// Local end of the control connection, used for the PASV reply.
    pub local_addr: SocketAddr,
    pub status: StatusSink,
}

impl Session {
    pub fn new(
        vfs: Box<dyn Vfs>,
        data_channel: DataChannelManager,
        peer_addr: SocketAddr,
        local_addr: SocketAddr,
        status: StatusSink,
    ) -> Self {
        Self {
            vfs,
            data_channel,
            transfer_type: TransferType::Ascii,
            rename_from: None,
            peer_addr,
            local_addr,
            status,
        }
    }
}
