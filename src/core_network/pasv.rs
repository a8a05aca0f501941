use crate::core_network::error::DataChannelError;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Opens a fresh passive listener and tells the client where to connect.
pub async fn handle_pasv_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;

    let response = match pasv_ipv4(config.server.pasv_address, session.local_addr.ip()) {
        Ok(ip) => match session.data_channel.open().await {
            Ok(port) => {
                debug!("PASV listener ready on {}:{}", ip, port);
                format_pasv_reply(ip, port)
            }
            Err(e) => {
                warn!("PASV failed: {}", e);
                session.status.emit(format!("PASV failed: {}", e));
                e.to_ftp_response()
            }
        },
        Err(e) => {
            warn!("PASV failed: {}", e);
            session.status.emit(format!("PASV failed: {}", e));
            e.to_ftp_response()
        }
    };

    send_response(&writer, response.as_bytes()).await
}

/// Picks the address advertised in the 227 reply.
///
/// A configured address wins; otherwise the local address of the control
/// connection is used, unwrapping IPv4-mapped IPv6 addresses.
pub fn pasv_ipv4(configured: Option<Ipv4Addr>, local: IpAddr) -> Result<Ipv4Addr, DataChannelError> {
    if let Some(ip) = configured {
        return Ok(ip);
    }
    match local {
        IpAddr::V4(ip) => Ok(ip),
        IpAddr::V6(ip) => ip.to_ipv4_mapped().ok_or(DataChannelError::NotIpv4),
    }
}

pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{})\r\n",
        h1,
        h2,
        h3,
        h4,
        port / 256,
        port % 256
    )
}
