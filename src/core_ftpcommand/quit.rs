use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the QUIT FTP command.
///
/// Only replies; the connection loop closes the session after this handler
/// returns. A pending RNFR is simply dropped with the session.
pub async fn handle_quit_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    info!("Client {} quit", session.lock().await.peer_addr);
    send_response(&writer, b"221 Goodbye.\r\n").await
}
