use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RNFR (Rename From) FTP command.
///
/// Only records the source; nothing is checked until RNTO. A second RNFR
/// replaces the first.
pub async fn handle_rnfr_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    debug!("Rename source recorded: {}", arg);
    session.lock().await.rename_from = Some(arg);
    send_response(&writer, b"350 Ready for RNTO.\r\n").await
}
