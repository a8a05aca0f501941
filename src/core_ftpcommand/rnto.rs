use crate::core_ftpcommand::utils::reply_vfs_error;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RNTO (Rename To) FTP command.
///
/// Completes the rename started by RNFR. The recorded source is consumed
/// whether or not the rename succeeds.
///
/// # Arguments
///
/// * `writer` - The shared write half of the control connection.
/// * `_config` - A shared server configuration.
/// * `session` - A shared, locked session containing the user's current state.
/// * `arg` - The new name.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the reply could be written.
pub async fn handle_rnto_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;
    let Some(from) = session.rename_from.take() else {
        return send_response(&writer, b"503 Bad sequence of commands.\r\n").await;
    };

    match session.vfs.rename(&from, &arg).await {
        Ok(()) => {
            info!("Renamed {} to {}", from, arg);
            send_response(&writer, b"250 Rename successful.\r\n").await
        }
        Err(e) => reply_vfs_error(&writer, &session, "RNTO", &e).await,
    }
}
