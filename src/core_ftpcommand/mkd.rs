use crate::core_ftpcommand::utils::reply_vfs_error;
use crate::helpers::{quote_path, send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the MKD (Make Directory) FTP command.
///
/// Creates a single directory; missing parents are not created.
///
/// # Arguments
///
/// * `writer` - The shared write half of the control connection.
/// * `_config` - A shared server configuration.
/// * `session` - A shared, locked session containing the user's current state.
/// * `arg` - The directory name to create.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the reply could be written.
pub async fn handle_mkd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let session = session.lock().await;
    match session.vfs.mkdir(&arg).await {
        Ok(()) => {
            info!("Directory created: {}", arg);
            let response = format!("257 {} directory created.\r\n", quote_path(&arg));
            send_response(&writer, response.as_bytes()).await
        }
        Err(e) => reply_vfs_error(&writer, &session, "MKD", &e).await,
    }
}
