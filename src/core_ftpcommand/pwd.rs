use crate::helpers::{quote_path, send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PWD (Print Working Directory) FTP command.
///
/// # Arguments
///
/// * `writer` - The shared write half of the control connection.
/// * `_config` - A shared server configuration.
/// * `session` - A shared, locked session containing the user's current state.
/// * `_arg` - Ignored.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the reply could be written.
pub async fn handle_pwd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let current_dir = session.lock().await.vfs.pwd();
    let response = format!("257 {} is the current directory.\r\n", quote_path(&current_dir));
    send_response(&writer, response.as_bytes()).await
}
