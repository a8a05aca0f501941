use crate::core_ftpcommand::utils::reply_vfs_error;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the CWD (Change Working Directory) FTP command.
///
/// The argument may be relative or absolute; `..` never climbs above the
/// storage root. On failure the current directory is left untouched.
///
/// # Arguments
///
/// * `writer` - The shared write half of the control connection.
/// * `_config` - A shared server configuration.
/// * `session` - A shared, locked session containing the user's current state.
/// * `arg` - The directory to change to.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the reply could be written.
pub async fn handle_cwd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    change_directory(&writer, &session, &arg, "CWD").await
}

pub(crate) async fn change_directory(
    writer: &ControlWriter,
    session: &Arc<Mutex<Session>>,
    target: &str,
    command: &str,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;
    match session.vfs.cd(target).await {
        Ok(()) => {
            info!("Changed directory to {}", session.vfs.pwd());
            send_response(writer, b"250 Directory successfully changed.\r\n").await
        }
        Err(e) => reply_vfs_error(writer, &session, command, &e).await,
    }
}
