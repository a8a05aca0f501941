use crate::core_ftpcommand::utils::reply_vfs_error;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RMD (Remove Directory) FTP command.
///
/// Removal is not recursive: a directory that still has entries is refused.
pub async fn handle_rmd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let session = session.lock().await;
    match session.vfs.rmdir(&arg).await {
        Ok(()) => {
            info!("Directory removed: {}", arg);
            send_response(&writer, b"250 Directory removed.\r\n").await
        }
        Err(e) => reply_vfs_error(&writer, &session, "RMD", &e).await,
    }
}
