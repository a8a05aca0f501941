use crate::core_ftpcommand::utils::reply_vfs_error;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the DELE (Delete) FTP command. Only files can be deleted.
pub async fn handle_dele_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let session = session.lock().await;
    match session.vfs.delete(&arg).await {
        Ok(()) => {
            info!("Deleted {}", arg);
            send_response(&writer, b"250 File deleted.\r\n").await
        }
        Err(e) => reply_vfs_error(&writer, &session, "DELE", &e).await,
    }
}
