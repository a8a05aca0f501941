use crate::core_ftpcommand::utils::reply_vfs_error;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the SIZE (File Size) FTP command.
///
/// Replies `213 <bytes>` for a file; directories and missing entries get 550.
pub async fn handle_size_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let session = session.lock().await;
    match session.vfs.size(&arg).await {
        Ok(size) => send_response(&writer, format!("213 {}\r\n", size).as_bytes()).await,
        Err(e) => reply_vfs_error(&writer, &session, "SIZE", &e).await,
    }
}
