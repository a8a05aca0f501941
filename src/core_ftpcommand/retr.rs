use crate::core_ftpcommand::utils::{
    copy_chunked, finish_transfer, open_data_connection, reply_vfs_error,
};
use crate::helpers::ControlWriter;
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RETR (Retrieve) FTP command.
///
/// The file size is resolved before the data channel is touched, so a
/// missing file fails fast with 550. The content is then streamed over the
/// data connection in chunks of the configured transfer buffer size.
///
/// # Arguments
///
/// * `writer` - The shared write half of the control connection.
/// * `config` - A shared server configuration.
/// * `session` - A shared, locked session containing the user's current state.
/// * `arg` - The file to send.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the control connection is still usable.
pub async fn handle_retr_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;
    let result = retrieve(&writer, &config, &mut session, &arg).await;
    session.data_channel.close().await;
    result
}

async fn retrieve(
    writer: &ControlWriter,
    config: &Config,
    session: &mut Session,
    arg: &str,
) -> Result<(), std::io::Error> {
    let size = match session.vfs.size(arg).await {
        Ok(size) => size,
        Err(e) => return reply_vfs_error(writer, session, "RETR", &e).await,
    };
    let mut file = match session.vfs.open_read(arg).await {
        Ok(file) => file,
        Err(e) => return reply_vfs_error(writer, session, "RETR", &e).await,
    };

    let opening = format!("Opening BINARY mode data connection for {} ({} bytes).", arg, size);
    let Some(mut data_stream) = open_data_connection(writer, session, &opening).await? else {
        return Ok(());
    };

    let outcome = copy_chunked(&mut file, &mut data_stream, config.server.buffer_size()).await;
    if let Ok(sent) = &outcome {
        info!("Sent {} ({} bytes)", arg, sent);
    }
    finish_transfer(writer, session, outcome, "Transfer complete.").await
}
