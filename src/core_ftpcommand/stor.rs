use crate::core_ftpcommand::utils::{
    copy_chunked, finish_transfer, open_data_connection, reply_vfs_error,
};
use crate::helpers::ControlWriter;
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the STOR (Store) FTP command.
///
/// The target is created or truncated once the client has connected, so a
/// failed data connection leaves an existing file untouched. Everything the
/// client sends until it closes the data connection is written into it. The 226
/// reply is only sent once the content has been flushed to storage.
pub async fn handle_stor_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;
    let result = store(&writer, &config, &mut session, &arg).await;
    session.data_channel.close().await;
    result
}

async fn store(
    writer: &ControlWriter,
    config: &Config,
    session: &mut Session,
    arg: &str,
) -> Result<(), std::io::Error> {
    let Some(mut data_stream) = open_data_connection(writer, session, "Ok to send data.").await?
    else {
        return Ok(());
    };

    // Only now is the old content expendable.
    let mut file = match session.vfs.open_write(arg).await {
        Ok(file) => file,
        Err(e) => {
            drop(data_stream);
            return reply_vfs_error(writer, session, "STOR", &e).await;
        }
    };

    let outcome = copy_chunked(&mut data_stream, &mut file, config.server.buffer_size()).await;
    if let Ok(received) = &outcome {
        info!("Stored {} ({} bytes)", arg, received);
    }
    finish_transfer(writer, session, outcome, "Transfer complete.").await
}
