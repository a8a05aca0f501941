use crate::core_ftpcommand::utils::{finish_transfer, open_data_connection};
use crate::helpers::ControlWriter;
use crate::session::Session;
use crate::Config;
use log::debug;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Handles the LIST FTP command.
///
/// Sends the current directory over the data connection, one entry per
/// line. Arguments such as `-la` are ignored. The data channel is closed
/// afterwards whatever the outcome.
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
/// Result<(), std::io::Error> indicating whether the control connection is still usable.
pub async fn handle_list_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;
    let listing = render_listing(&session.vfs.list().await);
    debug!("Listing {} ({} bytes)", session.vfs.pwd(), listing.len());

    let result = match open_data_connection(&writer, &mut session, "Here comes the directory listing.").await {
        Ok(Some(mut data_stream)) => {
            let outcome = async {
                data_stream.write_all(listing.as_bytes()).await?;
                data_stream.shutdown().await?;
                Ok::<u64, std::io::Error>(listing.len() as u64)
            }
            .await;
            finish_transfer(&writer, &session, outcome, "Directory send OK.").await
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };

    session.data_channel.close().await;
    result
}

fn render_listing(lines: &[String]) -> String {
    let mut listing = String::new();
    for line in lines {
        listing.push_str(line);
        listing.push_str("\r\n");
    }
    listing
}
