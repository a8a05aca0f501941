use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the OPTS FTP command. Only `UTF8` is understood, and it is always on.
pub async fn handle_opts_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let option = arg.split_whitespace().next().unwrap_or_default();
    let response: &[u8] = if option.eq_ignore_ascii_case("UTF8") {
        b"200 Always in UTF8 mode.\r\n"
    } else {
        b"501 Option not understood.\r\n"
    };
    send_response(&writer, response).await
}
