use crate::helpers::{send_response, ControlWriter};
use crate::session::{Session, TransferType};
use crate::Config;
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the TYPE FTP command.
///
/// The type is recorded but transfers are always byte-exact. Arguments
/// other than `A` and `I` are acknowledged as binary.
pub async fn handle_type_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> Result<(), std::io::Error> {
    let transfer_type = parse_transfer_type(&arg);
    session.lock().await.transfer_type = transfer_type;
    debug!("Transfer type set to {:?}", transfer_type);

    let response = match transfer_type {
        TransferType::Ascii => "200 Type set to A.\r\n",
        TransferType::Binary => "200 Type set to I.\r\n",
    };
    send_response(&writer, response.as_bytes()).await
}

fn parse_transfer_type(arg: &str) -> TransferType {
    match arg.split_whitespace().next().map(|s| s.to_ascii_uppercase()) {
        Some(t) if t == "A" => TransferType::Ascii,
        _ => TransferType::Binary,
    }
}
