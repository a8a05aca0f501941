use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex;

const FEATURES: &[&str] = &["UTF8", "SIZE"];

/// Handles the FEAT FTP command with a multi-line 211 reply.
pub async fn handle_feat_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> Result<(), std::io::Error> {
    send_response(&writer, feature_reply().as_bytes()).await
}

fn feature_reply() -> String {
    let mut reply = String::from("211-Features:\r\n");
    for feature in FEATURES {
        reply.push(' ');
        reply.push_str(feature);
        reply.push_str("\r\n");
    }
    reply.push_str("211 End\r\n");
    reply
}
