//! One-way status stream from the engine to its host.
//!
//! Workers only ever send; nothing the host does with a message flows back
//! into the engine. Messages from one worker arrive in the order sent.

use log::debug;
use tokio::sync::mpsc;

pub type StatusReceiver = mpsc::UnboundedReceiver<String>;

#[derive(Debug, Clone)]
pub struct StatusSink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

/// Creates a connected sink/receiver pair.
pub fn status_channel() -> (StatusSink, StatusReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StatusSink { tx: Some(tx) }, rx)
}

impl StatusSink {
    /// A sink nobody listens to; messages are only logged.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);
        if let Some(tx) = &self.tx {
            // A host that stopped listening must not disturb the engine.
            let _ = tx.send(message);
        }
    }
}
