pub mod logger;
pub mod status;

pub use status::{status_channel, StatusReceiver, StatusSink};
