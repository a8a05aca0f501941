pub mod data_channel;
pub mod error;
pub mod network;
pub mod pasv;

pub use data_channel::DataChannelManager;
pub use error::{DataChannelError, ServerError};
