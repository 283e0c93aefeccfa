mod client;
mod error;
mod receiver;

pub use crate::client::RequestClient;
pub use crate::error::NetworkError;
pub use crate::receiver::{MessageHandler, Receiver, Writer};
