pub mod codec;
pub mod config;
pub mod error;
pub mod future;
pub mod message;
pub mod message_id;
pub mod peer_address;
pub mod signature;

pub use codec::{ObjectCodec, RonCodec};
pub use config::NodeConfig;
pub use error::ResponseError;
pub use future::{FutureData, FutureResponse};
pub use message::{Command, Message, MessageType};
pub use message_id::MessageId;
pub use peer_address::PeerAddress;
