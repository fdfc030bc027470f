use crate::message::Message;
use std::time::Duration;
use thiserror::Error;

/// The reason a [`crate::FutureResponse`] failed.
///
/// A `NotFound` reply is *not* an error: the remote answered, it just had nothing to give back. Such replies resolve
/// the future successfully and it is up to the application to interpret them.
#[derive(Error, Debug, Clone)]
pub enum ResponseError {
    /// The remote could not match the delivered request to anything it serves. The peer is presumed unreachable.
    #[error("Message was not delivered successfully: {0}")]
    DeliveryFailure(String),
    /// The remote handler raised an error. The peer itself is alive.
    #[error("Message caused an exception on the other side: {0}")]
    RemoteApplicationError(String),
    /// A reply arrived, but it does not belong to the request that was sent.
    #[error("Message [{received}] sent to the node is not the same as we expect. We sent [{expected}]")]
    CorrelationMismatch { expected: Box<Message>, received: Box<Message> },
    /// The transport could not deliver the request or its reply (connection refused, socket error, shutdown).
    #[error("Transport error: {0}")]
    Transport(String),
    /// No reply arrived before the connection was considered idle.
    #[error("No reply received within {0:?}")]
    Timeout(Duration),
}

impl ResponseError {
    pub fn transport(msg: impl Into<String>) -> Self {
        ResponseError::Transport(msg.into())
    }

    /// True for the failures that say something about the liveness of the remote peer.
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, ResponseError::DeliveryFailure(_))
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Could not encode object. {0}")]
    Encode(#[from] ron::Error),
    #[error("Could not decode object. {0}")]
    Decode(#[from] ron::error::SpannedError),
    #[error("Requested bytes {offset}..{offset}+{length} but the buffer only has {available} bytes")]
    OutOfBounds { offset: usize, length: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Could not sign message. {0}")]
    Signing(#[from] libp2p::identity::SigningError),
    #[error("Signing key does not belong to the message sender")]
    SenderMismatch,
    #[error("Signature does not match the message contents")]
    InvalidSignature,
    #[error("Message is not signed")]
    Unsigned,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading/writing configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration file: {0}")]
    Yaml(#[from] serde_yml::Error),
}
