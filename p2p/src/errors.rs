use libp2p::PeerId;
use libpeerwire::error::{CodecError, SignatureError};
use thiserror::Error;

/// The error a reply callback returns when it cannot answer a request. The requester sees it as a remote exception.
#[derive(Debug, Error)]
#[error("Reply callback failed: {0}")]
pub struct ReplyError(pub String);

impl From<&str> for ReplyError {
    fn from(s: &str) -> Self {
        ReplyError(s.to_string())
    }
}

impl From<String> for ReplyError {
    fn from(s: String) -> Self {
        ReplyError(s)
    }
}

/// Why a reply handler could not produce a response for an inbound request.
///
/// These never reach the requester verbatim: the dispatcher answers with an `EXCEPTION` reply instead.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Callback(#[from] ReplyError),
    #[error("Payload could not be (de)serialized. {0}")]
    Codec(#[from] CodecError),
    #[error("Response could not be signed. {0}")]
    Signature(#[from] SignatureError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection refused by {0}")]
    ConnectionRefused(PeerId),
    #[error("The remote peer {0} closed the exchange without replying")]
    NoReply(PeerId),
    #[error("No async runtime is available to drive the transport")]
    NoRuntime,
}
