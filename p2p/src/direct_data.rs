//! Direct-data exchange: send an application payload straight to a peer and get the peer's answer back.
//!
//! A payload travels either as raw bytes (`REQUEST_1`) or as an object encoded with the node's [`ObjectCodec`]
//! (`REQUEST_2`). The receiving node answers with whatever its reply callback for that mode decides; a node without a
//! callback for the mode answers `NOT_FOUND`.

use crate::context::NodeContext;
use crate::errors::{HandlerError, ReplyError};
use crate::reply_handler::ReplyHandler;
use crate::request_handler::{RequestHandler, SendOptions};
use libpeerwire::error::CodecError;
use libpeerwire::{Command, FutureData, Message, MessageType, ObjectCodec, PeerAddress, RonCodec};
use log::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// What a reply callback wants to send back.
#[derive(Clone, Debug, PartialEq)]
pub enum DataReply<T> {
    /// The callback declines the request. The requester gets `NOT_FOUND`.
    NotHandled,
    /// The request is acknowledged as is. The requester gets `OK` without a body.
    Unchanged,
    /// The requester gets `OK` with this body.
    Replace(T),
}

/// Answers raw-byte direct-data requests.
pub trait RawDataReply: Send + Sync {
    fn reply(&self, sender: PeerAddress, request: Vec<u8>) -> Result<DataReply<Vec<u8>>, ReplyError>;
}

impl<F> RawDataReply for F
where F: Fn(PeerAddress, Vec<u8>) -> Result<DataReply<Vec<u8>>, ReplyError> + Send + Sync
{
    fn reply(&self, sender: PeerAddress, request: Vec<u8>) -> Result<DataReply<Vec<u8>>, ReplyError> {
        self(sender, request)
    }
}

/// Answers object direct-data requests. The request arrives decoded as `Req` and the reply object is encoded as
/// `Resp`, both with the node's [`ObjectCodec`].
pub trait ObjectDataReply<Req, Resp>: Send + Sync {
    fn reply(&self, sender: PeerAddress, request: Req) -> Result<DataReply<Resp>, ReplyError>;
}

impl<F, Req, Resp> ObjectDataReply<Req, Resp> for F
where F: Fn(PeerAddress, Req) -> Result<DataReply<Resp>, ReplyError> + Send + Sync
{
    fn reply(&self, sender: PeerAddress, request: Req) -> Result<DataReply<Resp>, ReplyError> {
        self(sender, request)
    }
}

/// An object callback bound to the codec: encoded request in, encoded reply out.
type ObjectCallback = dyn Fn(PeerAddress, &[u8]) -> Result<DataReply<Vec<u8>>, HandlerError> + Send + Sync;

pub struct DirectDataRpc<C: ObjectCodec = RonCodec> {
    context: NodeContext,
    codec: C,
    raw_reply: RwLock<Option<Arc<dyn RawDataReply>>>,
    object_reply: RwLock<Option<Arc<ObjectCallback>>>,
}

impl DirectDataRpc<RonCodec> {
    pub fn new(context: NodeContext) -> Self {
        Self::with_codec(context, RonCodec)
    }
}

impl<C: ObjectCodec> DirectDataRpc<C> {
    pub fn with_codec(context: NodeContext, codec: C) -> Self {
        Self { context, codec, raw_reply: RwLock::new(None), object_reply: RwLock::new(None) }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn set_raw_reply<R: RawDataReply + 'static>(&self, reply: R) {
        *self.raw_reply.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(reply));
    }

    pub fn clear_raw_reply(&self) {
        *self.raw_reply.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_raw_reply(&self) -> bool {
        self.raw_reply.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Register the object callback. Requests that do not decode as `Req` are answered with `EXCEPTION`.
    pub fn set_object_reply<Req, Resp, R>(&self, reply: R)
    where
        C: 'static,
        Req: DeserializeOwned + 'static,
        Resp: Serialize + 'static,
        R: ObjectDataReply<Req, Resp> + 'static,
    {
        let codec = self.codec.clone();
        let callback = move |sender: PeerAddress, payload: &[u8]| -> Result<DataReply<Vec<u8>>, HandlerError> {
            let request: Req = codec.decode_all(payload)?;
            let reply = match reply.reply(sender, request)? {
                DataReply::NotHandled => DataReply::NotHandled,
                DataReply::Unchanged => DataReply::Unchanged,
                DataReply::Replace(object) => DataReply::Replace(codec.encode_object(&object)?),
            };
            Ok(reply)
        };
        *self.object_reply.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    pub fn clear_object_reply(&self) {
        *self.object_reply.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_object_reply(&self) -> bool {
        self.object_reply.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Build the correlator for a direct-data request without sending it.
    pub fn prepare_send(&self, remote: &PeerAddress, payload: Vec<u8>, raw: bool) -> RequestHandler {
        let message_type = if raw { MessageType::Request1 } else { MessageType::Request2 };
        let message = self.context.create_message(remote, Command::DirectData, message_type).with_payload(payload);
        RequestHandler::new(message, self.context.clone())
    }

    /// Send `payload` to `remote`. With `raw`, the payload is passed to the remote's raw callback as is; otherwise it
    /// must already be an object encoded with this node's codec. Returns straight away.
    pub fn send(&self, remote: &PeerAddress, payload: Vec<u8>, raw: bool, options: SendOptions) -> FutureData {
        let handler = self.prepare_send(remote, payload, raw);
        FutureData::from_response(handler.send(&options), raw)
    }

    /// Encode `object` with the codec and send it in object mode.
    pub fn send_object<T>(&self, remote: &PeerAddress, object: &T, options: SendOptions) -> Result<FutureData, CodecError>
    where T: Serialize + ?Sized {
        let payload = self.codec.encode_object(object)?;
        Ok(self.send(remote, payload, false, options))
    }

    fn raw_callback(&self) -> Option<Arc<dyn RawDataReply>> {
        self.raw_reply.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn object_callback(&self) -> Option<Arc<ObjectCallback>> {
        self.object_reply.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn answer_raw(&self, sender: PeerAddress, payload: Vec<u8>) -> Result<DataReply<Vec<u8>>, HandlerError> {
        match self.raw_callback() {
            Some(callback) => Ok(callback.reply(sender, payload)?),
            None => {
                debug!("No raw reply callback registered. Answering NOT_FOUND");
                Ok(DataReply::NotHandled)
            }
        }
    }

    fn answer_object(&self, sender: PeerAddress, payload: Vec<u8>) -> Result<DataReply<Vec<u8>>, HandlerError> {
        let Some(callback) = self.object_callback() else {
            debug!("No object reply callback registered. Answering NOT_FOUND");
            return Ok(DataReply::NotHandled);
        };
        callback(sender, &payload)
    }
}

impl<C: ObjectCodec> ReplyHandler for DirectDataRpc<C> {
    fn commands(&self) -> &[Command] {
        &[Command::DirectData]
    }

    fn check_message(&self, message: &Message) -> bool {
        message.command() == Command::DirectData
            && matches!(message.message_type(), MessageType::Request1 | MessageType::Request2)
    }

    fn handle_request(&self, mut message: Message, sign: bool) -> Result<Message, HandlerError> {
        let sender = message.sender().clone();
        let payload = message.take_payload().unwrap_or_default();
        let answer = if message.message_type() == MessageType::Request1 {
            self.answer_raw(sender, payload)?
        } else {
            self.answer_object(sender, payload)?
        };
        let mut reply = match answer {
            DataReply::NotHandled => self.context.create_reply(&message, MessageType::NotFound),
            DataReply::Unchanged => self.context.create_reply(&message, MessageType::Ok),
            DataReply::Replace(body) => self.context.create_reply(&message, MessageType::Ok).with_payload(body),
        };
        if sign {
            self.context.sign(&mut reply)?;
        }
        trace!("Direct data reply: {reply}");
        Ok(reply)
    }
}
