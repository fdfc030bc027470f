use crate::peer_address::PeerAddress;
use crate::signature::MessageSignature;
use std::fmt::{Display, Formatter};

/// The RPC kind a message belongs to. Each command is served by exactly one reply handler on the receiving node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Ping,
    DirectData,
}

impl Command {
    pub fn as_byte(&self) -> u8 {
        match self {
            Command::Ping => 0,
            Command::DirectData => 10,
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Ping => write!(f, "PING"),
            Command::DirectData => write!(f, "DIRECT_DATA"),
        }
    }
}

/// Request and reply sub-kinds.
///
/// The meaning of the request kinds depends on the command. For [`Command::DirectData`], `Request1` carries raw bytes
/// and `Request2` carries an encoded object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    Request1,
    Request2,
    /// A request that expects no reply at all.
    RequestFf1,
    Ok,
    NotFound,
    /// The receiver could not match the request to anything it serves.
    UnknownId,
    /// The receiver failed while handling the request.
    Exception,
}

impl MessageType {
    pub fn is_request(&self) -> bool {
        matches!(self, MessageType::Request1 | MessageType::Request2 | MessageType::RequestFf1)
    }

    pub fn is_fire_and_forget(&self) -> bool {
        matches!(self, MessageType::RequestFf1)
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            MessageType::Request1 => 0,
            MessageType::Request2 => 1,
            MessageType::RequestFf1 => 2,
            MessageType::Ok => 3,
            MessageType::NotFound => 4,
            MessageType::UnknownId => 5,
            MessageType::Exception => 6,
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageType::Request1 => "REQUEST_1",
            MessageType::Request2 => "REQUEST_2",
            MessageType::RequestFf1 => "REQUEST_FF_1",
            MessageType::Ok => "OK",
            MessageType::NotFound => "NOT_FOUND",
            MessageType::UnknownId => "UNKNOWN_ID",
            MessageType::Exception => "EXCEPTION",
        };
        write!(f, "{s}")
    }
}

/// One logical protocol exchange unit: a request or the reply to one.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    command: Command,
    message_type: MessageType,
    sender: PeerAddress,
    recipient: PeerAddress,
    message_id: u32,
    payload: Option<Vec<u8>>,
    signature: Option<MessageSignature>,
}

impl Message {
    pub fn new(
        command: Command,
        message_type: MessageType,
        sender: PeerAddress,
        recipient: PeerAddress,
        message_id: u32,
    ) -> Self {
        Self { command, message_type, sender, recipient, message_id, payload: None, signature: None }
    }

    /// Build the reply to `request`. The reply keeps the request's command and correlation id and swaps the
    /// direction: `local` (the node answering) becomes the sender, the requester becomes the recipient.
    pub fn reply_to(request: &Message, local: PeerAddress, message_type: MessageType) -> Self {
        Self::new(request.command, message_type, local, request.sender.clone(), request.message_id)
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn set_message_type(&mut self, message_type: MessageType) {
        self.message_type = message_type;
    }

    pub fn sender(&self) -> &PeerAddress {
        &self.sender
    }

    pub fn recipient(&self) -> &PeerAddress {
        &self.recipient
    }

    pub fn message_id(&self) -> u32 {
        self.message_id
    }

    pub fn set_message_id(&mut self, message_id: u32) {
        self.message_id = message_id;
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn set_payload(&mut self, payload: Option<Vec<u8>>) {
        self.payload = payload;
    }

    pub fn take_payload(&mut self) -> Option<Vec<u8>> {
        self.payload.take()
    }

    pub fn signature(&self) -> Option<&MessageSignature> {
        self.signature.as_ref()
    }

    pub(crate) fn set_signature(&mut self, signature: Option<MessageSignature>) {
        self.signature = signature;
    }

    pub fn is_request(&self) -> bool {
        self.message_type.is_request()
    }

    pub fn is_ok(&self) -> bool {
        self.message_type == MessageType::Ok
    }

    pub fn is_not_ok(&self) -> bool {
        self.message_type == MessageType::NotFound
    }

    pub fn is_error(&self) -> bool {
        matches!(self.message_type, MessageType::UnknownId | MessageType::Exception)
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let len = self.payload.as_ref().map(|p| p.len()).unwrap_or(0);
        write!(
            f,
            "Msg:{}/{} id:{} {}->{} payload:{len}b",
            self.command,
            self.message_type,
            self.message_id,
            self.sender.peer_id(),
            self.recipient.peer_id()
        )
    }
}
