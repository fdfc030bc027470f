//! Server-side handling of inbound requests.
//!
//! Every RPC that a node serves implements [`ReplyHandler`] and is registered with the [`Dispatcher`] for the commands
//! it answers. The dispatcher takes care of the failure modes shared by all RPCs (unknown command, wrong recipient,
//! bad signature, handler errors); a handler only has to turn a valid request into its reply.
//!
//! ```ignore
//! impl ReplyHandler for EchoRpc {
//!     fn commands(&self) -> &[Command] {
//!         &[Command::DirectData]
//!     }
//!
//!     fn check_message(&self, message: &Message) -> bool {
//!         message.message_type() == MessageType::Request1
//!     }
//!
//!     fn handle_request(&self, message: Message, sign: bool) -> Result<Message, HandlerError> {
//!         let mut reply = self.context.create_reply(&message, MessageType::Ok);
//!         reply.set_payload(message.payload().map(|p| p.to_vec()));
//!         Ok(reply)
//!     }
//! }
//! ```
//!
//! [`Dispatcher`]: crate::dispatcher::Dispatcher

use crate::errors::HandlerError;
use libpeerwire::{Command, Message};

pub trait ReplyHandler: Send + Sync {
    /// The commands this handler answers.
    fn commands(&self) -> &[Command];

    /// Whether `message` is a request this handler knows how to answer.
    fn check_message(&self, message: &Message) -> bool;

    /// Build the reply to `message`. With `sign`, the reply must be signed with the node's keypair before it is
    /// returned. Errors are reported to the requester as an `EXCEPTION` reply.
    fn handle_request(&self, message: Message, sign: bool) -> Result<Message, HandlerError>;
}
