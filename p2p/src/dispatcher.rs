use crate::reply_handler::ReplyHandler;
use libp2p::identity::Keypair;
use libpeerwire::signature::{attach_signature, verify_signature};
use libpeerwire::{Command, Message, MessageType, PeerAddress};
use log::*;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Routes inbound requests to the [`ReplyHandler`] registered for their command and produces the reply frame.
///
/// Requests that no handler can answer get an `UNKNOWN_ID` reply; requests whose handler fails get an `EXCEPTION`
/// reply. Fire-and-forget requests are handled but never answered.
pub struct Dispatcher {
    local: PeerAddress,
    keypair: Keypair,
    sign_responses: bool,
    handlers: RwLock<HashMap<Command, Arc<dyn ReplyHandler>>>,
}

impl Dispatcher {
    pub fn new(local: PeerAddress, keypair: Keypair, sign_responses: bool) -> Self {
        Self { local, keypair, sign_responses, handlers: RwLock::new(HashMap::new()) }
    }

    pub fn local(&self) -> &PeerAddress {
        &self.local
    }

    /// Register `handler` for all of its commands, replacing previous registrations for them.
    pub fn register(&self, handler: Arc<dyn ReplyHandler>) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for command in handler.commands() {
            if handlers.insert(*command, Arc::clone(&handler)).is_some() {
                warn!("Replacing the reply handler for {command}");
            }
        }
    }

    pub fn unregister(&self, command: Command) -> bool {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner).remove(&command).is_some()
    }

    fn handler_for(&self, command: Command) -> Option<Arc<dyn ReplyHandler>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).get(&command).cloned()
    }

    /// Handle one inbound frame and return the reply to send back, if any.
    pub fn dispatch(&self, request: Message) -> Option<Message> {
        if !request.is_request() {
            warn!("Dispatcher received a reply frame without a pending request: {request}");
            return None;
        }
        let fire_and_forget = request.message_type().is_fire_and_forget();
        if !request.recipient().same_peer(&self.local) {
            warn!("Received a request meant for {}. Replying UNKNOWN_ID: {request}", request.recipient());
            return (!fire_and_forget).then(|| self.error_reply(&request, MessageType::UnknownId));
        }
        if request.signature().is_some() {
            if let Err(err) = verify_signature(&request) {
                warn!("Rejecting request with a bad signature ({err}): {request}");
                return (!fire_and_forget).then(|| self.error_reply(&request, MessageType::Exception));
            }
        }
        let handler = match self.handler_for(request.command()) {
            Some(handler) if handler.check_message(&request) => handler,
            _ => {
                debug!("No handler accepts {request}. Replying UNKNOWN_ID");
                return (!fire_and_forget).then(|| self.error_reply(&request, MessageType::UnknownId));
            }
        };
        trace!("Dispatching {request}");
        match handler.handle_request(request.clone(), self.sign_responses) {
            Ok(reply) if fire_and_forget => {
                trace!("Dropping reply to fire-and-forget request: {reply}");
                None
            }
            Ok(reply) => Some(reply),
            Err(err) => {
                warn!("Handler for {request} failed: {err}");
                (!fire_and_forget).then(|| self.error_reply(&request, MessageType::Exception))
            }
        }
    }

    fn error_reply(&self, request: &Message, message_type: MessageType) -> Message {
        let mut reply = Message::reply_to(request, self.local.clone(), message_type);
        if self.sign_responses {
            if let Err(err) = attach_signature(&mut reply, &self.keypair) {
                error!("Could not sign {message_type} reply: {err}");
            }
        }
        reply
    }
}
