//! The request correlator.
//!
//! A [`RequestHandler`] owns the one-to-one relationship between an outbound request and its [`FutureResponse`]. Once
//! sent, the request is handed to the transport and the first frame that comes back is classified as exactly one of:
//!
//! - `UNKNOWN_ID`: the remote could not place the request. The future fails with a delivery failure and the recipient
//!   is reported offline.
//! - `EXCEPTION`: the remote handler failed. The future fails, the peer's liveness is left alone.
//! - a reply whose [`MessageId`] differs from the request's: the future fails with a correlation mismatch.
//! - anything else is a perfect match: `OK` and `NOT_FOUND` replies report the sender online, then the future
//!   succeeds with the reply.
//!
//! Only the first event (reply or transport failure) is acted upon. Later frames for the same request are logged and
//! dropped without touching the future or the peer map.

use crate::context::NodeContext;
use crate::transport::ResponseListener;
use libpeerwire::error::SignatureError;
use libpeerwire::{FutureResponse, Message, MessageId, MessageType, ResponseError};
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a request travels to its recipient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Send as a datagram instead of over a connection.
    pub force_udp: bool,
    /// Idle timeout for the connection. Defaults to the node's configured TCP idle timeout.
    pub idle_timeout: Option<Duration>,
}

impl SendOptions {
    pub fn udp() -> Self {
        Self { force_udp: true, idle_timeout: None }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }
}

/// An outbound request that has not been sent yet.
///
/// The request can still be changed (signed, for instance). Sending consumes the handler and returns the
/// [`FutureResponse`] for exactly the frame that went out.
pub struct RequestHandler {
    context: NodeContext,
    message: Message,
}

impl RequestHandler {
    pub fn new(message: Message, context: NodeContext) -> Self {
        Self { context, message }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Sign the outbound request with the node's keypair. Call before sending.
    pub fn sign(&mut self) -> Result<(), SignatureError> {
        self.context.sign(&mut self.message)
    }

    /// Send the request the way `options` asks for.
    pub fn send(self, options: &SendOptions) -> FutureResponse {
        if options.force_udp {
            self.send_udp()
        } else {
            let idle_timeout = options.idle_timeout.unwrap_or(self.context.config().idle_tcp);
            self.send_tcp(idle_timeout)
        }
    }

    /// Send the request over TCP. The connection is considered dead once it has been idle for `idle_timeout`.
    pub fn send_tcp(self, idle_timeout: Duration) -> FutureResponse {
        let pending = self.submit();
        let message = pending.request().clone();
        trace!("Sending {message} over TCP (idle timeout {idle_timeout:?})");
        pending.context.transport().send_tcp(pending.clone(), message, idle_timeout);
        pending.future.clone()
    }

    /// Send the request over UDP, waiting for the node's configured UDP timeout.
    pub fn send_udp(self) -> FutureResponse {
        let pending = self.submit();
        let message = pending.request().clone();
        let timeout = pending.context.config().udp_timeout;
        trace!("Sending {message} over UDP");
        pending.context.transport().send_udp(pending.clone(), message, timeout);
        pending.future.clone()
    }

    /// Send the request without waiting for a reply. The future succeeds with the request itself as soon as the
    /// transport has accepted it.
    ///
    /// The request goes out with the type it was built with. A remote still answers a `REQUEST_1` or `REQUEST_2`
    /// sent this way; the transport drops that answer.
    pub fn fire_and_forget(self) -> FutureResponse {
        let future = FutureResponse::new(self.message.clone());
        match self.context.transport().fire_and_forget(self.message.clone()) {
            Ok(()) => {
                future.succeed(self.message);
            }
            Err(err) => {
                debug!("Fire-and-forget {} could not be sent: {err}", self.message);
                future.fail(ResponseError::transport(err.to_string()));
            }
        }
        future
    }

    fn submit(self) -> Arc<PendingRequest> {
        let send_message_id = MessageId::new(&self.message);
        Arc::new(PendingRequest {
            future: FutureResponse::new(self.message),
            context: self.context,
            send_message_id,
            sent_at: Instant::now(),
            settled: AtomicBool::new(false),
        })
    }
}

/// A request in flight. This is the listener the transport reports back to.
struct PendingRequest {
    future: FutureResponse,
    context: NodeContext,
    send_message_id: MessageId,
    sent_at: Instant,
    settled: AtomicBool,
}

impl PendingRequest {
    fn request(&self) -> &Message {
        self.future.request()
    }

    /// Claim the right to settle the request. Only the first caller gets it.
    fn settle(&self, what: &dyn std::fmt::Display) -> bool {
        if self.settled.swap(true, Ordering::AcqRel) {
            error!("Request {} was already settled. Ignoring {what}", self.request());
            return false;
        }
        true
    }

    fn fail(&self, error: ResponseError) {
        if !self.future.fail(error) {
            error!("Future for {} was resolved outside of its request handler", self.request());
        }
    }
}

impl ResponseListener for PendingRequest {
    fn on_message_received(&self, message: Message) {
        if !self.settle(&message) {
            return;
        }
        let recv_message_id = MessageId::new(&message);
        match message.message_type() {
            MessageType::UnknownId => {
                self.fail(ResponseError::DeliveryFailure(self.request().to_string()));
                self.context.peer_map().peer_offline(self.request().recipient(), true);
            }
            MessageType::Exception => {
                self.fail(ResponseError::RemoteApplicationError(self.request().to_string()));
            }
            _ if recv_message_id != self.send_message_id => {
                let request = self.request();
                warn!("Message [{message}] sent to the node is not the same as we expect. We sent [{request}]");
                self.fail(ResponseError::CorrelationMismatch {
                    expected: Box::new(request.clone()),
                    received: Box::new(message),
                });
            }
            _ => {
                debug!("perfect: {message}");
                if message.is_ok() || message.is_not_ok() {
                    self.context.peer_map().peer_online(message.sender(), Some(self.sent_at.elapsed()));
                }
                if !self.future.succeed(message) {
                    error!("Future for {} was resolved outside of its request handler", self.request());
                }
            }
        }
    }

    fn on_failure(&self, error: ResponseError) {
        if !self.settle(&error) {
            return;
        }
        debug!("Request {} failed: {error}", self.request());
        self.fail(error);
    }
}
