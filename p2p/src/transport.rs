//! The contract between request correlators and the transport that moves their messages.
//!
//! A transport accepts a request together with the [`ResponseListener`] that is waiting for its reply, and returns
//! straight away. Later, on one of its own tasks, it calls the listener exactly once: with the reply, or with the
//! reason no reply could be obtained (refused connection, idle timeout, shutdown).

use crate::errors::TransportError;
use libpeerwire::{Message, ResponseError};
use std::sync::Arc;
use std::time::Duration;

pub trait ResponseListener: Send + Sync {
    /// A reply frame for the request arrived.
    fn on_message_received(&self, message: Message);

    /// The transport gave up on the request.
    fn on_failure(&self, error: ResponseError);
}

pub trait Transport: Send + Sync {
    /// Send over a connection-oriented channel. The exchange fails with [`ResponseError::Timeout`] if the connection
    /// stays idle for `idle_timeout`.
    fn send_tcp(&self, listener: Arc<dyn ResponseListener>, message: Message, idle_timeout: Duration);

    /// Send as a single datagram, waiting up to `timeout` for a single datagram in return.
    fn send_udp(&self, listener: Arc<dyn ResponseListener>, message: Message, timeout: Duration);

    /// Send without waiting for any reply. Only reports whether the message could be handed over.
    fn fire_and_forget(&self, message: Message) -> Result<(), TransportError>;
}
