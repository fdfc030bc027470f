use crate::context::NodeContext;
use crate::errors::HandlerError;
use crate::reply_handler::ReplyHandler;
use crate::request_handler::{RequestHandler, SendOptions};
use libpeerwire::{Command, FutureResponse, Message, MessageType, PeerAddress};
use log::*;

/// Liveness probe. A ping is answered with an empty `OK`, which is enough for the requester to mark the peer online.
pub struct PingRpc {
    context: NodeContext,
}

impl PingRpc {
    pub fn new(context: NodeContext) -> Self {
        Self { context }
    }

    pub fn ping(&self, remote: &PeerAddress, options: SendOptions) -> FutureResponse {
        self.prepare(remote, MessageType::Request1).send(&options)
    }

    /// Ping without waiting for an answer. The future only reports whether the ping could be handed to the transport.
    pub fn ping_fire_and_forget(&self, remote: &PeerAddress) -> FutureResponse {
        self.prepare(remote, MessageType::RequestFf1).fire_and_forget()
    }

    fn prepare(&self, remote: &PeerAddress, message_type: MessageType) -> RequestHandler {
        let message = self.context.create_message(remote, Command::Ping, message_type);
        RequestHandler::new(message, self.context.clone())
    }
}

impl ReplyHandler for PingRpc {
    fn commands(&self) -> &[Command] {
        &[Command::Ping]
    }

    fn check_message(&self, message: &Message) -> bool {
        message.command() == Command::Ping
            && matches!(message.message_type(), MessageType::Request1 | MessageType::RequestFf1)
    }

    fn handle_request(&self, message: Message, sign: bool) -> Result<Message, HandlerError> {
        trace!("Pinged by {}", message.sender());
        let mut reply = self.context.create_reply(&message, MessageType::Ok);
        if sign {
            self.context.sign(&mut reply)?;
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::TransportError;
    use crate::liveness::PeerMap;
    use crate::transport::{ResponseListener, Transport};
    use libp2p::identity::Keypair;
    use libpeerwire::NodeConfig;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<Message>>);

    impl Transport for Outbox {
        fn send_tcp(&self, _listener: Arc<dyn ResponseListener>, message: Message, _idle: Duration) {
            self.0.lock().unwrap().push(message);
        }

        fn send_udp(&self, _listener: Arc<dyn ResponseListener>, message: Message, _timeout: Duration) {
            self.0.lock().unwrap().push(message);
        }

        fn fire_and_forget(&self, message: Message) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn address(port: u16) -> (Keypair, PeerAddress) {
        let keypair = Keypair::generate_ed25519();
        let address = PeerAddress::from_keypair(&keypair, format!("/ip4/127.0.0.1/tcp/{port}").parse().unwrap());
        (keypair, address)
    }

    fn ping_rpc() -> (PingRpc, Arc<Outbox>) {
        let (keypair, local) = address(5000);
        let outbox = Arc::new(Outbox::default());
        let peer_map = Arc::new(PeerMap::new(*local.peer_id(), 3));
        let context = NodeContext::new(keypair, local, NodeConfig::default(), peer_map, outbox.clone());
        (PingRpc::new(context), outbox)
    }

    #[test]
    fn ping_is_answered_with_empty_ok() {
        let (rpc, _) = ping_rpc();
        let (_, remote) = address(5001);
        let request = Message::new(Command::Ping, MessageType::Request1, remote, rpc.context.address().clone(), 9);
        let reply = rpc.handle_request(request, true).expect("reply");
        assert_eq!(reply.message_type(), MessageType::Ok);
        assert_eq!(reply.message_id(), 9);
        assert!(reply.payload().is_none());
        assert!(reply.signature().is_some());
    }

    #[test]
    fn pings_go_out_as_requested() {
        let (rpc, outbox) = ping_rpc();
        let (_, remote) = address(5001);
        let pending = rpc.ping(&remote, SendOptions::udp());
        assert!(!pending.is_done());
        let sent = rpc.ping_fire_and_forget(&remote);
        assert!(sent.is_success());
        let outbox = outbox.0.lock().unwrap();
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox[0].message_type(), MessageType::Request1);
        assert_eq!(outbox[1].message_type(), MessageType::RequestFf1);
        assert!(outbox.iter().all(|m| m.command() == Command::Ping && m.recipient() == &remote));
    }
}
