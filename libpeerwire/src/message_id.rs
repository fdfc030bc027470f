use crate::message::{Command, Message};
use libp2p::PeerId;
use std::fmt::{Display, Formatter};

/// The correlation key of a request/reply exchange.
///
/// The key is normalised to the point of view of the requesting node: for a request the local peer is the sender, for
/// a reply it is the recipient. A request and its genuine reply therefore produce equal ids, while a reply to some
/// other request, for some other command, or coming from some other peer does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId {
    id: u32,
    command: Command,
    local: PeerId,
    remote: PeerId,
}

impl MessageId {
    pub fn new(message: &Message) -> Self {
        let (local, remote) = if message.is_request() {
            (message.sender(), message.recipient())
        } else {
            (message.recipient(), message.sender())
        };
        Self { id: message.message_id(), command: message.command(), local: *local.peer_id(), remote: *remote.peer_id() }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }
}

impl From<&Message> for MessageId {
    fn from(message: &Message) -> Self {
        MessageId::new(message)
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{} ({}<->{})", self.command, self.id, self.local, self.remote)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::MessageType;
    use crate::peer_address::PeerAddress;
    use libp2p::identity::Keypair;

    fn address() -> PeerAddress {
        PeerAddress::from_keypair(&Keypair::generate_ed25519(), "/ip4/127.0.0.1/tcp/4000".parse().unwrap())
    }

    #[test]
    fn genuine_reply_matches_request() {
        let (alice, bob) = (address(), address());
        let request = Message::new(Command::DirectData, MessageType::Request1, alice, bob.clone(), 7);
        let reply = Message::reply_to(&request, bob, MessageType::NotFound);
        assert_eq!(MessageId::new(&request), MessageId::new(&reply));
    }

    #[test]
    fn any_differing_field_breaks_the_match() {
        let (alice, bob, carol) = (address(), address(), address());
        let request = Message::new(Command::DirectData, MessageType::Request1, alice.clone(), bob.clone(), 7);
        let sent = MessageId::new(&request);

        let mut stale = Message::reply_to(&request, bob.clone(), MessageType::Ok);
        stale.set_message_id(6);
        assert_ne!(sent, MessageId::new(&stale));

        let other_command = Message::new(Command::Ping, MessageType::Ok, bob, alice.clone(), 7);
        assert_ne!(sent, MessageId::new(&other_command));

        let spoofed = Message::reply_to(&request, carol, MessageType::Ok);
        assert_ne!(sent, MessageId::new(&spoofed));
    }
}
