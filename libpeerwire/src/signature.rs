//! Message signing.
//!
//! A signature covers a Blake2b-512 digest of every field that influences how a message is routed or correlated:
//! command, type, correlation id, sender and recipient identities, and the payload. The signing key must belong to the
//! sender, so a verified message also proves who sent it.

use crate::error::SignatureError;
use crate::message::Message;
use blake2::{Blake2b512, Digest};
use libp2p::identity::{Keypair, PublicKey};
use log::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageSignature {
    public_key: PublicKey,
    signature: Vec<u8>,
}

impl MessageSignature {
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn signature_hex(&self) -> String {
        hex::encode(&self.signature)
    }
}

fn message_digest(message: &Message) -> Vec<u8> {
    let mut hasher = Blake2b512::new();
    hasher.update(b"peerwire message v1");
    hasher.update([message.command().as_byte(), message.message_type().as_byte()]);
    hasher.update(message.message_id().to_le_bytes());
    hasher.update(message.sender().peer_id().to_bytes());
    hasher.update(message.recipient().peer_id().to_bytes());
    match message.payload() {
        Some(payload) => {
            hasher.update((payload.len() as u64).to_le_bytes());
            hasher.update(payload);
        }
        None => hasher.update(u64::MAX.to_le_bytes()),
    }
    hasher.finalize().to_vec()
}

/// Sign `message` with `keypair`, replacing any previous signature. Must be called after the last field was set.
pub fn attach_signature(message: &mut Message, keypair: &Keypair) -> Result<(), SignatureError> {
    let public_key = keypair.public();
    if public_key.to_peer_id() != *message.sender().peer_id() {
        return Err(SignatureError::SenderMismatch);
    }
    let signature = keypair.sign(&message_digest(message))?;
    trace!("Signed {message} ({} signature bytes)", signature.len());
    message.set_signature(Some(MessageSignature { public_key, signature }));
    Ok(())
}

/// Check that `message` carries a valid signature made by its sender.
pub fn verify_signature(message: &Message) -> Result<(), SignatureError> {
    let signature = message.signature().ok_or(SignatureError::Unsigned)?;
    if signature.public_key.to_peer_id() != *message.sender().peer_id() {
        return Err(SignatureError::SenderMismatch);
    }
    if signature.public_key.verify(&message_digest(message), &signature.signature) {
        Ok(())
    } else {
        Err(SignatureError::InvalidSignature)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::{Command, MessageType};
    use crate::peer_address::PeerAddress;

    fn signed_request() -> (Keypair, Message) {
        let keypair = Keypair::generate_ed25519();
        let sender = PeerAddress::from_keypair(&keypair, "/ip4/127.0.0.1/tcp/4000".parse().unwrap());
        let recipient =
            PeerAddress::from_keypair(&Keypair::generate_ed25519(), "/ip4/127.0.0.1/tcp/4001".parse().unwrap());
        let mut message = Message::new(Command::DirectData, MessageType::Request1, sender, recipient, 99)
            .with_payload(b"hello".to_vec());
        attach_signature(&mut message, &keypair).expect("sign message");
        (keypair, message)
    }

    #[test]
    fn signed_message_verifies() {
        let (_, message) = signed_request();
        verify_signature(&message).expect("valid signature");
    }

    #[test]
    fn tampered_payload_is_detected() {
        let (_, mut message) = signed_request();
        message.set_payload(Some(b"HELLO".to_vec()));
        assert!(matches!(verify_signature(&message), Err(SignatureError::InvalidSignature)));
    }

    #[test]
    fn only_the_sender_may_sign() {
        let (_, mut message) = signed_request();
        let stranger = Keypair::generate_ed25519();
        assert!(matches!(attach_signature(&mut message, &stranger), Err(SignatureError::SenderMismatch)));
    }

    #[test]
    fn unsigned_message() {
        let (_, mut message) = signed_request();
        message.set_signature(None);
        assert!(matches!(verify_signature(&message), Err(SignatureError::Unsigned)));
    }
}
