// securelink handshake protocol: 3-message exchange with signed ephemeral
// X25519 keys and transcript-bound HKDF session keys.
//
//   Initiator                         Responder
//     |--- Init (sig over eI||nI) -------->|
//     |<-- Reply (sig over eR||nR||nI) ----|
//     |--- Finish (encrypted "ready") ---->|
//     |==== encrypted channel ============|
//
// Both parties hash the transcript [init bytes, reply bytes] and derive the
// same key pair in mirrored directions.

use std::sync::Arc;

use ed25519_dalek::VerifyingKey;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::channel::EncryptedChannel;
use crate::crypto::hash::Transcript;
use crate::crypto::kdf::{derive_session_keys, Role, SessionKeys};
use crate::crypto::keys::{fingerprint, verify_with, IdentityBundle, PeerKeys};
use crate::crypto::x25519::EphemeralKeyPair;
use crate::error::{Error, Result};
use crate::handshake::messages::{
    init_signed_bytes, reply_signed_bytes, FinishMessage, HandshakeMessage, InitMessage,
    ReadyProof, ReplyMessage, HANDSHAKE_NONCE_LEN, PROTOCOL_VERSION,
};
use crate::handshake::state::{InitiatorState, ResponderState};

fn random_handshake_nonce() -> [u8; HANDSHAKE_NONCE_LEN] {
    let mut nonce = [0u8; HANDSHAKE_NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

fn invalid_transition(from: &str, to: &str) -> Error {
    Error::InvalidStateTransition {
        from: from.into(),
        to: to.into(),
    }
}

// ── Initiator ────────────────────────────────────────────────────────────

/// Client-side (initiator) of the securelink handshake.
///
/// One instance drives exactly one handshake attempt. Steps must be called
/// in order: [`create_init`](Self::create_init),
/// [`process_reply`](Self::process_reply), [`create_finish`](Self::create_finish).
pub struct Initiator {
    identity: Arc<IdentityBundle>,
    peer: PeerKeys,
    nonce: [u8; HANDSHAKE_NONCE_LEN],
    ephemeral_public: [u8; 32],
    transcript: Transcript,
    state: InitiatorState,
}

impl Initiator {
    /// Create a new initiator. `peer` is the responder's pre-provisioned
    /// long-term public key set; the reply must be signed by it.
    pub fn new(identity: Arc<IdentityBundle>, peer: PeerKeys) -> Self {
        let ephemeral = EphemeralKeyPair::generate();
        Self {
            identity,
            peer,
            nonce: random_handshake_nonce(),
            ephemeral_public: ephemeral.public_key_bytes(),
            transcript: Transcript::new(),
            state: InitiatorState::Fresh { ephemeral },
        }
    }

    pub fn state_label(&self) -> &'static str {
        self.state.label()
    }

    /// Step 1: produce the serialized init message.
    pub fn create_init(&mut self) -> Result<Vec<u8>> {
        let ephemeral = match std::mem::replace(&mut self.state, InitiatorState::Failed) {
            InitiatorState::Fresh { ephemeral } => ephemeral,
            other => {
                let err = invalid_transition(other.label(), "AwaitingReply");
                self.state = other;
                return Err(err);
            }
        };

        let signature = self
            .identity
            .signing
            .sign(&init_signed_bytes(&self.ephemeral_public, &self.nonce));

        let bytes = HandshakeMessage::Init(InitMessage {
            version: PROTOCOL_VERSION,
            signing_public_key: self.identity.signing.public_key_bytes(),
            ephemeral_public_key: self.ephemeral_public,
            nonce: self.nonce,
            signature,
        })
        .to_bytes()?;

        self.transcript.append(&bytes);
        self.state = InitiatorState::AwaitingReply { ephemeral };
        Ok(bytes)
    }

    /// Step 2: verify the responder's reply and derive session keys.
    ///
    /// Any failure here aborts the handshake; the initiator moves to
    /// `Failed` and must be discarded.
    pub fn process_reply(&mut self, reply_bytes: &[u8]) -> Result<&SessionKeys> {
        let ephemeral = match std::mem::replace(&mut self.state, InitiatorState::Failed) {
            InitiatorState::AwaitingReply { ephemeral } => ephemeral,
            other => {
                let err = invalid_transition(other.label(), "KeysDerived");
                self.state = other;
                return Err(err);
            }
        };

        self.transcript.append(reply_bytes);
        let reply: ReplyMessage = HandshakeMessage::from_bytes(reply_bytes)?.into_reply()?;

        let signed = reply_signed_bytes(&reply.ephemeral_public_key, &reply.nonce, &self.nonce);
        if verify_with(&self.peer.signing, &signed, &reply.signature).is_err() {
            tracing::warn!(
                peer = %self.peer.fingerprint(),
                "handshake reply signature did not verify"
            );
            return Err(Error::Authentication(
                "responder signature did not verify".into(),
            ));
        }

        let shared = ephemeral.diffie_hellman(&reply.ephemeral_public_key)?;
        let keys = derive_session_keys(&shared, &self.transcript.hash(), Role::Initiator)?;
        tracing::debug!(session_id = %keys.session_id(), "handshake keys derived");

        self.state = InitiatorState::KeysDerived { keys };
        self.session_keys()
            .ok_or_else(|| invalid_transition("Failed", "KeysDerived"))
    }

    /// Step 3: produce the finish message proving possession of the keys.
    ///
    /// The proof is sealed by a throwaway channel that is dropped right
    /// here; traffic afterwards must use a new channel.
    pub fn create_finish(&mut self) -> Result<Vec<u8>> {
        let keys = match std::mem::replace(&mut self.state, InitiatorState::Failed) {
            InitiatorState::KeysDerived { keys } => keys,
            other => {
                let err = invalid_transition(other.label(), "Ready");
                self.state = other;
                return Err(err);
            }
        };

        let proof = {
            let mut throwaway = EncryptedChannel::new(&keys)?;
            throwaway.encrypt_value(&ReadyProof::now())?
        };

        let bytes = HandshakeMessage::Finish(FinishMessage {
            version: PROTOCOL_VERSION,
            proof,
        })
        .to_bytes()?;

        self.state = InitiatorState::Ready { keys };
        Ok(bytes)
    }

    /// Derived keys, once available.
    pub fn session_keys(&self) -> Option<&SessionKeys> {
        match &self.state {
            InitiatorState::KeysDerived { keys } | InitiatorState::Ready { keys } => Some(keys),
            _ => None,
        }
    }

    /// Consume a finished initiator, yielding its session keys.
    pub fn into_session_keys(self) -> Result<SessionKeys> {
        match self.state {
            InitiatorState::Ready { keys } => Ok(keys),
            other => Err(invalid_transition(other.label(), "Ready")),
        }
    }
}

// ── Responder ────────────────────────────────────────────────────────────

/// Server-side (responder) of the securelink handshake.
///
/// Accepts an init only from a trusted initiator signing key, and only if
/// its signature over `ephemeral_public_key || nonce_i` verifies.
pub struct Responder {
    identity: Arc<IdentityBundle>,
    trusted: Vec<VerifyingKey>,
    transcript: Transcript,
    peer: Option<VerifyingKey>,
    state: ResponderState,
}

impl Responder {
    pub fn new(
        identity: Arc<IdentityBundle>,
        trusted_initiators: impl IntoIterator<Item = VerifyingKey>,
    ) -> Self {
        Self {
            identity,
            trusted: trusted_initiators.into_iter().collect(),
            transcript: Transcript::new(),
            peer: None,
            state: ResponderState::AwaitingInit,
        }
    }

    pub fn state_label(&self) -> &'static str {
        self.state.label()
    }

    /// The authenticated initiator's signing key, after a verified init.
    pub fn peer_signing_key(&self) -> Option<&VerifyingKey> {
        self.peer.as_ref()
    }

    /// Step 1 (responder side): verify the init, produce the serialized reply.
    pub fn process_init(&mut self, init_bytes: &[u8]) -> Result<Vec<u8>> {
        if !matches!(self.state, ResponderState::AwaitingInit) {
            return Err(invalid_transition(self.state.label(), "AwaitingFinish"));
        }
        self.state = ResponderState::Failed;

        self.transcript.append(init_bytes);
        let init: InitMessage = HandshakeMessage::from_bytes(init_bytes)?.into_init()?;

        let initiator_key = VerifyingKey::from_bytes(&init.signing_public_key)
            .map_err(|e| Error::InvalidKey(format!("{e}")))?;
        if !self.trusted.contains(&initiator_key) {
            tracing::warn!(peer = %fingerprint(&initiator_key), "init from untrusted key");
            return Err(Error::Authentication("initiator key is not trusted".into()));
        }
        let signed = init_signed_bytes(&init.ephemeral_public_key, &init.nonce);
        if verify_with(&initiator_key, &signed, &init.signature).is_err() {
            return Err(Error::Authentication(
                "initiator signature did not verify".into(),
            ));
        }

        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key_bytes();
        let nonce = random_handshake_nonce();
        let signature = self
            .identity
            .signing
            .sign(&reply_signed_bytes(&ephemeral_public, &nonce, &init.nonce));

        let reply_bytes = HandshakeMessage::Reply(ReplyMessage {
            version: PROTOCOL_VERSION,
            ephemeral_public_key: ephemeral_public,
            nonce,
            signature,
        })
        .to_bytes()?;
        self.transcript.append(&reply_bytes);

        let shared = ephemeral.diffie_hellman(&init.ephemeral_public_key)?;
        let keys = derive_session_keys(&shared, &self.transcript.hash(), Role::Responder)?;

        self.peer = Some(initiator_key);
        self.state = ResponderState::AwaitingFinish { keys };
        Ok(reply_bytes)
    }

    /// Step 3 (responder side): check the initiator's finish proof.
    pub fn process_finish(&mut self, finish_bytes: &[u8]) -> Result<()> {
        let keys = match std::mem::replace(&mut self.state, ResponderState::Failed) {
            ResponderState::AwaitingFinish { keys } => keys,
            other => {
                let err = invalid_transition(other.label(), "Complete");
                self.state = other;
                return Err(err);
            }
        };

        let finish = HandshakeMessage::from_bytes(finish_bytes)?.into_finish()?;
        let proof: ReadyProof = {
            let mut throwaway = EncryptedChannel::new(&keys)?;
            throwaway.decrypt_value(&finish.proof)?
        };
        if !proof.is_ready() {
            return Err(Error::Authentication(format!(
                "finish proof carried status {:?}",
                proof.status
            )));
        }

        self.state = ResponderState::Complete { keys };
        Ok(())
    }

    /// Derived keys, once the reply has been produced.
    pub fn session_keys(&self) -> Option<&SessionKeys> {
        match &self.state {
            ResponderState::AwaitingFinish { keys } | ResponderState::Complete { keys } => {
                Some(keys)
            }
            _ => None,
        }
    }

    /// Consume a completed responder, yielding its session keys.
    pub fn into_session_keys(self) -> Result<SessionKeys> {
        match self.state {
            ResponderState::Complete { keys } => Ok(keys),
            other => Err(invalid_transition(other.label(), "Complete")),
        }
    }
}
