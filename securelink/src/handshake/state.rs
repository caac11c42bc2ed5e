// Handshake state machines for both sides.

use crate::crypto::kdf::SessionKeys;
use crate::crypto::x25519::EphemeralKeyPair;

/// The current state of the initiator side.
#[derive(Debug)]
pub enum InitiatorState {
    /// Ephemeral keypair and nonce generated; nothing sent yet.
    Fresh { ephemeral: EphemeralKeyPair },

    /// Init message emitted, waiting for the responder's reply.
    AwaitingReply { ephemeral: EphemeralKeyPair },

    /// Reply verified and session keys derived.
    KeysDerived { keys: SessionKeys },

    /// Finish proof emitted; keys ready for a fresh channel.
    Ready { keys: SessionKeys },

    /// Verification failed; the initiator cannot be reused.
    Failed,
}

impl InitiatorState {
    /// Human-readable label for the current state (used in error messages).
    pub fn label(&self) -> &'static str {
        match self {
            InitiatorState::Fresh { .. } => "Fresh",
            InitiatorState::AwaitingReply { .. } => "AwaitingReply",
            InitiatorState::KeysDerived { .. } => "KeysDerived",
            InitiatorState::Ready { .. } => "Ready",
            InitiatorState::Failed => "Failed",
        }
    }
}

/// The current state of the responder side.
#[derive(Debug)]
pub enum ResponderState {
    AwaitingInit,

    /// Reply sent; waiting for the initiator's finish proof.
    AwaitingFinish { keys: SessionKeys },

    /// Finish proof verified.
    Complete { keys: SessionKeys },

    Failed,
}

impl ResponderState {
    pub fn label(&self) -> &'static str {
        match self {
            ResponderState::AwaitingInit => "AwaitingInit",
            ResponderState::AwaitingFinish { .. } => "AwaitingFinish",
            ResponderState::Complete { .. } => "Complete",
            ResponderState::Failed => "Failed",
        }
    }
}
