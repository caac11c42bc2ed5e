// securelink error types

use thiserror::Error;

/// Top-level error type for the securelink crate.
#[derive(Debug, Error)]
pub enum Error {
    // ── Key material ────────────────────────────────────────────────────
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("AEAD encryption failed: {0}")]
    Encryption(String),

    // ── Handshake ───────────────────────────────────────────────────────
    #[error("handshake authentication failed: {0}")]
    Authentication(String),

    #[error("invalid handshake state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u16),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    // ── Channel ─────────────────────────────────────────────────────────
    #[error("message too short: need at least {need} bytes, have {have}")]
    MessageTooShort { need: usize, have: usize },

    #[error("counter mismatch: expected {expected}, got {actual}")]
    CounterMismatch { expected: u64, actual: u64 },

    #[error("authentication tag mismatch")]
    TagMismatch,

    // ── Transport ───────────────────────────────────────────────────────
    #[error("transport returned status {status}: {message}")]
    Transport { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("session expired again after re-handshake")]
    SessionExpired,

    #[error("transport exchange timed out")]
    Timeout,

    // ── Application ─────────────────────────────────────────────────────
    #[error("peer reported failure: {0}")]
    Remote(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;
