// securelink: mutually authenticated, forward-secret request/response channel.
//
// Crate root: module declarations and public re-exports.

pub mod channel;
pub mod client;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod handshake;
pub mod transport;

// Re-export key types at crate root for convenience.
pub use channel::EncryptedChannel;
pub use client::SecureClient;
pub use config::ClientConfig;
pub use crypto::kdf::{SessionId, SessionKeys};
pub use crypto::keys::{IdentityBundle, PeerKeys};
pub use error::{Error, Result};
pub use handshake::{Initiator, Responder};
pub use transport::{Endpoint, HttpTransport, Transport, TransportResponse};
