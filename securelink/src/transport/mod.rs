// Transport seam: "send bytes to an endpoint, get a status and bytes back".

use async_trait::async_trait;

use crate::crypto::kdf::SessionId;
use crate::error::Result;

mod http;

pub use http::HttpTransport;

/// Status code signalling that the server no longer holds the session.
pub const SESSION_EXPIRED: u16 = 401;

/// The three remote endpoints the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    HandshakeInit,
    HandshakeFinish,
    Request,
}

/// Raw reply from one transport exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Vec<u8>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_session_expired(&self) -> bool {
        self.status == SESSION_EXPIRED
    }
}

/// Request/response carrier used by [`SecureClient`](crate::client::SecureClient).
///
/// Implementations return `Ok` for any response that arrived, whatever its
/// status; `Err` is reserved for exchanges that did not complete.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        endpoint: Endpoint,
        body: Vec<u8>,
        session_id: Option<&SessionId>,
    ) -> Result<TransportResponse>;
}
