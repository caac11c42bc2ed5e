//! Secure client -- handshake lifecycle plus authenticated calls.
//!
//! The client owns at most one [`EncryptedChannel`]. Calls are serialized on
//! an async mutex so frame counters leave in the same order they were
//! assigned. While a call is in flight its channel is taken out of the
//! session; it is put back only after the response decrypted cleanly, so a
//! failed or cancelled call leaves no channel with a half-advanced counter
//! behind, and the next call re-handshakes.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::channel::EncryptedChannel;
use crate::config::ClientConfig;
use crate::crypto::kdf::SessionId;
use crate::crypto::keys::{IdentityBundle, PeerKeys};
use crate::envelope::ProxyMessage;
use crate::error::{Error, Result};
use crate::handshake::messages::HandshakeFailure;
use crate::handshake::Initiator;
use crate::transport::{Endpoint, HttpTransport, Transport, TransportResponse};

/// How many times one call may re-handshake after a session-expired status.
pub const MAX_EXPIRY_RETRIES: usize = 1;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Default)]
struct Session {
    channel: Option<EncryptedChannel>,
    session_id: Option<SessionId>,
}

impl Session {
    fn take(&mut self) -> Option<(EncryptedChannel, SessionId)> {
        match (self.channel.take(), self.session_id.take()) {
            (Some(channel), Some(id)) => Some((channel, id)),
            _ => None,
        }
    }

    fn install(&mut self, channel: EncryptedChannel, id: SessionId) {
        self.channel = Some(channel);
        self.session_id = Some(id);
    }

    fn clear(&mut self) {
        self.channel = None;
        self.session_id = None;
    }
}

/// Authenticated request/response client for one remote peer.
///
/// Construct once and share by handle (`Arc<SecureClient<_>>`).
pub struct SecureClient<T> {
    transport: T,
    identity: Arc<IdentityBundle>,
    peer: PeerKeys,
    timeout: Duration,
    session: Mutex<Session>,
}

impl SecureClient<HttpTransport> {
    /// Client over HTTP, using the endpoints and deadline from `config`.
    pub fn connect(
        config: ClientConfig,
        identity: Arc<IdentityBundle>,
        peer: PeerKeys,
    ) -> Result<Self> {
        let timeout = config.timeout();
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(transport, identity, peer).with_timeout(timeout))
    }
}

impl<T: Transport> SecureClient<T> {
    pub fn new(transport: T, identity: Arc<IdentityBundle>, peer: PeerKeys) -> Self {
        Self {
            transport,
            identity,
            peer,
            timeout: DEFAULT_TIMEOUT,
            session: Mutex::new(Session::default()),
        }
    }

    /// Deadline applied to each transport exchange.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn is_established(&self) -> bool {
        self.session.lock().await.channel.is_some()
    }

    pub async fn session_id(&self) -> Option<SessionId> {
        self.session.lock().await.session_id
    }

    /// Drop the current channel and session id without contacting the peer.
    pub async fn reset(&self) {
        self.session.lock().await.clear();
        debug!("session reset");
    }

    /// Run a full handshake and install a fresh channel.
    ///
    /// On failure the previously installed channel, if any, is kept as is.
    pub async fn handshake(&self) -> Result<SessionId> {
        let mut session = self.session.lock().await;
        let (channel, id) = self.run_handshake().await?;
        session.install(channel, id);
        Ok(id)
    }

    /// Send `request` over the secure channel and decode the peer's answer.
    pub async fn call<Req, Resp>(&self, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_value(request)
            .map_err(|e| Error::MalformedMessage(format!("encode request: {e}")))?;
        let data = self.call_value(payload).await?;
        serde_json::from_value(data)
            .map_err(|e| Error::MalformedMessage(format!("decode response: {e}")))
    }

    /// [`call`](Self::call) on untyped JSON payloads.
    pub async fn call_value(&self, payload: Value) -> Result<Value> {
        let mut session = self.session.lock().await;
        let mut expiries = 0;

        loop {
            let (mut channel, session_id) = match session.take() {
                Some(current) => current,
                None => self.run_handshake().await?,
            };

            let envelope = ProxyMessage::request(payload.clone());
            let request_id = envelope.id();
            let frame = channel.encrypt_value(&envelope)?;
            let resp = self
                .exchange(Endpoint::Request, frame, Some(&session_id))
                .await?;

            if resp.is_session_expired() {
                if expiries >= MAX_EXPIRY_RETRIES {
                    warn!(%session_id, "session expired again after re-handshake");
                    return Err(Error::SessionExpired);
                }
                expiries += 1;
                info!(%session_id, "session expired; re-handshaking");
                continue;
            }
            if !resp.is_success() {
                warn!(status = resp.status, %request_id, "request rejected by transport");
                return Err(Error::Transport {
                    status: resp.status,
                    message: body_text(&resp.body),
                });
            }

            let reply: ProxyMessage = channel.decrypt_value(&resp.body)?;
            session.install(channel, session_id);
            return reply.into_response(request_id);
        }
    }

    async fn run_handshake(&self) -> Result<(EncryptedChannel, SessionId)> {
        debug!(peer = %self.peer.fingerprint(), "starting handshake");
        let mut initiator = Initiator::new(Arc::clone(&self.identity), self.peer);

        let init = initiator.create_init()?;
        let resp = self.exchange(Endpoint::HandshakeInit, init, None).await?;
        if !resp.is_success() {
            return Err(handshake_rejected("init", &resp));
        }

        let session_id = initiator.process_reply(&resp.body)?.session_id();
        let finish = initiator.create_finish()?;
        let resp = self
            .exchange(Endpoint::HandshakeFinish, finish, Some(&session_id))
            .await?;
        if !resp.is_success() {
            return Err(handshake_rejected("finish", &resp));
        }

        let keys = initiator.into_session_keys()?;
        let channel = EncryptedChannel::new(&keys)?;
        info!(%session_id, peer = %self.peer.fingerprint(), "handshake complete");
        Ok((channel, session_id))
    }

    async fn exchange(
        &self,
        endpoint: Endpoint,
        body: Vec<u8>,
        session_id: Option<&SessionId>,
    ) -> Result<TransportResponse> {
        tokio::time::timeout(self.timeout, self.transport.post(endpoint, body, session_id))
            .await
            .map_err(|_| {
                warn!(?endpoint, timeout = ?self.timeout, "transport exchange timed out");
                Error::Timeout
            })?
    }
}

fn handshake_rejected(step: &str, resp: &TransportResponse) -> Error {
    let message = serde_json::from_slice::<HandshakeFailure>(&resp.body)
        .map(|f| f.error)
        .unwrap_or_else(|_| body_text(&resp.body));
    warn!(step, status = resp.status, %message, "handshake rejected");
    Error::Transport {
        status: resp.status,
        message,
    }
}

fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}
