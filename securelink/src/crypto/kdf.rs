// Session key derivation: HKDF-SHA256 keyed by the ephemeral DH output and
// salted by the handshake transcript hash.
//
// ```text
// prk        = HKDF-Extract(salt = transcript_hash, ikm = shared_secret)
// i2r_key    = HKDF-Expand(prk, "securelink v1 initiator->responder", 32)
// r2i_key    = HKDF-Expand(prk, "securelink v1 responder->initiator", 32)
// session_id = HKDF-Expand(prk, "securelink v1 session id", 16)
// ```

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

pub const LABEL_INITIATOR_TO_RESPONDER: &[u8] = b"securelink v1 initiator->responder";
pub const LABEL_RESPONDER_TO_INITIATOR: &[u8] = b"securelink v1 responder->initiator";
pub const LABEL_SESSION_ID: &[u8] = b"securelink v1 session id";

pub const KEY_LEN: usize = 32;
pub const SESSION_ID_LEN: usize = 16;

/// Which side of the handshake is deriving keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Opaque token the transport uses to route calls to server-side session state.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; SESSION_ID_LEN]);

impl SessionId {
    pub fn from_bytes(bytes: [u8; SESSION_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_ID_LEN] {
        &self.0
    }

    /// Lowercase hex, as carried in the session header.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let mut out = [0u8; SESSION_ID_LEN];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| Error::MalformedMessage(format!("session id: {e}")))?;
        Ok(Self(out))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.to_hex())
    }
}

/// Directional keys plus session id for one handshake. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    send_key: [u8; KEY_LEN],
    recv_key: [u8; KEY_LEN],
    #[zeroize(skip)]
    session_id: SessionId,
}

impl SessionKeys {
    /// Key for traffic this party sends.
    pub fn send_key(&self) -> &[u8; KEY_LEN] {
        &self.send_key
    }

    /// Key for traffic this party receives.
    pub fn recv_key(&self) -> &[u8; KEY_LEN] {
        &self.recv_key
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

/// Derive the session key triple from a shared secret and transcript hash.
pub fn derive_session_keys(
    shared_secret: &[u8; 32],
    transcript_hash: &[u8; 32],
    role: Role,
) -> Result<SessionKeys> {
    let hk = Hkdf::<Sha256>::new(Some(transcript_hash), shared_secret);

    let expand = |label: &[u8], out: &mut [u8]| {
        hk.expand(label, out)
            .map_err(|e| Error::KeyDerivation(format!("HKDF expand error: {e}")))
    };

    let mut i2r = [0u8; KEY_LEN];
    expand(LABEL_INITIATOR_TO_RESPONDER, &mut i2r)?;

    let mut r2i = [0u8; KEY_LEN];
    expand(LABEL_RESPONDER_TO_INITIATOR, &mut r2i)?;

    let mut session_id = [0u8; SESSION_ID_LEN];
    expand(LABEL_SESSION_ID, &mut session_id)?;

    let (send_key, recv_key) = match role {
        Role::Initiator => (i2r, r2i),
        Role::Responder => (r2i, i2r),
    };
    i2r.zeroize();
    r2i.zeroize();

    Ok(SessionKeys {
        send_key,
        recv_key,
        session_id: SessionId(session_id),
    })
}
