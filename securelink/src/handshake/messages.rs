// Handshake messages exchanged during the three-message securelink handshake.
//
// Messages travel as JSON objects tagged by "type"; binary fields are
// standard base64. The exact serialized bytes of each message feed the
// transcript hash, so a message is serialized once and those bytes are what
// both the transcript and the transport see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Wire protocol version carried by every handshake message.
pub const PROTOCOL_VERSION: u16 = 1;

/// Length of the per-party handshake nonce.
pub const HANDSHAKE_NONCE_LEN: usize = 32;

/// Status marker carried by the finish proof.
pub const READY_STATUS: &str = "ready";

/// Message 1: Initiator -> Responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitMessage {
    pub version: u16,
    /// Initiator's long-term Ed25519 public key.
    #[serde(with = "b64_array")]
    pub signing_public_key: [u8; 32],
    /// Initiator's ephemeral X25519 public key.
    #[serde(with = "b64_array")]
    pub ephemeral_public_key: [u8; 32],
    #[serde(with = "b64_array")]
    pub nonce: [u8; HANDSHAKE_NONCE_LEN],
    /// Signature over `ephemeral_public_key || nonce`.
    #[serde(with = "b64_array")]
    pub signature: [u8; 64],
}

/// Message 2: Responder -> Initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub version: u16,
    /// Responder's ephemeral X25519 public key.
    #[serde(with = "b64_array")]
    pub ephemeral_public_key: [u8; 32],
    #[serde(with = "b64_array")]
    pub nonce: [u8; HANDSHAKE_NONCE_LEN],
    /// Signature over `ephemeral_public_key || nonce || initiator nonce`.
    #[serde(with = "b64_array")]
    pub signature: [u8; 64],
}

/// Message 3: Initiator -> Responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishMessage {
    pub version: u16,
    /// A channel frame carrying an encrypted [`ReadyProof`].
    #[serde(with = "b64_vec")]
    pub proof: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandshakeMessage {
    Init(InitMessage),
    Reply(ReplyMessage),
    Finish(FinishMessage),
}

impl HandshakeMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            HandshakeMessage::Init(_) => "init",
            HandshakeMessage::Reply(_) => "reply",
            HandshakeMessage::Finish(_) => "finish",
        }
    }

    fn version(&self) -> u16 {
        match self {
            HandshakeMessage::Init(m) => m.version,
            HandshakeMessage::Reply(m) => m.version,
            HandshakeMessage::Finish(m) => m.version,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::MalformedMessage(format!("encode: {e}")))
    }

    /// Decode and check the protocol version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let msg: Self = serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedMessage(format!("decode handshake message: {e}")))?;
        if msg.version() != PROTOCOL_VERSION {
            return Err(Error::UnsupportedVersion(msg.version()));
        }
        Ok(msg)
    }

    pub fn into_init(self) -> Result<InitMessage> {
        match self {
            HandshakeMessage::Init(m) => Ok(m),
            other => Err(unexpected("init", &other)),
        }
    }

    pub fn into_reply(self) -> Result<ReplyMessage> {
        match self {
            HandshakeMessage::Reply(m) => Ok(m),
            other => Err(unexpected("reply", &other)),
        }
    }

    pub fn into_finish(self) -> Result<FinishMessage> {
        match self {
            HandshakeMessage::Finish(m) => Ok(m),
            other => Err(unexpected("finish", &other)),
        }
    }
}

fn unexpected(expected: &str, got: &HandshakeMessage) -> Error {
    Error::MalformedMessage(format!("expected {expected} message, got {}", got.kind()))
}

/// Plaintext of the finish proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyProof {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl ReadyProof {
    pub fn now() -> Self {
        Self {
            status: READY_STATUS.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == READY_STATUS
    }
}

/// Optional JSON body of a rejected handshake request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeFailure {
    pub error: String,
}

/// Signed bytes for the init message: `ephemeral_public_key || nonce_i`.
pub fn init_signed_bytes(ephemeral_public_key: &[u8; 32], nonce_i: &[u8; 32]) -> Vec<u8> {
    [ephemeral_public_key.as_slice(), nonce_i.as_slice()].concat()
}

/// Signed bytes for the reply message: `ephemeral_public_key || nonce_r || nonce_i`.
pub fn reply_signed_bytes(
    ephemeral_public_key: &[u8; 32],
    nonce_r: &[u8; 32],
    nonce_i: &[u8; 32],
) -> Vec<u8> {
    [
        ephemeral_public_key.as_slice(),
        nonce_r.as_slice(),
        nonce_i.as_slice(),
    ]
    .concat()
}

mod b64_array {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        s: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        d: D,
    ) -> std::result::Result<[u8; N], D::Error> {
        let encoded = String::deserialize(d)?;
        let raw = STANDARD.decode(encoded).map_err(D::Error::custom)?;
        let len = raw.len();
        raw.try_into()
            .map_err(|_| D::Error::custom(format!("expected {N} bytes, got {len}")))
    }
}

mod b64_vec {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}
