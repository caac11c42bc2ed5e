// Proxy request/response envelopes: the plaintext of every channel frame
// after the handshake.
//
// The payload is opaque to this crate; only the envelope fields (kind, id,
// timestamp, outcome) are interpreted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Result carried by a response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { data: Value },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProxyMessage {
    Request {
        id: Uuid,
        timestamp: DateTime<Utc>,
        payload: Value,
    },
    Response {
        /// Id of the request this answers.
        id: Uuid,
        timestamp: DateTime<Utc>,
        outcome: Outcome,
    },
}

impl ProxyMessage {
    /// A new request with a fresh v4 id and the current time.
    pub fn request(payload: Value) -> Self {
        ProxyMessage::Request {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// A response to the request with `id`.
    pub fn reply_to(id: Uuid, outcome: Outcome) -> Self {
        ProxyMessage::Response {
            id,
            timestamp: Utc::now(),
            outcome,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ProxyMessage::Request { id, .. } | ProxyMessage::Response { id, .. } => *id,
        }
    }

    /// Unwrap a response to the request `expected_id`, surfacing a peer
    /// failure as [`Error::Remote`].
    pub fn into_response(self, expected_id: Uuid) -> Result<Value> {
        match self {
            ProxyMessage::Response { id, outcome, .. } => {
                if id != expected_id {
                    return Err(Error::MalformedMessage(format!(
                        "response id {id} does not match request {expected_id}"
                    )));
                }
                match outcome {
                    Outcome::Ok { data } => Ok(data),
                    Outcome::Error { message } => Err(Error::Remote(message)),
                }
            }
            ProxyMessage::Request { .. } => Err(Error::MalformedMessage(
                "expected response envelope, got request".into(),
            )),
        }
    }
}
