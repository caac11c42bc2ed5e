//! Encrypted channel -- strict in-order AES-256-GCM framing.
//!
//! One send key and one receive key for the lifetime of the channel, each
//! direction with its own 64-bit counter. The counter travels in the clear
//! but is bound into the tag as associated data.
//!
//! ```text
//! +------------+-----------+---------------+----------------+
//! | nonce(12B) | tag(16B)  | counter(8B BE)| ciphertext(N)  |
//! +------------+-----------+---------------+----------------+
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crypto::aead::{random_nonce, Aes256GcmCipher, NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::SessionKeys;
use crate::error::{Error, Result};

pub const COUNTER_LEN: usize = 8;

/// Minimum frame size: nonce + tag + counter with an empty body.
pub const HEADER_LEN: usize = NONCE_LEN + TAG_LEN + COUNTER_LEN;

/// Borrowed view of a frame's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader<'a> {
    pub nonce: &'a [u8; NONCE_LEN],
    pub tag: &'a [u8; TAG_LEN],
    pub counter: u64,
    pub ciphertext: &'a [u8],
}

impl<'a> FrameHeader<'a> {
    /// Split a frame into its fields. Fails before touching any field if the
    /// frame is shorter than [`HEADER_LEN`].
    pub fn parse(frame: &'a [u8]) -> Result<Self> {
        if frame.len() < HEADER_LEN {
            return Err(Error::MessageTooShort {
                need: HEADER_LEN,
                have: frame.len(),
            });
        }
        let (nonce, rest) = frame.split_at(NONCE_LEN);
        let (tag, rest) = rest.split_at(TAG_LEN);
        let (counter, ciphertext) = rest.split_at(COUNTER_LEN);

        let nonce = nonce.try_into().map_err(|_| short(frame))?;
        let tag = tag.try_into().map_err(|_| short(frame))?;
        let counter = u64::from_be_bytes(counter.try_into().map_err(|_| short(frame))?);

        Ok(Self {
            nonce,
            tag,
            counter,
            ciphertext,
        })
    }
}

fn short(frame: &[u8]) -> Error {
    Error::MessageTooShort {
        need: HEADER_LEN,
        have: frame.len(),
    }
}

/// Stateful encrypt/decrypt endpoint for one handshake's session keys.
///
/// A channel never outlives its handshake: build a fresh one (counters at
/// zero) after every successful handshake.
pub struct EncryptedChannel {
    sender: Aes256GcmCipher,
    receiver: Aes256GcmCipher,
    send_counter: u64,
    recv_counter: u64,
}

impl EncryptedChannel {
    pub fn new(keys: &SessionKeys) -> Result<Self> {
        Ok(Self {
            sender: Aes256GcmCipher::new(keys.send_key())?,
            receiver: Aes256GcmCipher::new(keys.recv_key())?,
            send_counter: 0,
            recv_counter: 0,
        })
    }

    /// Counter the next outbound frame will carry.
    pub fn send_counter(&self) -> u64 {
        self.send_counter
    }

    /// Counter the next inbound frame must carry.
    pub fn recv_counter(&self) -> u64 {
        self.recv_counter
    }

    /// Seal `plaintext` into a frame under a fresh random nonce.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = random_nonce();
        let counter = self.send_counter.to_be_bytes();

        let mut body = plaintext.to_vec();
        let tag = self.sender.seal(&nonce, &counter, &mut body)?;
        self.send_counter += 1;

        let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&tag);
        frame.extend_from_slice(&counter);
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Open a frame. The receive counter only advances on success.
    pub fn decrypt(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        let header = FrameHeader::parse(frame)?;

        if header.counter != self.recv_counter {
            tracing::debug!(
                expected = self.recv_counter,
                actual = header.counter,
                "rejecting out-of-order frame"
            );
            return Err(Error::CounterMismatch {
                expected: self.recv_counter,
                actual: header.counter,
            });
        }

        let mut body = header.ciphertext.to_vec();
        if let Err(err) = self.receiver.open(
            header.nonce,
            &header.counter.to_be_bytes(),
            &mut body,
            header.tag,
        ) {
            tracing::debug!(counter = header.counter, "rejecting frame with bad tag");
            return Err(err);
        }

        self.recv_counter += 1;
        Ok(body)
    }

    /// Serialize `value` as JSON and encrypt it.
    pub fn encrypt_value<T: Serialize>(&mut self, value: &T) -> Result<Vec<u8>> {
        let plaintext = serde_json::to_vec(value)
            .map_err(|e| Error::MalformedMessage(format!("encode: {e}")))?;
        self.encrypt(&plaintext)
    }

    /// Decrypt a frame and decode its JSON plaintext.
    pub fn decrypt_value<T: DeserializeOwned>(&mut self, frame: &[u8]) -> Result<T> {
        let plaintext = self.decrypt(frame)?;
        serde_json::from_slice(&plaintext).map_err(|e| Error::MalformedMessage(format!("decode: {e}")))
    }
}

impl std::fmt::Debug for EncryptedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedChannel")
            .field("send_counter", &self.send_counter)
            .field("recv_counter", &self.recv_counter)
            .finish_non_exhaustive()
    }
}
