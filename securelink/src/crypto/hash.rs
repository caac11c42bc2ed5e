// SHA-256 hashing and the handshake transcript.

use sha2::{Digest, Sha256};

/// SHA-256 hash of `data`, returning a 32-byte digest.
pub fn hash_sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Append-only record of the exact wire bytes of every handshake message, in
/// the order they were sent or received.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Vec<u8>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message.
    pub fn append(&mut self, message: &[u8]) {
        self.messages.push(message.to_vec());
    }

    /// Number of messages recorded so far.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// SHA-256 over the concatenation of all recorded messages.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for message in &self.messages {
            hasher.update(message);
        }
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("") = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        let hash = hash_sha256(b"");
        assert_eq!(
            hex::encode(hash),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn transcript_order_matters() {
        let mut a = Transcript::new();
        a.append(b"init");
        a.append(b"reply");

        let mut b = Transcript::new();
        b.append(b"reply");
        b.append(b"init");

        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn transcript_hashes_concatenated_messages() {
        let init: &[u8] = br#"{"type":"init"}"#;
        let reply: &[u8] = br#"{"type":"reply"}"#;

        let mut t = Transcript::new();
        t.append(init);
        t.append(reply);

        assert_eq!(t.hash(), hash_sha256(&[init, reply].concat()));
    }

    #[test]
    fn transcript_deterministic() {
        let mut a = Transcript::new();
        let mut b = Transcript::new();
        for t in [&mut a, &mut b] {
            t.append(b"one");
            t.append(b"two");
        }
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.len(), 2);
    }
}
