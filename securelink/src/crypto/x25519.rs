// X25519 ephemeral key exchange for one handshake.

use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// An X25519 ephemeral keypair for one handshake.
///
/// The secret half is consumed by [`EphemeralKeyPair::diffie_hellman`], so a
/// keypair can contribute to at most one shared secret.
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a new random ephemeral keypair.
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Perform Diffie-Hellman with a peer's public key, returning the 32-byte
    /// shared secret. Rejects low-order peer points.
    pub fn diffie_hellman(self, peer_public: &[u8; 32]) -> Result<Zeroizing<[u8; 32]>> {
        let peer_pk = PublicKey::from(*peer_public);
        let shared = self.secret.diffie_hellman(&peer_pk);
        if !shared.was_contributory() {
            return Err(Error::InvalidKey(
                "peer ephemeral key is a low-order point".into(),
            ));
        }
        Ok(Zeroizing::new(*shared.as_bytes()))
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}
