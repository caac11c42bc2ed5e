// Long-term identity material: Ed25519 signing keys, X25519 exchange keys,
// and the peer's pre-provisioned public keys.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{Error, Result};

/// An Ed25519 keypair used to sign handshake transcript fragments.
#[derive(Debug)]
pub struct SigningIdentity {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl SigningIdentity {
    /// Generate a fresh random Ed25519 keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Reconstruct from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// The 32-byte Ed25519 public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The 32-byte secret key seed.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Short hex fingerprint of the public key, safe to log.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.verifying_key)
    }

    /// Sign arbitrary data.
    pub fn sign(&self, data: &[u8]) -> [u8; 64] {
        let sig: Signature = self.signing_key.sign(data);
        sig.to_bytes()
    }

    /// Verify a signature against this identity's public key.
    pub fn verify(&self, data: &[u8], signature: &[u8; 64]) -> Result<()> {
        verify_with(&self.verifying_key, data, signature)
    }
}

/// Long-term X25519 keypair. Carried alongside the signing identity; session
/// secrets come from the per-handshake ephemeral keys, never from this one.
pub struct ExchangeIdentity {
    secret: StaticSecret,
    public: PublicKey,
}

impl ExchangeIdentity {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Create from existing secret bytes.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }
}

impl std::fmt::Debug for ExchangeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeIdentity")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

/// The local party's long-term keys.
#[derive(Debug)]
pub struct IdentityBundle {
    pub signing: SigningIdentity,
    pub exchange: ExchangeIdentity,
}

impl IdentityBundle {
    pub fn new(signing: SigningIdentity, exchange: ExchangeIdentity) -> Self {
        Self { signing, exchange }
    }

    pub fn generate() -> Self {
        Self::new(SigningIdentity::generate(), ExchangeIdentity::generate())
    }

    /// Public half of this bundle, as a peer would provision it.
    pub fn public_keys(&self) -> PeerKeys {
        PeerKeys {
            signing: *self.signing.verifying_key(),
            exchange: self.exchange.public_key_bytes(),
        }
    }
}

/// A peer's long-term public keys, provisioned out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerKeys {
    pub signing: VerifyingKey,
    pub exchange: [u8; 32],
}

impl PeerKeys {
    /// Build from raw key bytes, rejecting an invalid Ed25519 point.
    pub fn from_bytes(signing: &[u8; 32], exchange: [u8; 32]) -> Result<Self> {
        let signing =
            VerifyingKey::from_bytes(signing).map_err(|e| Error::InvalidKey(format!("{e}")))?;
        Ok(Self { signing, exchange })
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.signing)
    }
}

/// Verify a signature given raw public key bytes, message, and signature bytes.
pub fn verify_signature(
    pubkey_bytes: &[u8; 32],
    message: &[u8],
    signature: &[u8; 64],
) -> Result<()> {
    let vk = VerifyingKey::from_bytes(pubkey_bytes)
        .map_err(|e| Error::InvalidKey(format!("{e}")))?;
    verify_with(&vk, message, signature)
}

pub(crate) fn verify_with(vk: &VerifyingKey, message: &[u8], signature: &[u8; 64]) -> Result<()> {
    let sig = Signature::from_bytes(signature);
    vk.verify_strict(message, &sig)
        .map_err(|_| Error::Authentication("signature verification failed".into()))
}

/// First 8 bytes of SHA-256(public key), hex encoded.
pub fn fingerprint(pubkey: &VerifyingKey) -> String {
    let hash = Sha256::digest(pubkey.as_bytes());
    hex::encode(&hash[..8])
}
