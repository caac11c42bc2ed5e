// Integration tests for the securelink crypto layer.

use securelink::crypto::aead::Aes256GcmCipher;
use securelink::crypto::hash::{hash_sha256, Transcript};
use securelink::crypto::kdf::{derive_session_keys, Role};
use securelink::crypto::keys::{verify_signature, IdentityBundle, SigningIdentity};
use securelink::crypto::x25519::EphemeralKeyPair;
use securelink::Error;

// ── Ed25519 key generation and signing ───────────────────────────────────

#[test]
fn keypair_generate_unique() {
    let kp1 = SigningIdentity::generate();
    let kp2 = SigningIdentity::generate();
    assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
}

#[test]
fn verify_with_raw_pubkey() {
    let kp = SigningIdentity::generate();
    let msg = b"verify_signature standalone";
    let sig = kp.sign(msg);
    verify_signature(&kp.public_key_bytes(), msg, &sig).expect("valid signature");
}

#[test]
fn wrong_key_rejects() {
    let kp1 = SigningIdentity::generate();
    let kp2 = SigningIdentity::generate();
    let sig = kp1.sign(b"cross-key test");
    assert!(matches!(
        kp2.verify(b"cross-key test", &sig),
        Err(Error::Authentication(_))
    ));
}

#[test]
fn bundle_public_keys_match_identity() {
    let bundle = IdentityBundle::generate();
    let peer = bundle.public_keys();
    assert_eq!(peer.signing.to_bytes(), bundle.signing.public_key_bytes());
    assert_eq!(peer.exchange, bundle.exchange.public_key_bytes());
}

// ── X25519 Diffie-Hellman ────────────────────────────────────────────────

#[test]
fn dh_different_peers_differ() {
    let bob = EphemeralKeyPair::generate();
    let carol = EphemeralKeyPair::generate();
    let ab = EphemeralKeyPair::generate()
        .diffie_hellman(&bob.public_key_bytes())
        .unwrap();
    let ac = EphemeralKeyPair::generate()
        .diffie_hellman(&carol.public_key_bytes())
        .unwrap();
    assert_ne!(*ab, *ac);
}

// ── Session key derivation ───────────────────────────────────────────────

#[test]
fn session_key_derivation_deterministic() {
    let shared = [0x42u8; 32];
    let th = [0x17u8; 32];
    let k1 = derive_session_keys(&shared, &th, Role::Initiator).unwrap();
    let k2 = derive_session_keys(&shared, &th, Role::Initiator).unwrap();
    assert_eq!(k1.send_key(), k2.send_key());
    assert_eq!(k1.recv_key(), k2.recv_key());
    assert_eq!(k1.session_id(), k2.session_id());
}

#[test]
fn every_input_byte_changes_every_output() {
    let shared = [0x42u8; 32];
    let th = [0x17u8; 32];
    let base = derive_session_keys(&shared, &th, Role::Initiator).unwrap();

    for i in 0..32 {
        let mut s = shared;
        s[i] ^= 0x01;
        let k = derive_session_keys(&s, &th, Role::Initiator).unwrap();
        assert_ne!(k.send_key(), base.send_key(), "secret byte {i}");
        assert_ne!(k.recv_key(), base.recv_key(), "secret byte {i}");
        assert_ne!(k.session_id(), base.session_id(), "secret byte {i}");

        let mut t = th;
        t[i] ^= 0x01;
        let k = derive_session_keys(&shared, &t, Role::Initiator).unwrap();
        assert_ne!(k.send_key(), base.send_key(), "transcript byte {i}");
        assert_ne!(k.recv_key(), base.recv_key(), "transcript byte {i}");
        assert_ne!(k.session_id(), base.session_id(), "transcript byte {i}");
    }
}

#[test]
fn session_id_is_sixteen_bytes() {
    let k = derive_session_keys(&[1u8; 32], &[2u8; 32], Role::Responder).unwrap();
    assert_eq!(k.session_id().as_bytes().len(), 16);
    assert_eq!(k.session_id().to_hex().len(), 32);
}

// ── AEAD ─────────────────────────────────────────────────────────────────

#[test]
fn aead_wrong_nonce_fails() {
    let cipher = Aes256GcmCipher::new(&[0x33u8; 32]).unwrap();
    let mut buf = b"data".to_vec();
    let tag = cipher.seal(&[0u8; 12], b"", &mut buf).unwrap();
    assert!(matches!(
        cipher.open(&[1u8; 12], b"", &mut buf, &tag),
        Err(Error::TagMismatch)
    ));
}

// ── Hashing ──────────────────────────────────────────────────────────────

#[test]
fn sha256_known_abc() {
    assert_eq!(
        hex::encode(hash_sha256(b"abc")),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn transcript_changes_with_extra_message() {
    let mut t = Transcript::new();
    t.append(b"init");
    let h1 = t.hash();
    t.append(b"reply");
    assert_ne!(h1, t.hash());
}

#[test]
fn transcript_hash_is_sha256_of_concatenated_messages() {
    let init: &[u8] = br#"{"type":"init"}"#;
    let reply: &[u8] = br#"{"type":"reply"}"#;
    let mut t = Transcript::new();
    t.append(init);
    t.append(reply);
    assert_eq!(t.hash(), hash_sha256(&[init, reply].concat()));
}
