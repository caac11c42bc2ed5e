// securelink benchmarks using criterion.
//
// Measures:
//   - Ed25519 sign / verify
//   - session key derivation
//   - channel encrypt / decrypt at various payload sizes
//   - full handshake latency

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use securelink::crypto::kdf::{derive_session_keys, Role};
use securelink::crypto::keys::{IdentityBundle, SigningIdentity};
use securelink::{EncryptedChannel, Initiator, Responder};

// ---------------------------------------------------------------------------
// Ed25519 sign / verify
// ---------------------------------------------------------------------------

fn bench_sign_verify(c: &mut Criterion) {
    let identity = SigningIdentity::generate();
    let message = [0x5Au8; 64];

    c.bench_function("ed25519_sign", |b| {
        b.iter(|| {
            black_box(identity.sign(black_box(&message)));
        });
    });

    let sig = identity.sign(&message);
    c.bench_function("ed25519_verify", |b| {
        b.iter(|| {
            identity
                .verify(black_box(&message), black_box(&sig))
                .unwrap();
        });
    });
}

// ---------------------------------------------------------------------------
// HKDF session keys
// ---------------------------------------------------------------------------

fn bench_kdf(c: &mut Criterion) {
    let shared = [0x42u8; 32];
    let th = [0x17u8; 32];
    c.bench_function("derive_session_keys", |b| {
        b.iter(|| {
            black_box(derive_session_keys(black_box(&shared), black_box(&th), Role::Initiator).unwrap());
        });
    });
}

// ---------------------------------------------------------------------------
// Channel encrypt / decrypt
// ---------------------------------------------------------------------------

fn channel_pair() -> (EncryptedChannel, EncryptedChannel) {
    let i = derive_session_keys(&[1u8; 32], &[2u8; 32], Role::Initiator).unwrap();
    let r = derive_session_keys(&[1u8; 32], &[2u8; 32], Role::Responder).unwrap();
    (
        EncryptedChannel::new(&i).unwrap(),
        EncryptedChannel::new(&r).unwrap(),
    )
}

fn bench_channel(c: &mut Criterion) {
    let sizes: &[usize] = &[64, 1024, 64 * 1024, 1024 * 1024];

    let mut group = c.benchmark_group("channel_encrypt");
    for &size in sizes {
        let (mut sender, _) = channel_pair();
        let plaintext = vec![0xABu8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}B")),
            &plaintext,
            |b, pt| {
                b.iter(|| {
                    black_box(sender.encrypt(black_box(pt)).unwrap());
                });
            },
        );
    }
    group.finish();

    // The receiver only accepts the next counter, so each iteration
    // decrypts on a fresh pair.
    let mut group = c.benchmark_group("channel_decrypt");
    for &size in sizes {
        let plaintext = vec![0xABu8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}B")),
            &plaintext,
            |b, pt| {
                b.iter_batched(
                    || {
                        let (mut sender, receiver) = channel_pair();
                        let frame = sender.encrypt(pt).unwrap();
                        (receiver, frame)
                    },
                    |(mut receiver, frame)| black_box(receiver.decrypt(&frame).unwrap()),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Full handshake latency
// ---------------------------------------------------------------------------

fn bench_full_handshake(c: &mut Criterion) {
    let client = Arc::new(IdentityBundle::generate());
    let server = Arc::new(IdentityBundle::generate());

    c.bench_function("full_handshake", |b| {
        b.iter(|| {
            let mut initiator = Initiator::new(Arc::clone(&client), server.public_keys());
            let mut responder =
                Responder::new(Arc::clone(&server), [client.public_keys().signing]);

            let init = initiator.create_init().unwrap();
            let reply = responder.process_init(&init).unwrap();
            initiator.process_reply(&reply).unwrap();
            let finish = initiator.create_finish().unwrap();
            responder.process_finish(&finish).unwrap();

            black_box(initiator.into_session_keys().unwrap());
            black_box(responder.into_session_keys().unwrap());
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion harness
// ---------------------------------------------------------------------------

criterion_group! {
    name = crypto_benches;
    config = Criterion::default()
        .sample_size(100)
        .measurement_time(Duration::from_secs(5));
    targets =
        bench_sign_verify,
        bench_kdf,
        bench_channel,
        bench_full_handshake
}

criterion_main!(crypto_benches);
