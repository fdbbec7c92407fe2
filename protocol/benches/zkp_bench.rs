// Schnorr proof benchmarks over the 2048-bit MODP group.
//
// Covers key generation, interactive prove/verify, the Fiat-Shamir variant,
// and the full public-key subgroup check, which costs one extra 2048-bit
// modexp and dominates credential registration.

use criterion::{criterion_group, criterion_main, Criterion};

use scholarship_zkp::crypto::hash_to_integer;
use scholarship_zkp::crypto::HashInput;
use scholarship_zkp::{DomainParameters, KeyManager, SchnorrEngine};

fn bench_keygen(c: &mut Criterion) {
    let manager = KeyManager::new(DomainParameters::standard());
    c.bench_function("zkp/keygen", |b| b.iter(|| manager.generate_key_pair()));
}

fn bench_validate_public_key(c: &mut Criterion) {
    let manager = KeyManager::new(DomainParameters::standard());
    let pair = manager.generate_key_pair();
    c.bench_function("zkp/validate_public_key", |b| {
        b.iter(|| manager.validate_public_key(pair.public_key()))
    });
}

fn bench_interactive_prove(c: &mut Criterion) {
    let params = DomainParameters::standard();
    let manager = KeyManager::new(params.clone());
    let engine = SchnorrEngine::new(params);
    let pair = manager.generate_key_pair();
    let challenge = engine.generate_challenge();

    c.bench_function("zkp/interactive_prove", |b| {
        b.iter(|| engine.create_proof(pair.private_key(), &challenge))
    });
}

fn bench_interactive_verify(c: &mut Criterion) {
    let params = DomainParameters::standard();
    let manager = KeyManager::new(params.clone());
    let engine = SchnorrEngine::new(params);
    let pair = manager.generate_key_pair();
    let challenge = engine.generate_challenge();
    let proof = engine.create_proof(pair.private_key(), &challenge);

    c.bench_function("zkp/interactive_verify", |b| {
        b.iter(|| engine.verify_complete_proof(&proof, &challenge, pair.public_key()))
    });
}

fn bench_non_interactive(c: &mut Criterion) {
    let params = DomainParameters::standard();
    let manager = KeyManager::new(params.clone());
    let engine = SchnorrEngine::new(params);
    let pair = manager.generate_key_pair();
    let proof =
        engine.create_non_interactive_proof(pair.private_key(), pair.public_key(), "bench");

    c.bench_function("zkp/fiat_shamir_prove", |b| {
        b.iter(|| {
            engine.create_non_interactive_proof(pair.private_key(), pair.public_key(), "bench")
        })
    });
    c.bench_function("zkp/fiat_shamir_verify", |b| {
        b.iter(|| engine.verify_non_interactive_proof(&proof, pair.public_key(), "bench"))
    });
}

fn bench_hash_to_integer(c: &mut Criterion) {
    let params = DomainParameters::standard();
    c.bench_function("zkp/hash_to_integer", |b| {
        b.iter(|| {
            hash_to_integer(&[
                HashInput::Integer(params.g()),
                HashInput::Integer(params.p()),
                HashInput::Text("scholarship"),
            ])
        })
    });
}

criterion_group!(
    benches,
    bench_keygen,
    bench_validate_public_key,
    bench_interactive_prove,
    bench_interactive_verify,
    bench_non_interactive,
    bench_hash_to_integer,
);
criterion_main!(benches);
