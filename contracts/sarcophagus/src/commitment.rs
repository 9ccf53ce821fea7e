//! Commit/reveal verification of key shares.
//!
//! An embalmer commits each archaeologist to the digest of the share it
//! holds. Revealing a share (on unwrap, or as proof of a leak) is valid only
//! when it hashes to that committed digest.

use soroban_sdk::{Bytes, BytesN, Env};

use crate::types::DigestAlgorithm;

/// Digest function applied to revealed shares.
pub trait ShareDigest {
    fn digest(env: &Env, share: &Bytes) -> BytesN<32>;
}

pub struct Keccak256Digest;

impl ShareDigest for Keccak256Digest {
    fn digest(env: &Env, share: &Bytes) -> BytesN<32> {
        env.crypto().keccak256(share).into()
    }
}

pub struct Sha256Digest;

impl ShareDigest for Sha256Digest {
    fn digest(env: &Env, share: &Bytes) -> BytesN<32> {
        env.crypto().sha256(share).into()
    }
}

pub fn verify_with<D: ShareDigest>(env: &Env, share: &Bytes, expected: &BytesN<32>) -> bool {
    D::digest(env, share) == *expected
}

pub fn digest(env: &Env, algorithm: DigestAlgorithm, share: &Bytes) -> BytesN<32> {
    match algorithm {
        DigestAlgorithm::Keccak256 => Keccak256Digest::digest(env, share),
        DigestAlgorithm::Sha256 => Sha256Digest::digest(env, share),
    }
}

/// True when `share` hashes to `expected` under the configured algorithm.
pub fn verify(env: &Env, algorithm: DigestAlgorithm, share: &Bytes, expected: &BytesN<32>) -> bool {
    match algorithm {
        DigestAlgorithm::Keccak256 => verify_with::<Keccak256Digest>(env, share, expected),
        DigestAlgorithm::Sha256 => verify_with::<Sha256Digest>(env, share, expected),
    }
}
