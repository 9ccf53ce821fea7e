//! Canonical messages archaeologists sign off-chain, and their verification.
//!
//! Layout of the curse terms message (big-endian integers):
//! ```text
//! "SARC_CURSE" || sarcophagus_id (32) || share_digest (32)
//!   || digging_fee (i128, 16) || maximum_rewrap_interval (u64, 8)
//!   || resurrection_time (u64, 8)
//! ```
//! The transfer message is
//! `"SARC_XFER" || sarcophagus_id (32) || xdr(outgoing) || payload_ref`.
//!
//! Signatures are recoverable secp256k1 signatures over the keccak256 digest
//! of the message, encoded as `r (32) || s (32) || v (1)`. `v` is the
//! recovery id, either raw (0..=3) or with the legacy offset of 27.

use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{Address, Bytes, BytesN, Env, String};

use crate::types::{CursedArchaeologist, Sarcophagus};

const CURSE_DOMAIN: &[u8] = b"SARC_CURSE";
const TRANSFER_DOMAIN: &[u8] = b"SARC_XFER";

/// Offset some signers add to the recovery id.
const LEGACY_RECOVERY_OFFSET: u8 = 27;

/// Half of the secp256k1 group order. Signatures with a larger `s` are
/// malleable and rejected.
const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// The secp256k1 group order.
const ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

pub fn curse_terms_message(
    env: &Env,
    sarcophagus: &Sarcophagus,
    slot: &CursedArchaeologist,
) -> Bytes {
    let mut message = Bytes::from_slice(env, CURSE_DOMAIN);
    message.extend_from_slice(&sarcophagus.id.to_array());
    message.extend_from_slice(&slot.share_digest.to_array());
    message.extend_from_slice(&slot.digging_fee.to_be_bytes());
    message.extend_from_slice(&sarcophagus.maximum_rewrap_interval.to_be_bytes());
    message.extend_from_slice(&sarcophagus.resurrection_time.to_be_bytes());
    message
}

pub fn transfer_message(
    env: &Env,
    sarcophagus_id: &BytesN<32>,
    outgoing: &Address,
    payload_ref: &String,
) -> Bytes {
    let mut message = Bytes::from_slice(env, TRANSFER_DOMAIN);
    message.extend_from_slice(&sarcophagus_id.to_array());
    message.append(&outgoing.clone().to_xdr(env));
    message.append(&payload_ref.to_bytes());
    message
}

/// Digest that is actually signed.
pub fn signing_digest(env: &Env, message: &Bytes) -> BytesN<32> {
    env.crypto().keccak256(message).into()
}

/// Splits `r || s || v` into the compact signature and a raw recovery id.
///
/// Returns `None` for encodings the host would refuse to recover from, so
/// that a bad signature surfaces as a contract error instead of a trap.
fn split(signature: &BytesN<65>) -> Option<([u8; 64], u32)> {
    let raw = signature.to_array();
    let mut compact = [0u8; 64];
    compact.copy_from_slice(&raw[..64]);

    let recovery_id = match raw[64] {
        v @ 0..=3 => v,
        v if (LEGACY_RECOVERY_OFFSET..LEGACY_RECOVERY_OFFSET + 4).contains(&v) => {
            v - LEGACY_RECOVERY_OFFSET
        }
        _ => return None,
    };

    let (r, s) = compact.split_at(32);
    let zero = [0u8; 32];
    if r == &zero[..] || s == &zero[..] || r >= &ORDER[..] || s > &HALF_ORDER[..] {
        return None;
    }
    Some((compact, recovery_id as u32))
}

/// Recovers the uncompressed public key that produced `signature` over
/// `message`.
pub fn recover(env: &Env, message: &Bytes, signature: &BytesN<65>) -> Option<BytesN<65>> {
    let (compact, recovery_id) = split(signature)?;
    let digest = env.crypto().keccak256(message);
    Some(env.crypto().secp256k1_recover(
        &digest,
        &BytesN::from_array(env, &compact),
        recovery_id,
    ))
}

/// True when `signature` over `message` recovers to `signing_key`.
pub fn is_signed_by(
    env: &Env,
    signing_key: &BytesN<65>,
    message: &Bytes,
    signature: &BytesN<65>,
) -> bool {
    recover(env, message, signature).is_some_and(|key| key == *signing_key)
}
