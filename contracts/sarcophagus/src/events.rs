#![allow(deprecated)] // events().publish migration to #[contractevent] tracked separately

//! Structured event publishing for the sarcophagus contract.
//! All symbol_short! values must be ≤9 characters.

use soroban_sdk::{symbol_short, Address, Bytes, BytesN, Env, String};

use crate::types::{ProtocolConfig, Sarcophagus};

pub fn publish_initialized(env: &Env, admin: &Address, token: &Address, config: &ProtocolConfig) {
    env.events().publish(
        (symbol_short!("INIT"), admin.clone()),
        (token.clone(), config.clone()),
    );
}

// ── Archaeologists & bond ────────────────────────────────────────────────────

pub fn publish_archaeologist_registered(env: &Env, archaeologist: &Address, peer_id: &String) {
    env.events().publish(
        (symbol_short!("ARCH_REG"), archaeologist.clone()),
        peer_id.clone(),
    );
}

pub fn publish_archaeologist_updated(env: &Env, archaeologist: &Address, peer_id: &String) {
    env.events().publish(
        (symbol_short!("ARCH_UPD"), archaeologist.clone()),
        peer_id.clone(),
    );
}

pub fn publish_archaeologist_unregistered(env: &Env, archaeologist: &Address) {
    env.events()
        .publish((symbol_short!("ARCH_UNR"),), archaeologist.clone());
}

pub fn publish_free_bond_deposited(env: &Env, archaeologist: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("BOND_DEP"), archaeologist.clone()), amount);
}

pub fn publish_free_bond_withdrawn(env: &Env, archaeologist: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("BOND_WD"), archaeologist.clone()), amount);
}

pub fn publish_reward_withdrawn(env: &Env, archaeologist: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("RWD_WD"), archaeologist.clone()), amount);
}

pub fn publish_bond_slashed(
    env: &Env,
    archaeologist: &Address,
    amount: i128,
    accuser_share: i128,
    embalmer_share: i128,
) {
    env.events().publish(
        (symbol_short!("SLASHED"), archaeologist.clone()),
        (amount, accuser_share, embalmer_share),
    );
}

// ── Sarcophagus lifecycle ────────────────────────────────────────────────────

pub fn publish_sarcophagus_created(env: &Env, sarcophagus: &Sarcophagus) {
    env.events().publish(
        (symbol_short!("SARC_INIT"), sarcophagus.id.clone()),
        (
            sarcophagus.embalmer.clone(),
            sarcophagus.name.clone(),
            sarcophagus.resurrection_time,
            sarcophagus.threshold,
            sarcophagus.total_archaeologists(),
        ),
    );
}

pub fn publish_sarcophagus_finalized(env: &Env, id: &BytesN<32>, protocol_fee: i128) {
    env.events()
        .publish((symbol_short!("SARC_FIN"), id.clone()), protocol_fee);
}

pub fn publish_sarcophagus_rewrapped(
    env: &Env,
    id: &BytesN<32>,
    resurrection_time: u64,
    fees_paid: i128,
) {
    env.events().publish(
        (symbol_short!("SARC_RWRP"), id.clone()),
        (resurrection_time, fees_paid),
    );
}

pub fn publish_sarcophagus_buried(env: &Env, id: &BytesN<32>) {
    env.events().publish(
        (symbol_short!("SARC_BURY"), id.clone()),
        env.ledger().timestamp(),
    );
}

pub fn publish_sarcophagus_cancelled(env: &Env, id: &BytesN<32>, refund: i128) {
    env.events()
        .publish((symbol_short!("SARC_CNCL"), id.clone()), refund);
}

pub fn publish_key_share(env: &Env, id: &BytesN<32>, archaeologist: &Address, share: &Bytes) {
    env.events().publish(
        (symbol_short!("SHARE_PUB"), id.clone()),
        (archaeologist.clone(), share.clone()),
    );
}

pub fn publish_accused(env: &Env, id: &BytesN<32>, archaeologist: &Address, accuser: &Address) {
    env.events().publish(
        (symbol_short!("ACCUSED"), id.clone()),
        (archaeologist.clone(), accuser.clone()),
    );
}

pub fn publish_compromised(env: &Env, id: &BytesN<32>, accused_count: u32) {
    env.events()
        .publish((symbol_short!("COMPROMS"), id.clone()), accused_count);
}

pub fn publish_cleaned(env: &Env, id: &BytesN<32>, cleaner: &Address, defaulted: u32) {
    env.events().publish(
        (symbol_short!("CLEANED"), id.clone()),
        (cleaner.clone(), defaulted),
    );
}

pub fn publish_transfer_finalized(
    env: &Env,
    id: &BytesN<32>,
    outgoing: &Address,
    incoming: &Address,
    payload_ref: &String,
) {
    env.events().publish(
        (symbol_short!("TRANSFER"), id.clone()),
        (outgoing.clone(), incoming.clone(), payload_ref.clone()),
    );
}

pub fn publish_protocol_fees_withdrawn(env: &Env, admin: &Address, amount: i128) {
    env.events()
        .publish((symbol_short!("FEE_WD"), admin.clone()), amount);
}
