//! Storage keys and typed accessors.
//!
//! Configuration lives in instance storage; profiles, sarcophagi and the
//! archaeologist enumeration live in persistent storage, keyed by
//! `(Symbol, subject)` tuples.

use soroban_sdk::{symbol_short, Address, BytesN, Env, Symbol, Vec};

use crate::errors::SarcophagusError;
use crate::types::{ArchaeologistProfile, ProtocolConfig, Sarcophagus};

const ADMIN: Symbol = symbol_short!("ADMIN");
const INITIALIZED: Symbol = symbol_short!("INIT");
const TOKEN: Symbol = symbol_short!("TOKEN");
const CONFIG: Symbol = symbol_short!("CONFIG");
const PROTOCOL_FEES: Symbol = symbol_short!("PROT_FEE");
const ARCH_COUNT: Symbol = symbol_short!("ARCH_CNT");

const ARCH_KEY: Symbol = symbol_short!("ARCH");
const ARCH_INDEX: Symbol = symbol_short!("ARCH_IDX");
const SARC_KEY: Symbol = symbol_short!("SARC");
const EMBALMER_KEY: Symbol = symbol_short!("EMB_SARC");

const TTL_THRESHOLD: u32 = 5_184_000;
const TTL_EXTEND_TO: u32 = 10_368_000;

fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

// ── Instance ─────────────────────────────────────────────────────────────────

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&INITIALIZED)
}

pub fn init(env: &Env, admin: &Address, token: &Address, config: &ProtocolConfig) {
    env.storage().instance().set(&ADMIN, admin);
    env.storage().instance().set(&TOKEN, token);
    env.storage().instance().set(&CONFIG, config);
    env.storage().instance().set(&PROTOCOL_FEES, &0i128);
    env.storage().instance().set(&INITIALIZED, &true);
    extend_instance_ttl(env);
}

pub fn admin(env: &Env) -> Result<Address, SarcophagusError> {
    env.storage()
        .instance()
        .get(&ADMIN)
        .ok_or(SarcophagusError::NotInitialized)
}

pub fn token(env: &Env) -> Result<Address, SarcophagusError> {
    env.storage()
        .instance()
        .get(&TOKEN)
        .ok_or(SarcophagusError::NotInitialized)
}

pub fn config(env: &Env) -> Result<ProtocolConfig, SarcophagusError> {
    env.storage()
        .instance()
        .get(&CONFIG)
        .ok_or(SarcophagusError::NotInitialized)
}

pub fn protocol_fees(env: &Env) -> i128 {
    env.storage().instance().get(&PROTOCOL_FEES).unwrap_or(0)
}

pub fn set_protocol_fees(env: &Env, amount: i128) {
    env.storage().instance().set(&PROTOCOL_FEES, &amount);
    extend_instance_ttl(env);
}

pub fn add_protocol_fees(env: &Env, amount: i128) {
    set_protocol_fees(env, protocol_fees(env) + amount);
}

// ── Archaeologists ───────────────────────────────────────────────────────────

fn profile_key(archaeologist: &Address) -> (Symbol, Address) {
    (ARCH_KEY, archaeologist.clone())
}

pub fn load_profile(env: &Env, archaeologist: &Address) -> Option<ArchaeologistProfile> {
    env.storage().persistent().get(&profile_key(archaeologist))
}

/// Profile of a currently registered archaeologist.
pub fn load_active_profile(
    env: &Env,
    archaeologist: &Address,
) -> Result<ArchaeologistProfile, SarcophagusError> {
    match load_profile(env, archaeologist) {
        Some(profile) if profile.exists => Ok(profile),
        _ => Err(SarcophagusError::ArchaeologistProfileNotFound),
    }
}

pub fn store_profile(env: &Env, archaeologist: &Address, profile: &ArchaeologistProfile) {
    let key = profile_key(archaeologist);
    env.storage().persistent().set(&key, profile);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn archaeologist_count(env: &Env) -> u32 {
    env.storage().instance().get(&ARCH_COUNT).unwrap_or(0)
}

pub fn archaeologist_at(env: &Env, index: u32) -> Option<Address> {
    env.storage().persistent().get(&(ARCH_INDEX, index))
}

/// Appends to the enumeration of every address that ever registered.
pub fn push_archaeologist(env: &Env, archaeologist: &Address) {
    let index = archaeologist_count(env);
    let key = (ARCH_INDEX, index);
    env.storage().persistent().set(&key, archaeologist);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    env.storage().instance().set(&ARCH_COUNT, &(index + 1));
    extend_instance_ttl(env);
}

// ── Sarcophagi ───────────────────────────────────────────────────────────────

fn sarcophagus_key(id: &BytesN<32>) -> (Symbol, BytesN<32>) {
    (SARC_KEY, id.clone())
}

pub fn has_sarcophagus(env: &Env, id: &BytesN<32>) -> bool {
    env.storage().persistent().has(&sarcophagus_key(id))
}

pub fn load_sarcophagus(env: &Env, id: &BytesN<32>) -> Result<Sarcophagus, SarcophagusError> {
    env.storage()
        .persistent()
        .get(&sarcophagus_key(id))
        .ok_or(SarcophagusError::SarcophagusDoesNotExist)
}

pub fn store_sarcophagus(env: &Env, sarcophagus: &Sarcophagus) {
    let key = sarcophagus_key(&sarcophagus.id);
    env.storage().persistent().set(&key, sarcophagus);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn embalmer_sarcophagi(env: &Env, embalmer: &Address) -> Vec<BytesN<32>> {
    env.storage()
        .persistent()
        .get(&(EMBALMER_KEY, embalmer.clone()))
        .unwrap_or(Vec::new(env))
}

pub fn push_embalmer_sarcophagus(env: &Env, embalmer: &Address, id: &BytesN<32>) {
    let key = (EMBALMER_KEY, embalmer.clone());
    let mut ids = embalmer_sarcophagi(env, embalmer);
    ids.push_back(id.clone());
    env.storage().persistent().set(&key, &ids);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}
