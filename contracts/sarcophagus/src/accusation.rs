//! Accusation and clean-up of misbehaving archaeologists.
//!
//! An accusation proves a leak: the accuser reveals a share that hashes to the
//! target slot's committed digest before the resurrection window closes. A
//! clean punishes archaeologists that let the window close without publishing.

use soroban_sdk::{Address, Bytes, BytesN, Env};

use crate::bond::{self, Beneficiary};
use crate::commitment;
use crate::errors::SarcophagusError;
use crate::events;
use crate::storage;
use crate::token::ValueTransfer;
use crate::types::{Sarcophagus, SarcophagusState};

/// Marks the sarcophagus compromised once enough shares are known to have
/// leaked, and frees the bonds of everyone not accused without reward.
fn compromise_if_threshold_reached(
    env: &Env,
    vt: &impl ValueTransfer,
    sarcophagus: &mut Sarcophagus,
) -> Result<bool, SarcophagusError> {
    if sarcophagus.accused_count < sarcophagus.threshold {
        return Ok(false);
    }
    let mut refund: i128 = 0;
    for slot in sarcophagus.archaeologists.iter().filter(|slot| slot.is_bonded()) {
        bond::release(env, &slot.archaeologist, slot.digging_fee)?;
        refund += slot.digging_fee;
    }
    if refund > sarcophagus.fee_escrow {
        return Err(SarcophagusError::InvariantViolation);
    }
    sarcophagus.fee_escrow -= refund;
    vt.transfer_to(&sarcophagus.embalmer, refund)?;

    sarcophagus.compromised = true;
    sarcophagus.state = SarcophagusState::Compromised;
    events::publish_compromised(env, &sarcophagus.id, sarcophagus.accused_count);
    Ok(true)
}

/// Slashes `archaeologist` for leaking its share of sarcophagus `id`.
///
/// Returns true when the accusation pushed the sarcophagus into
/// `Compromised`.
pub fn accuse(
    env: &Env,
    vt: &impl ValueTransfer,
    accuser: &Address,
    id: &BytesN<32>,
    archaeologist: &Address,
    leaked_share: &Bytes,
) -> Result<bool, SarcophagusError> {
    let config = storage::config(env)?;
    let mut sarcophagus = storage::load_sarcophagus(env, id)?;
    match sarcophagus.state {
        SarcophagusState::Active => {}
        SarcophagusState::Compromised => return Err(SarcophagusError::SarcophagusCompromised),
        _ => return Err(SarcophagusError::SarcophagusNotActive),
    }
    if env.ledger().timestamp() > sarcophagus.grace_end(config.grace_period) {
        return Err(SarcophagusError::AccusalWindowClosed);
    }

    let index = sarcophagus
        .position_of(archaeologist)
        .ok_or(SarcophagusError::ArchaeologistNotOnSarcophagus)?;
    let mut slot = sarcophagus
        .archaeologists
        .get(index)
        .ok_or(SarcophagusError::InvariantViolation)?;
    if slot.published {
        return Err(SarcophagusError::ArchaeologistAlreadyUnwrapped);
    }
    if slot.accused {
        return Err(SarcophagusError::ArchaeologistAlreadyAccused);
    }
    if !commitment::verify(env, config.digest, leaked_share, &slot.share_digest) {
        return Err(SarcophagusError::UnencryptedShardHashMismatch);
    }

    bond::slash(
        env,
        vt,
        archaeologist,
        slot.digging_fee,
        &Beneficiary::Account(accuser.clone()),
        &sarcophagus.embalmer,
        &config.slash_policy,
    )?;
    // The embalmer gets back the fee it paid for the slot.
    if slot.digging_fee > sarcophagus.fee_escrow {
        return Err(SarcophagusError::InvariantViolation);
    }
    sarcophagus.fee_escrow -= slot.digging_fee;
    vt.transfer_to(&sarcophagus.embalmer, slot.digging_fee)?;

    slot.accused = true;
    sarcophagus.archaeologists.set(index, slot);
    sarcophagus.accused_count += 1;
    events::publish_accused(env, id, archaeologist, accuser);

    let compromised = compromise_if_threshold_reached(env, vt, &mut sarcophagus)?;
    storage::store_sarcophagus(env, &sarcophagus);
    Ok(compromised)
}

/// Who may clean at `now`, given the end of the grace period.
fn authorize_cleaner(
    env: &Env,
    caller: &Address,
    sarcophagus: &Sarcophagus,
    grace_end: u64,
    expiration_threshold: u64,
) -> Result<Beneficiary, SarcophagusError> {
    let now = env.ledger().timestamp();
    if now <= grace_end {
        return Err(SarcophagusError::TooEarlyToClean);
    }
    let admin = storage::admin(env)?;
    if now <= grace_end.saturating_add(expiration_threshold) {
        if *caller != sarcophagus.embalmer {
            return Err(SarcophagusError::SenderNotAuthorizedToClean);
        }
        Ok(Beneficiary::Account(sarcophagus.embalmer.clone()))
    } else {
        if *caller != admin {
            return Err(SarcophagusError::SenderNotAuthorizedToClean);
        }
        Ok(Beneficiary::ProtocolTreasury)
    }
}

/// Slashes every archaeologist that neither published nor was accused by
/// the end of the grace period and closes the sarcophagus.
///
/// Returns the number of defaulting archaeologists.
pub fn clean(
    env: &Env,
    vt: &impl ValueTransfer,
    caller: &Address,
    id: &BytesN<32>,
) -> Result<u32, SarcophagusError> {
    let config = storage::config(env)?;
    let mut sarcophagus = storage::load_sarcophagus(env, id)?;
    match sarcophagus.state {
        SarcophagusState::Active => {}
        SarcophagusState::Pending => return Err(SarcophagusError::SarcophagusNotFinalized),
        SarcophagusState::Compromised => return Err(SarcophagusError::SarcophagusCompromised),
        SarcophagusState::Done => return Err(SarcophagusError::SarcophagusInactive),
    }
    let grace_end = sarcophagus.grace_end(config.grace_period);
    let cleaner = authorize_cleaner(
        env,
        caller,
        &sarcophagus,
        grace_end,
        config.expiration_threshold,
    )?;

    let mut defaulted: u32 = 0;
    let mut refund: i128 = 0;
    for index in 0..sarcophagus.total_archaeologists() {
        let mut slot = sarcophagus
            .archaeologists
            .get(index)
            .ok_or(SarcophagusError::InvariantViolation)?;
        if !slot.is_bonded() {
            continue;
        }
        bond::slash(
            env,
            vt,
            &slot.archaeologist,
            slot.digging_fee,
            &cleaner,
            &sarcophagus.embalmer,
            &config.slash_policy,
        )?;
        refund += slot.digging_fee;
        slot.accused = true;
        sarcophagus.archaeologists.set(index, slot);
        defaulted += 1;
    }

    if refund > sarcophagus.fee_escrow {
        return Err(SarcophagusError::InvariantViolation);
    }
    sarcophagus.fee_escrow -= refund;
    vt.transfer_to(&sarcophagus.embalmer, refund)?;

    sarcophagus.accused_count += defaulted;
    if sarcophagus.accused_count >= sarcophagus.threshold {
        sarcophagus.compromised = true;
        sarcophagus.state = SarcophagusState::Compromised;
        events::publish_compromised(env, id, sarcophagus.accused_count);
    } else {
        sarcophagus.state = SarcophagusState::Done;
    }
    storage::store_sarcophagus(env, &sarcophagus);
    events::publish_cleaned(env, id, caller, defaulted);
    Ok(defaulted)
}
