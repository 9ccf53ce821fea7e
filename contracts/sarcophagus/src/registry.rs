//! Sarcophagus state machine: create, finalize, rewrap, bury, cancel and
//! key share publication.
//!
//! ```text
//! Pending --finalize--> Active --bury/clean--> Done
//!    |                    |
//!    +--cancel--> Done    +--accuse (>= threshold)--> Compromised
//! ```
//!
//! `Resurrecting` and `AwaitingClean` are not stored; [`phase`] derives them
//! from the ledger clock.

use soroban_sdk::{Address, Bytes, BytesN, Env, String, Vec};

use crate::bond;
use crate::commitment;
use crate::errors::SarcophagusError;
use crate::events;
use crate::signature;
use crate::storage;
use crate::token::ValueTransfer;
use crate::types::{
    ArchaeologistSignature, ArchaeologistTerms, BuryPolicy, CursedArchaeologist, LifecyclePhase,
    ProtocolConfig, Sarcophagus, SarcophagusParams, SarcophagusState, NEVER_RESURRECT,
};

/// `sha256(name || salt)`.
pub fn derive_id(env: &Env, name: &String, salt: &BytesN<32>) -> BytesN<32> {
    let mut preimage = name.to_bytes();
    preimage.extend_from_slice(&salt.to_array());
    env.crypto().sha256(&preimage).into()
}

pub fn load_for_embalmer(
    env: &Env,
    embalmer: &Address,
    id: &BytesN<32>,
) -> Result<Sarcophagus, SarcophagusError> {
    let sarcophagus = storage::load_sarcophagus(env, id)?;
    if sarcophagus.embalmer != *embalmer {
        return Err(SarcophagusError::SenderNotEmbalmer);
    }
    Ok(sarcophagus)
}

fn sum_digging_fees(slots: &Vec<CursedArchaeologist>) -> Result<i128, SarcophagusError> {
    let mut total: i128 = 0;
    for slot in slots.iter() {
        total = total
            .checked_add(slot.digging_fee)
            .ok_or(SarcophagusError::InvalidAmount)?;
    }
    Ok(total)
}

/// Fees of the slots that have not been accused.
fn innocent_digging_fees(sarcophagus: &Sarcophagus) -> i128 {
    sarcophagus
        .archaeologists
        .iter()
        .filter(|slot| !slot.accused)
        .map(|slot| slot.digging_fee)
        .sum()
}

fn validate_terms(
    env: &Env,
    params: &SarcophagusParams,
    terms: &Vec<ArchaeologistTerms>,
) -> Result<(), SarcophagusError> {
    if terms.is_empty() {
        return Err(SarcophagusError::NoArchaeologistsProvided);
    }
    for (i, term) in terms.iter().enumerate() {
        for other in terms.iter().skip(i + 1) {
            if other.archaeologist == term.archaeologist {
                return Err(SarcophagusError::ArchaeologistListNotUnique);
            }
        }
        let profile = storage::load_active_profile(env, &term.archaeologist)?;
        if term.digging_fee < 0 {
            return Err(SarcophagusError::InvalidAmount);
        }
        if term.digging_fee < profile.minimum_digging_fee {
            return Err(SarcophagusError::DiggingFeeTooLow);
        }
        if params.maximum_rewrap_interval > profile.maximum_rewrap_interval {
            return Err(SarcophagusError::MaxRewrapIntervalExceedsArchaeologistMax);
        }
    }
    Ok(())
}

/// Records a new Pending sarcophagus and takes the embalmer's fees into escrow.
pub fn create(
    env: &Env,
    vt: &impl ValueTransfer,
    embalmer: &Address,
    params: &SarcophagusParams,
    terms: &Vec<ArchaeologistTerms>,
) -> Result<BytesN<32>, SarcophagusError> {
    let config = storage::config(env)?;
    let now = env.ledger().timestamp();

    let id = derive_id(env, &params.name, &params.salt);
    if storage::has_sarcophagus(env, &id) {
        return Err(SarcophagusError::DuplicateSarcophagusId);
    }

    validate_terms(env, params, terms)?;
    if params.threshold < 1 || params.threshold > terms.len() {
        return Err(SarcophagusError::InvalidThreshold);
    }
    if params.resurrection_time <= now {
        return Err(SarcophagusError::ResurrectionTimeInPast);
    }
    if params.resurrection_time - now > params.maximum_rewrap_interval {
        return Err(SarcophagusError::RewrapIntervalTooLarge);
    }

    let mut slots = Vec::new(env);
    for term in terms.iter() {
        slots.push_back(CursedArchaeologist::from_terms(&term));
    }
    let digging_fees = sum_digging_fees(&slots)?;
    if params.total_fee != digging_fees + config.protocol_fee(digging_fees) {
        return Err(SarcophagusError::FeeMismatch);
    }

    vt.transfer_from(embalmer, params.total_fee)?;

    let mut payload_refs = Vec::new(env);
    payload_refs.push_back(params.payload_ref.clone());

    let sarcophagus = Sarcophagus {
        id: id.clone(),
        name: params.name.clone(),
        embalmer: embalmer.clone(),
        recipient: params.recipient.clone(),
        resurrection_time: params.resurrection_time,
        previous_rewrap_time: now,
        maximum_rewrap_interval: params.maximum_rewrap_interval,
        threshold: params.threshold,
        archaeologists: slots,
        payload_refs,
        state: SarcophagusState::Pending,
        compromised: false,
        accused_count: 0,
        fee_escrow: params.total_fee,
        created_at: now,
    };
    storage::store_sarcophagus(env, &sarcophagus);
    storage::push_embalmer_sarcophagus(env, embalmer, &id);
    events::publish_sarcophagus_created(env, &sarcophagus);
    Ok(id)
}

/// Checks every archaeologist's signature over its curse terms and locks
/// each slot's digging fee from the archaeologist's free bond.
pub fn finalize(
    env: &Env,
    embalmer: &Address,
    id: &BytesN<32>,
    signatures: &Vec<ArchaeologistSignature>,
) -> Result<(), SarcophagusError> {
    let config = storage::config(env)?;
    let mut sarcophagus = load_for_embalmer(env, embalmer, id)?;
    if sarcophagus.state != SarcophagusState::Pending {
        return Err(SarcophagusError::SarcophagusNotPending);
    }
    if env.ledger().timestamp() >= sarcophagus.resurrection_time {
        return Err(SarcophagusError::ResurrectionTimeInPast);
    }
    if signatures.len() != sarcophagus.total_archaeologists() {
        return Err(SarcophagusError::SignatureMismatch);
    }

    // Nothing is locked until every slot has checked out.
    for (slot, signed) in sarcophagus.archaeologists.iter().zip(signatures.iter()) {
        if signed.archaeologist != slot.archaeologist {
            return Err(SarcophagusError::SignatureMismatch);
        }
        let profile = storage::load_active_profile(env, &slot.archaeologist)?;
        let message = signature::curse_terms_message(env, &sarcophagus, &slot);
        if !signature::is_signed_by(env, &profile.signing_key, &message, &signed.signature) {
            return Err(SarcophagusError::SignatureMismatch);
        }
        if profile.free_bond < slot.digging_fee {
            return Err(SarcophagusError::InsufficientFreeBond);
        }
    }
    for slot in sarcophagus.archaeologists.iter() {
        bond::lock(env, &slot.archaeologist, slot.digging_fee)?;
    }

    let protocol_fee = config.protocol_fee(sum_digging_fees(&sarcophagus.archaeologists)?);
    if protocol_fee > sarcophagus.fee_escrow {
        return Err(SarcophagusError::InvariantViolation);
    }
    sarcophagus.fee_escrow -= protocol_fee;
    storage::add_protocol_fees(env, protocol_fee);

    sarcophagus.state = SarcophagusState::Active;
    storage::store_sarcophagus(env, &sarcophagus);
    events::publish_sarcophagus_finalized(env, id, protocol_fee);
    Ok(())
}

/// Pushes the resurrection time out. Archaeologists still guarding the
/// sarcophagus are paid for the period that just ended and the embalmer
/// pays in advance for the next one.
pub fn rewrap(
    env: &Env,
    vt: &impl ValueTransfer,
    embalmer: &Address,
    id: &BytesN<32>,
    resurrection_time: u64,
) -> Result<(), SarcophagusError> {
    let config = storage::config(env)?;
    let now = env.ledger().timestamp();
    let mut sarcophagus = load_for_embalmer(env, embalmer, id)?;
    if sarcophagus.state != SarcophagusState::Active {
        return Err(SarcophagusError::SarcophagusNotActive);
    }
    if now >= sarcophagus.resurrection_time || resurrection_time <= now {
        return Err(SarcophagusError::ResurrectionTimeInPast);
    }
    if resurrection_time <= sarcophagus.resurrection_time {
        return Err(SarcophagusError::NewResurrectionTimeNotLater);
    }
    if resurrection_time - sarcophagus.previous_rewrap_time > sarcophagus.maximum_rewrap_interval
    {
        return Err(SarcophagusError::RewrapIntervalTooLarge);
    }

    let period_fees = innocent_digging_fees(&sarcophagus);
    if period_fees > sarcophagus.fee_escrow {
        return Err(SarcophagusError::InvariantViolation);
    }
    for slot in sarcophagus.archaeologists.iter().filter(|slot| !slot.accused) {
        bond::credit_reward(env, &slot.archaeologist, slot.digging_fee)?;
    }
    sarcophagus.fee_escrow -= period_fees;

    let protocol_fee = config.protocol_fee(period_fees);
    let charged = period_fees + protocol_fee;
    vt.transfer_from(embalmer, charged)?;
    sarcophagus.fee_escrow += period_fees;
    storage::add_protocol_fees(env, protocol_fee);

    sarcophagus.previous_rewrap_time = now;
    sarcophagus.resurrection_time = resurrection_time;
    storage::store_sarcophagus(env, &sarcophagus);
    events::publish_sarcophagus_rewrapped(env, id, resurrection_time, charged);
    Ok(())
}

/// Deadline after which burying is refused under `policy`.
fn bury_deadline(sarcophagus: &Sarcophagus, config: &ProtocolConfig) -> u64 {
    match config.bury_policy {
        BuryPolicy::BeforeResurrection => sarcophagus.resurrection_time,
        BuryPolicy::BeforeGraceExpiry => sarcophagus.grace_end(config.grace_period),
    }
}

/// Voluntarily retires an Active sarcophagus. Every slot still bonded is
/// paid its digging fee and released. Burying is not a successful
/// resurrection, so success counters stay as they are.
pub fn bury(env: &Env, embalmer: &Address, id: &BytesN<32>) -> Result<(), SarcophagusError> {
    let config = storage::config(env)?;
    let mut sarcophagus = storage::load_sarcophagus(env, id)?;
    match sarcophagus.state {
        SarcophagusState::Compromised => return Err(SarcophagusError::SarcophagusCompromised),
        SarcophagusState::Done => return Err(SarcophagusError::SarcophagusInactive),
        SarcophagusState::Pending => return Err(SarcophagusError::SarcophagusNotFinalized),
        SarcophagusState::Active => {}
    }
    if sarcophagus.embalmer != *embalmer {
        return Err(SarcophagusError::SenderNotEmbalmer);
    }
    let now = env.ledger().timestamp();
    let deadline = bury_deadline(&sarcophagus, &config);
    let past_deadline = match config.bury_policy {
        BuryPolicy::BeforeResurrection => now >= deadline,
        BuryPolicy::BeforeGraceExpiry => now > deadline,
    };
    if past_deadline {
        return Err(SarcophagusError::ResurrectionTimeInPast);
    }

    for slot in sarcophagus.archaeologists.iter().filter(|slot| slot.is_bonded()) {
        bond::release(env, &slot.archaeologist, slot.digging_fee)?;
        bond::credit_reward(env, &slot.archaeologist, slot.digging_fee)?;
        if slot.digging_fee > sarcophagus.fee_escrow {
            return Err(SarcophagusError::InvariantViolation);
        }
        sarcophagus.fee_escrow -= slot.digging_fee;
    }

    sarcophagus.resurrection_time = NEVER_RESURRECT;
    sarcophagus.state = SarcophagusState::Done;
    storage::store_sarcophagus(env, &sarcophagus);
    events::publish_sarcophagus_buried(env, id);
    Ok(())
}

/// Abandons a sarcophagus that was never finalized and refunds its escrow.
pub fn cancel(
    env: &Env,
    vt: &impl ValueTransfer,
    embalmer: &Address,
    id: &BytesN<32>,
) -> Result<i128, SarcophagusError> {
    let mut sarcophagus = load_for_embalmer(env, embalmer, id)?;
    if sarcophagus.state != SarcophagusState::Pending {
        return Err(SarcophagusError::SarcophagusNotPending);
    }
    let refund = sarcophagus.fee_escrow;
    sarcophagus.fee_escrow = 0;
    sarcophagus.resurrection_time = NEVER_RESURRECT;
    sarcophagus.state = SarcophagusState::Done;
    storage::store_sarcophagus(env, &sarcophagus);
    vt.transfer_to(embalmer, refund)?;
    events::publish_sarcophagus_cancelled(env, id, refund);
    Ok(refund)
}

/// Reveals an archaeologist's key share during the resurrection window.
pub fn publish_share(
    env: &Env,
    archaeologist: &Address,
    id: &BytesN<32>,
    share: &Bytes,
) -> Result<(), SarcophagusError> {
    let config = storage::config(env)?;
    let mut sarcophagus = storage::load_sarcophagus(env, id)?;
    let index = sarcophagus
        .position_of(archaeologist)
        .ok_or(SarcophagusError::ArchaeologistNotOnSarcophagus)?;

    let now = env.ledger().timestamp();
    if now < sarcophagus.resurrection_time {
        return Err(SarcophagusError::TooEarlyToUnwrap);
    }
    if now > sarcophagus.grace_end(config.grace_period) {
        return Err(SarcophagusError::TooLateToUnwrap);
    }
    match sarcophagus.state {
        SarcophagusState::Active => {}
        SarcophagusState::Pending => return Err(SarcophagusError::SarcophagusNotFinalized),
        _ => return Err(SarcophagusError::SarcophagusNotActive),
    }

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
    if !commitment::verify(env, config.digest, share, &slot.share_digest) {
        return Err(SarcophagusError::UnencryptedShardHashMismatch);
    }

    bond::settle_success(env, archaeologist, slot.digging_fee)?;
    if slot.digging_fee > sarcophagus.fee_escrow {
        return Err(SarcophagusError::InvariantViolation);
    }
    sarcophagus.fee_escrow -= slot.digging_fee;

    slot.published_share = Some(share.clone());
    slot.published = true;
    sarcophagus.archaeologists.set(index, slot);
    storage::store_sarcophagus(env, &sarcophagus);
    events::publish_key_share(env, id, archaeologist, share);
    Ok(())
}

/// Lifecycle phase at the current ledger time.
pub fn phase(env: &Env, sarcophagus: &Sarcophagus) -> Result<LifecyclePhase, SarcophagusError> {
    let config = storage::config(env)?;
    let now = env.ledger().timestamp();
    Ok(match sarcophagus.state {
        SarcophagusState::Pending => LifecyclePhase::Pending,
        SarcophagusState::Done => LifecyclePhase::Done,
        SarcophagusState::Compromised => LifecyclePhase::Compromised,
        SarcophagusState::Active if now < sarcophagus.resurrection_time => LifecyclePhase::Active,
        SarcophagusState::Active if now <= sarcophagus.grace_end(config.grace_period) => {
            LifecyclePhase::Resurrecting
        }
        SarcophagusState::Active => LifecyclePhase::AwaitingClean,
    })
}
