//! Hand-over of a slot from one archaeologist to another.
//!
//! The outgoing archaeologist authorises the hand-over off-chain by signing
//! its own address and the new payload reference; the incoming archaeologist
//! submits it and takes over the slot's bond and terms. A payload reference
//! already recorded on the sarcophagus cannot be handed over again.

use soroban_sdk::{Address, BytesN, Env, String};

use crate::bond;
use crate::errors::SarcophagusError;
use crate::events;
use crate::signature;
use crate::storage;
use crate::types::SarcophagusState;

pub fn finalize_transfer(
    env: &Env,
    incoming: &Address,
    id: &BytesN<32>,
    outgoing: &Address,
    payload_ref: &String,
    outgoing_signature: &BytesN<65>,
) -> Result<(), SarcophagusError> {
    let mut sarcophagus = storage::load_sarcophagus(env, id)?;
    match sarcophagus.state {
        SarcophagusState::Active => {}
        SarcophagusState::Pending => return Err(SarcophagusError::SarcophagusNotFinalized),
        _ => return Err(SarcophagusError::SarcophagusNotActive),
    }
    if env.ledger().timestamp() >= sarcophagus.resurrection_time {
        return Err(SarcophagusError::ResurrectionTimeInPast);
    }

    let index = sarcophagus
        .position_of(outgoing)
        .ok_or(SarcophagusError::SignerNotArchaeologistOnSarcophagus)?;
    let mut slot = sarcophagus
        .archaeologists
        .get(index)
        .ok_or(SarcophagusError::InvariantViolation)?;
    if slot.accused {
        return Err(SarcophagusError::ArchaeologistAlreadyAccused);
    }

    let outgoing_profile = storage::load_profile(env, outgoing)
        .ok_or(SarcophagusError::ArchaeologistProfileNotFound)?;
    let message = signature::transfer_message(env, id, outgoing, payload_ref);
    let signed =
        signature::is_signed_by(env, &outgoing_profile.signing_key, &message, outgoing_signature);
    if !signed {
        return Err(SarcophagusError::SignerNotArchaeologistOnSarcophagus);
    }
    // A hand-over signature is good for one payload only.
    if sarcophagus.payload_refs.contains(payload_ref) {
        return Err(SarcophagusError::PayloadRefAlreadyUsed);
    }

    let incoming_profile = storage::load_active_profile(env, incoming)?;
    if sarcophagus.position_of(incoming).is_some() {
        return Err(SarcophagusError::ArchaeologistAlreadyOnSarcophagus);
    }
    if slot.digging_fee < incoming_profile.minimum_digging_fee {
        return Err(SarcophagusError::DiggingFeeTooLow);
    }
    if sarcophagus.maximum_rewrap_interval > incoming_profile.maximum_rewrap_interval {
        return Err(SarcophagusError::MaxRewrapIntervalExceedsArchaeologistMax);
    }
    if incoming_profile.free_bond < slot.digging_fee {
        return Err(SarcophagusError::InsufficientFreeBond);
    }

    bond::release(env, outgoing, slot.digging_fee)?;
    bond::lock(env, incoming, slot.digging_fee)?;

    slot.archaeologist = incoming.clone();
    sarcophagus.archaeologists.set(index, slot);
    sarcophagus.payload_refs.push_back(payload_ref.clone());
    storage::store_sarcophagus(env, &sarcophagus);
    events::publish_transfer_finalized(env, id, outgoing, incoming, payload_ref);
    Ok(())
}
