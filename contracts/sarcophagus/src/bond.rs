//! Bond ledger: per-archaeologist free/cursed collateral and rewards.
//!
//! Every archaeologist has one aggregate `(free_bond, cursed_bond)` pair shared
//! by all the sarcophagi it guards. A slot's claim is simply its digging fee:
//! locked on finalize, released on publish/bury/transfer, slashed on
//! accusation or default. Token value only moves on deposit, withdrawal,
//! reward payout and slashing.

use soroban_sdk::{Address, Env};

use crate::errors::SarcophagusError;
use crate::events;
use crate::storage;
use crate::token::ValueTransfer;
use crate::types::{ArchaeologistProfile, SlashPolicy, BPS_DENOMINATOR};

/// Receiver of the non-embalmer share of a slashed bond.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Beneficiary {
    Account(Address),
    /// Kept in the contract and added to the withdrawable protocol fees.
    ProtocolTreasury,
}

/// How a slashed amount was divided.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SlashOutcome {
    pub accuser_share: i128,
    pub embalmer_share: i128,
}

fn positive(amount: i128) -> Result<i128, SarcophagusError> {
    if amount <= 0 {
        return Err(SarcophagusError::InvalidAmount);
    }
    Ok(amount)
}

pub fn deposit_free_bond(
    env: &Env,
    vt: &impl ValueTransfer,
    archaeologist: &Address,
    amount: i128,
) -> Result<ArchaeologistProfile, SarcophagusError> {
    let amount = positive(amount)?;
    let mut profile = storage::load_active_profile(env, archaeologist)?;
    vt.transfer_from(archaeologist, amount)?;
    profile.free_bond = profile
        .free_bond
        .checked_add(amount)
        .ok_or(SarcophagusError::InvalidAmount)?;
    storage::store_profile(env, archaeologist, &profile);
    events::publish_free_bond_deposited(env, archaeologist, amount);
    Ok(profile)
}

pub fn withdraw_free_bond(
    env: &Env,
    vt: &impl ValueTransfer,
    archaeologist: &Address,
    amount: i128,
) -> Result<ArchaeologistProfile, SarcophagusError> {
    let amount = positive(amount)?;
    let mut profile = storage::load_profile(env, archaeologist)
        .ok_or(SarcophagusError::ArchaeologistProfileNotFound)?;
    if amount > profile.free_bond {
        return Err(SarcophagusError::InsufficientFreeBond);
    }
    profile.free_bond -= amount;
    storage::store_profile(env, archaeologist, &profile);
    vt.transfer_to(archaeologist, amount)?;
    events::publish_free_bond_withdrawn(env, archaeologist, amount);
    Ok(profile)
}

/// Moves `amount` from free to cursed bond.
pub fn lock(env: &Env, archaeologist: &Address, amount: i128) -> Result<(), SarcophagusError> {
    let mut profile = storage::load_profile(env, archaeologist)
        .ok_or(SarcophagusError::ArchaeologistProfileNotFound)?;
    if amount < 0 {
        return Err(SarcophagusError::InvalidAmount);
    }
    if amount > profile.free_bond {
        return Err(SarcophagusError::InsufficientFreeBond);
    }
    profile.free_bond -= amount;
    profile.cursed_bond += amount;
    storage::store_profile(env, archaeologist, &profile);
    Ok(())
}

/// Moves `amount` from cursed back to free bond.
pub fn release(env: &Env, archaeologist: &Address, amount: i128) -> Result<(), SarcophagusError> {
    let mut profile = storage::load_profile(env, archaeologist)
        .ok_or(SarcophagusError::ArchaeologistProfileNotFound)?;
    if amount < 0 || amount > profile.cursed_bond {
        return Err(SarcophagusError::InvariantViolation);
    }
    profile.cursed_bond -= amount;
    profile.free_bond += amount;
    storage::store_profile(env, archaeologist, &profile);
    Ok(())
}

pub fn credit_reward(
    env: &Env,
    archaeologist: &Address,
    amount: i128,
) -> Result<(), SarcophagusError> {
    if amount < 0 {
        return Err(SarcophagusError::InvariantViolation);
    }
    let mut profile = storage::load_profile(env, archaeologist)
        .ok_or(SarcophagusError::ArchaeologistProfileNotFound)?;
    profile.rewards += amount;
    storage::store_profile(env, archaeologist, &profile);
    Ok(())
}

/// Releases the slot's bond, pays its fee as reward and bumps the success count.
pub fn settle_success(
    env: &Env,
    archaeologist: &Address,
    digging_fee: i128,
) -> Result<(), SarcophagusError> {
    release(env, archaeologist, digging_fee)?;
    credit_reward(env, archaeologist, digging_fee)?;
    let mut profile = storage::load_profile(env, archaeologist)
        .ok_or(SarcophagusError::ArchaeologistProfileNotFound)?;
    profile.successes = profile.successes.saturating_add(1);
    storage::store_profile(env, archaeologist, &profile);
    Ok(())
}

/// Pays out and zeroes the archaeologist's full reward balance.
pub fn withdraw_rewards(
    env: &Env,
    vt: &impl ValueTransfer,
    archaeologist: &Address,
) -> Result<i128, SarcophagusError> {
    let mut profile = storage::load_profile(env, archaeologist)
        .ok_or(SarcophagusError::ArchaeologistProfileNotFound)?;
    let amount = profile.rewards;
    if amount <= 0 {
        return Err(SarcophagusError::NoRewardsToWithdraw);
    }
    profile.rewards = 0;
    storage::store_profile(env, archaeologist, &profile);
    vt.transfer_to(archaeologist, amount)?;
    events::publish_reward_withdrawn(env, archaeologist, amount);
    Ok(amount)
}

/// Splits `amount` under `policy`; the accuser's share rounds down.
pub fn split(amount: i128, policy: &SlashPolicy) -> SlashOutcome {
    let accuser_share = amount * policy.accuser_bps as i128 / BPS_DENOMINATOR as i128;
    SlashOutcome {
        accuser_share,
        embalmer_share: amount - accuser_share,
    }
}

/// Permanently removes `amount` from cursed bond and pays it out.
///
/// The slashed value never returns to free bond. The embalmer always receives
/// its share directly; the accuser's share goes to `accuser`.
pub fn slash(
    env: &Env,
    vt: &impl ValueTransfer,
    archaeologist: &Address,
    amount: i128,
    accuser: &Beneficiary,
    embalmer: &Address,
    policy: &SlashPolicy,
) -> Result<SlashOutcome, SarcophagusError> {
    let mut profile = storage::load_profile(env, archaeologist)
        .ok_or(SarcophagusError::ArchaeologistProfileNotFound)?;
    if amount < 0 || amount > profile.cursed_bond {
        return Err(SarcophagusError::InvariantViolation);
    }
    profile.cursed_bond -= amount;
    profile.accusals = profile.accusals.saturating_add(1);
    storage::store_profile(env, archaeologist, &profile);

    let outcome = split(amount, policy);
    match accuser {
        Beneficiary::Account(account) => vt.transfer_to(account, outcome.accuser_share)?,
        Beneficiary::ProtocolTreasury => storage::add_protocol_fees(env, outcome.accuser_share),
    }
    vt.transfer_to(embalmer, outcome.embalmer_share)?;

    events::publish_bond_slashed(
        env,
        archaeologist,
        amount,
        outcome.accuser_share,
        outcome.embalmer_share,
    );
    Ok(outcome)
}
