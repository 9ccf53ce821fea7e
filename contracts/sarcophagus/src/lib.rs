#![no_std]
#![allow(clippy::too_many_arguments)]

pub mod accusation;
pub mod bond;
pub mod commitment;
pub mod errors;
pub mod events;
pub mod registry;
pub mod signature;
pub mod storage;
pub mod token;
pub mod transfer;
pub mod types;


use soroban_sdk::{contract, contractimpl, Address, Bytes, BytesN, Env, String, Vec};

pub use crate::errors::SarcophagusError;
use crate::token::{TokenTransfer, ValueTransfer};
pub use crate::types::{
    ArchaeologistProfile, ArchaeologistSignature, ArchaeologistTerms, BuryPolicy,
    CursedArchaeologist, DigestAlgorithm, LifecyclePhase, ProtocolConfig, Sarcophagus,
    SarcophagusParams, SarcophagusState, SlashPolicy,
};

#[contract]
pub struct SarcophagusContract;

#[contractimpl]
impl SarcophagusContract {
    // ── Initialisation & configuration ───────────────────────────────────────

    /// Sets the admin, the bond/fee token and the immutable protocol
    /// configuration. Callable once.
    pub fn initialize(
        env: Env,
        admin: Address,
        token: Address,
        config: ProtocolConfig,
    ) -> Result<(), SarcophagusError> {
        if storage::is_initialized(&env) {
            return Err(SarcophagusError::AlreadyInitialized);
        }
        admin.require_auth();
        if !config.is_valid() {
            return Err(SarcophagusError::InvalidConfig);
        }
        storage::init(&env, &admin, &token, &config);
        events::publish_initialized(&env, &admin, &token, &config);
        Ok(())
    }

    pub fn is_initialized(env: Env) -> bool {
        storage::is_initialized(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, SarcophagusError> {
        storage::admin(&env)
    }

    pub fn get_token(env: Env) -> Result<Address, SarcophagusError> {
        storage::token(&env)
    }

    pub fn get_config(env: Env) -> Result<ProtocolConfig, SarcophagusError> {
        storage::config(&env)
    }

    pub fn get_grace_period(env: Env) -> Result<u64, SarcophagusError> {
        Ok(storage::config(&env)?.grace_period)
    }

    pub fn get_protocol_fee_bps(env: Env) -> Result<u32, SarcophagusError> {
        Ok(storage::config(&env)?.protocol_fee_bps)
    }

    pub fn get_expiration_threshold(env: Env) -> Result<u64, SarcophagusError> {
        Ok(storage::config(&env)?.expiration_threshold)
    }

    // ── Archaeologists ───────────────────────────────────────────────────────

    /// Registers a new archaeologist, or re-activates one that unregistered,
    /// and deposits its initial free bond.
    pub fn register_archaeologist(
        env: Env,
        archaeologist: Address,
        peer_id: String,
        signing_key: BytesN<65>,
        minimum_digging_fee: i128,
        maximum_rewrap_interval: u64,
        free_bond: i128,
    ) -> Result<ArchaeologistProfile, SarcophagusError> {
        archaeologist.require_auth();
        let vt = TokenTransfer::load(&env)?;
        if minimum_digging_fee < 0 || free_bond < 0 {
            return Err(SarcophagusError::InvalidAmount);
        }

        let previous = storage::load_profile(&env, &archaeologist);
        let profile = match previous {
            Some(existing) if existing.exists => {
                return Err(SarcophagusError::ArchaeologistAlreadyRegistered)
            }
            Some(existing) => ArchaeologistProfile {
                exists: true,
                peer_id: peer_id.clone(),
                signing_key,
                minimum_digging_fee,
                maximum_rewrap_interval,
                ..existing
            },
            None => {
                storage::push_archaeologist(&env, &archaeologist);
                ArchaeologistProfile {
                    exists: true,
                    peer_id: peer_id.clone(),
                    signing_key,
                    minimum_digging_fee,
                    maximum_rewrap_interval,
                    free_bond: 0,
                    cursed_bond: 0,
                    rewards: 0,
                    successes: 0,
                    accusals: 0,
                }
            }
        };
        storage::store_profile(&env, &archaeologist, &profile);
        events::publish_archaeologist_registered(&env, &archaeologist, &peer_id);

        if free_bond > 0 {
            return bond::deposit_free_bond(&env, &vt, &archaeologist, free_bond);
        }
        Ok(profile)
    }

    /// Replaces the archaeologist's terms and optionally tops up free bond.
    pub fn update_archaeologist(
        env: Env,
        archaeologist: Address,
        peer_id: String,
        signing_key: BytesN<65>,
        minimum_digging_fee: i128,
        maximum_rewrap_interval: u64,
        free_bond: i128,
    ) -> Result<ArchaeologistProfile, SarcophagusError> {
        archaeologist.require_auth();
        let vt = TokenTransfer::load(&env)?;
        if minimum_digging_fee < 0 || free_bond < 0 {
            return Err(SarcophagusError::InvalidAmount);
        }
        let mut profile = storage::load_active_profile(&env, &archaeologist)?;
        profile.peer_id = peer_id.clone();
        profile.signing_key = signing_key;
        profile.minimum_digging_fee = minimum_digging_fee;
        profile.maximum_rewrap_interval = maximum_rewrap_interval;
        storage::store_profile(&env, &archaeologist, &profile);
        events::publish_archaeologist_updated(&env, &archaeologist, &peer_id);

        if free_bond > 0 {
            return bond::deposit_free_bond(&env, &vt, &archaeologist, free_bond);
        }
        Ok(profile)
    }

    /// Pays out free bond and rewards and deactivates the profile. Fails
    /// while any bond is still cursed.
    pub fn unregister_archaeologist(
        env: Env,
        archaeologist: Address,
    ) -> Result<i128, SarcophagusError> {
        archaeologist.require_auth();
        let vt = TokenTransfer::load(&env)?;
        let mut profile = storage::load_active_profile(&env, &archaeologist)?;
        if profile.cursed_bond > 0 {
            return Err(SarcophagusError::CursedBondOutstanding);
        }
        let payout = profile.free_bond + profile.rewards;
        profile.free_bond = 0;
        profile.rewards = 0;
        profile.exists = false;
        storage::store_profile(&env, &archaeologist, &profile);
        vt.transfer_to(&archaeologist, payout)?;
        events::publish_archaeologist_unregistered(&env, &archaeologist);
        Ok(payout)
    }

    pub fn deposit_free_bond(
        env: Env,
        archaeologist: Address,
        amount: i128,
    ) -> Result<i128, SarcophagusError> {
        archaeologist.require_auth();
        let vt = TokenTransfer::load(&env)?;
        Ok(bond::deposit_free_bond(&env, &vt, &archaeologist, amount)?.free_bond)
    }

    pub fn withdraw_free_bond(
        env: Env,
        archaeologist: Address,
        amount: i128,
    ) -> Result<i128, SarcophagusError> {
        archaeologist.require_auth();
        let vt = TokenTransfer::load(&env)?;
        Ok(bond::withdraw_free_bond(&env, &vt, &archaeologist, amount)?.free_bond)
    }

    /// Pays out the archaeologist's full reward balance and returns it.
    pub fn withdraw_rewards(env: Env, archaeologist: Address) -> Result<i128, SarcophagusError> {
        archaeologist.require_auth();
        let vt = TokenTransfer::load(&env)?;
        bond::withdraw_rewards(&env, &vt, &archaeologist)
    }

    // ── Sarcophagus lifecycle ────────────────────────────────────────────────

    /// Creates a Pending sarcophagus and returns its id.
    pub fn create_sarcophagus(
        env: Env,
        embalmer: Address,
        params: SarcophagusParams,
        archaeologists: Vec<ArchaeologistTerms>,
    ) -> Result<BytesN<32>, SarcophagusError> {
        embalmer.require_auth();
        let vt = TokenTransfer::load(&env)?;
        registry::create(&env, &vt, &embalmer, &params, &archaeologists)
    }

    /// `signatures` must be in the same order as the sarcophagus' slots.
    pub fn finalize_sarcophagus(
        env: Env,
        embalmer: Address,
        id: BytesN<32>,
        signatures: Vec<ArchaeologistSignature>,
    ) -> Result<(), SarcophagusError> {
        embalmer.require_auth();
        registry::finalize(&env, &embalmer, &id, &signatures)
    }

    pub fn rewrap_sarcophagus(
        env: Env,
        embalmer: Address,
        id: BytesN<32>,
        resurrection_time: u64,
    ) -> Result<(), SarcophagusError> {
        embalmer.require_auth();
        let vt = TokenTransfer::load(&env)?;
        registry::rewrap(&env, &vt, &embalmer, &id, resurrection_time)
    }

    pub fn bury_sarcophagus(
        env: Env,
        embalmer: Address,
        id: BytesN<32>,
    ) -> Result<(), SarcophagusError> {
        embalmer.require_auth();
        registry::bury(&env, &embalmer, &id)
    }

    /// Refunds a sarcophagus that was never finalized. Returns the refund.
    pub fn cancel_sarcophagus(
        env: Env,
        embalmer: Address,
        id: BytesN<32>,
    ) -> Result<i128, SarcophagusError> {
        embalmer.require_auth();
        let vt = TokenTransfer::load(&env)?;
        registry::cancel(&env, &vt, &embalmer, &id)
    }

    pub fn publish_key_share(
        env: Env,
        archaeologist: Address,
        id: BytesN<32>,
        share: Bytes,
    ) -> Result<(), SarcophagusError> {
        archaeologist.require_auth();
        registry::publish_share(&env, &archaeologist, &id, &share)
    }

    // ── Accusation, clean-up & transfer ──────────────────────────────────────

    /// Returns true when this accusation compromised the sarcophagus.
    pub fn accuse(
        env: Env,
        accuser: Address,
        id: BytesN<32>,
        archaeologist: Address,
        leaked_share: Bytes,
    ) -> Result<bool, SarcophagusError> {
        accuser.require_auth();
        let vt = TokenTransfer::load(&env)?;
        accusation::accuse(&env, &vt, &accuser, &id, &archaeologist, &leaked_share)
    }

    /// Returns the number of archaeologists slashed for not publishing.
    pub fn clean(env: Env, caller: Address, id: BytesN<32>) -> Result<u32, SarcophagusError> {
        caller.require_auth();
        let vt = TokenTransfer::load(&env)?;
        accusation::clean(&env, &vt, &caller, &id)
    }

    pub fn finalize_transfer(
        env: Env,
        new_archaeologist: Address,
        id: BytesN<32>,
        outgoing: Address,
        payload_ref: String,
        signature: BytesN<65>,
    ) -> Result<(), SarcophagusError> {
        new_archaeologist.require_auth();
        transfer::finalize_transfer(
            &env,
            &new_archaeologist,
            &id,
            &outgoing,
            &payload_ref,
            &signature,
        )
    }

    // ── Admin ────────────────────────────────────────────────────────────────

    pub fn withdraw_protocol_fees(env: Env, admin: Address) -> Result<i128, SarcophagusError> {
        admin.require_auth();
        if admin != storage::admin(&env)? {
            return Err(SarcophagusError::Unauthorized);
        }
        let vt = TokenTransfer::load(&env)?;
        let amount = storage::protocol_fees(&env);
        storage::set_protocol_fees(&env, 0);
        vt.transfer_to(&admin, amount)?;
        events::publish_protocol_fees_withdrawn(&env, &admin, amount);
        Ok(amount)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn get_sarcophagus(env: Env, id: BytesN<32>) -> Result<Sarcophagus, SarcophagusError> {
        storage::load_sarcophagus(&env, &id)
    }

    pub fn get_phase(env: Env, id: BytesN<32>) -> Result<LifecyclePhase, SarcophagusError> {
        let sarcophagus = storage::load_sarcophagus(&env, &id)?;
        registry::phase(&env, &sarcophagus)
    }

    pub fn get_cursed_archaeologist(
        env: Env,
        id: BytesN<32>,
        archaeologist: Address,
    ) -> Result<CursedArchaeologist, SarcophagusError> {
        let sarcophagus = storage::load_sarcophagus(&env, &id)?;
        let index = sarcophagus
            .position_of(&archaeologist)
            .ok_or(SarcophagusError::ArchaeologistNotOnSarcophagus)?;
        sarcophagus
            .archaeologists
            .get(index)
            .ok_or(SarcophagusError::ArchaeologistNotOnSarcophagus)
    }

    pub fn get_embalmer_sarcophagi(env: Env, embalmer: Address) -> Vec<BytesN<32>> {
        storage::embalmer_sarcophagi(&env, &embalmer)
    }

    pub fn derive_sarcophagus_id(env: Env, name: String, salt: BytesN<32>) -> BytesN<32> {
        registry::derive_id(&env, &name, &salt)
    }

    pub fn get_archaeologist(
        env: Env,
        archaeologist: Address,
    ) -> Result<ArchaeologistProfile, SarcophagusError> {
        storage::load_profile(&env, &archaeologist)
            .ok_or(SarcophagusError::ArchaeologistProfileNotFound)
    }

    pub fn get_free_bond(env: Env, archaeologist: Address) -> i128 {
        storage::load_profile(&env, &archaeologist).map_or(0, |p| p.free_bond)
    }

    pub fn get_cursed_bond(env: Env, archaeologist: Address) -> i128 {
        storage::load_profile(&env, &archaeologist).map_or(0, |p| p.cursed_bond)
    }

    pub fn get_rewards(env: Env, archaeologist: Address) -> i128 {
        storage::load_profile(&env, &archaeologist).map_or(0, |p| p.rewards)
    }

    /// Number of addresses that have ever registered.
    pub fn get_archaeologist_count(env: Env) -> u32 {
        storage::archaeologist_count(&env)
    }

    pub fn get_archaeologist_at(env: Env, index: u32) -> Option<Address> {
        storage::archaeologist_at(&env, index)
    }

    pub fn get_protocol_fees(env: Env) -> i128 {
        storage::protocol_fees(&env)
    }
}
