#![no_main]

use arbitrary::Arbitrary;
use k256::{ecdsa::SigningKey, elliptic_curve::sec1::ToEncodedPoint};
use libfuzzer_sys::fuzz_target;
use sarcophagus::{
    commitment, signature, ArchaeologistSignature, ArchaeologistTerms, ProtocolConfig,
    SarcophagusContract, SarcophagusContractClient, SarcophagusParams, SarcophagusState,
};
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token::{StellarAssetClient, TokenClient},
    Address, Bytes, BytesN, Env, String, Vec as SorobanVec,
};

const ARCHAEOLOGISTS: usize = 4;
const DIGGING_FEE: i128 = 100;
const WEEK: u64 = 604_800;

/// Actions covering the bond ledger and the sarcophagus lifecycle.
///
/// Indices are reduced modulo the live archaeologist or sarcophagus count,
/// so every action reaches a real handler.
#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Create { committee: u8, threshold: u8, finalize: bool },
    Cancel { sarcophagus: u8 },
    Rewrap { sarcophagus: u8, extend_by: u32 },
    Bury { sarcophagus: u8 },
    Publish { sarcophagus: u8, slot: u8, corrupt: bool },
    Accuse { sarcophagus: u8, slot: u8 },
    Clean { sarcophagus: u8, as_admin: bool },
    Transfer { sarcophagus: u8, slot: u8, incoming: u8 },
    Deposit { archaeologist: u8, amount: u16 },
    Withdraw { archaeologist: u8, amount: u16 },
    WithdrawRewards { archaeologist: u8 },
    AdvanceTime { delta: u32 },
}

fn share(env: &Env, slot: u32) -> Bytes {
    Bytes::from_array(env, &[0x5a, slot as u8, 0x4b])
}

fn sign(env: &Env, key: &SigningKey, message: &Bytes) -> BytesN<65> {
    let digest = signature::signing_digest(env, message).to_array();
    let (signed, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();
    let mut raw = [0u8; 65];
    raw[..64].copy_from_slice(&signed.to_bytes());
    raw[64] = recovery_id.to_byte();
    BytesN::from_array(env, &raw)
}

fn pick(sarcophagi: &[BytesN<32>], index: u8) -> Option<BytesN<32>> {
    if sarcophagi.is_empty() {
        None
    } else {
        Some(sarcophagi[index as usize % sarcophagi.len()].clone())
    }
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_000_000);

    let admin = Address::generate(&env);
    let embalmer = Address::generate(&env);
    let token = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();
    let contract_id = env.register(SarcophagusContract, ());
    let client = SarcophagusContractClient::new(&env, &contract_id);
    let config = ProtocolConfig::default_config();

    if client.try_initialize(&admin, &token, &config).is_err() {
        return;
    }
    let minter = StellarAssetClient::new(&env, &token);
    minter.mint(&embalmer, &1_000_000_000i128);

    let mut archaeologists = Vec::new();
    for i in 0..ARCHAEOLOGISTS {
        let key = SigningKey::from_bytes(&[i as u8 + 1; 32].into()).unwrap();
        let public_key = key.verifying_key().to_encoded_point(false);
        let address = Address::generate(&env);
        minter.mint(&address, &1_000_000_000i128);
        client.register_archaeologist(
            &address,
            &String::from_str(&env, "peer"),
            &BytesN::from_array(&env, &public_key.as_bytes().try_into().unwrap()),
            &DIGGING_FEE,
            &WEEK,
            &300i128,
        );
        archaeologists.push((address, key));
    }
    let key_of = |address: &Address| {
        archaeologists
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, k)| k.clone())
    };

    let mut sarcophagi: Vec<BytesN<32>> = Vec::new();

    for action in actions.into_iter().take(64) {
        match action {
            FuzzAction::Create { committee, threshold, finalize } => {
                let size = committee as usize % ARCHAEOLOGISTS + 1;
                let threshold = (threshold as u32 % size as u32) + 1;
                let mut terms = SorobanVec::new(&env);
                for slot in 0..size {
                    let holder = &archaeologists[(sarcophagi.len() + slot) % ARCHAEOLOGISTS].0;
                    terms.push_back(ArchaeologistTerms {
                        archaeologist: holder.clone(),
                        share_digest: commitment::digest(&env, config.digest, &share(&env, slot as u32)),
                        digging_fee: DIGGING_FEE,
                    });
                }
                let fees = DIGGING_FEE * size as i128;
                let name = format!("fuzz-{}", sarcophagi.len());
                let params = SarcophagusParams {
                    name: String::from_str(&env, &name),
                    salt: BytesN::from_array(&env, &[7; 32]),
                    recipient: Address::generate(&env),
                    resurrection_time: env.ledger().timestamp() + 86_400,
                    maximum_rewrap_interval: WEEK,
                    threshold,
                    total_fee: fees + config.protocol_fee(fees),
                    payload_ref: String::from_str(&env, "payload-0"),
                };
                if let Ok(Ok(id)) = client.try_create_sarcophagus(&embalmer, &params, &terms) {
                    sarcophagi.push(id.clone());
                    if finalize {
                        let sarcophagus = client.get_sarcophagus(&id);
                        let mut signatures = SorobanVec::new(&env);
                        for slot in sarcophagus.archaeologists.iter() {
                            if let Some(key) = key_of(&slot.archaeologist) {
                                let message = signature::curse_terms_message(&env, &sarcophagus, &slot);
                                signatures.push_back(ArchaeologistSignature {
                                    archaeologist: slot.archaeologist.clone(),
                                    signature: sign(&env, &key, &message),
                                });
                            }
                        }
                        let _ = client.try_finalize_sarcophagus(&embalmer, &id, &signatures);
                    }
                }
            }
            FuzzAction::Cancel { sarcophagus } => {
                if let Some(id) = pick(&sarcophagi, sarcophagus) {
                    let _ = client.try_cancel_sarcophagus(&embalmer, &id);
                }
            }
            FuzzAction::Rewrap { sarcophagus, extend_by } => {
                if let Some(id) = pick(&sarcophagi, sarcophagus) {
                    let current = client.get_sarcophagus(&id).resurrection_time;
                    let new_time = current.saturating_add(extend_by as u64);
                    let _ = client.try_rewrap_sarcophagus(&embalmer, &id, &new_time);
                }
            }
            FuzzAction::Bury { sarcophagus } => {
                if let Some(id) = pick(&sarcophagi, sarcophagus) {
                    let _ = client.try_bury_sarcophagus(&embalmer, &id);
                }
            }
            FuzzAction::Publish { sarcophagus, slot, corrupt } => {
                if let Some(id) = pick(&sarcophagi, sarcophagus) {
                    let s = client.get_sarcophagus(&id);
                    let slot = slot as u32 % s.archaeologists.len();
                    if let Some(holder) = s.archaeologists.get(slot) {
                        let revealed = if corrupt { share(&env, slot + 1) } else { share(&env, slot) };
                        let _ = client.try_publish_key_share(&holder.archaeologist, &id, &revealed);
                    }
                }
            }
            FuzzAction::Accuse { sarcophagus, slot } => {
                if let Some(id) = pick(&sarcophagi, sarcophagus) {
                    let s = client.get_sarcophagus(&id);
                    let slot = slot as u32 % s.archaeologists.len();
                    if let Some(target) = s.archaeologists.get(slot) {
                        let accuser = Address::generate(&env);
                        let _ = client.try_accuse(&accuser, &id, &target.archaeologist, &share(&env, slot));
                    }
                }
            }
            FuzzAction::Clean { sarcophagus, as_admin } => {
                if let Some(id) = pick(&sarcophagi, sarcophagus) {
                    let caller = if as_admin { &admin } else { &embalmer };
                    let _ = client.try_clean(caller, &id);
                }
            }
            FuzzAction::Transfer { sarcophagus, slot, incoming } => {
                if let Some(id) = pick(&sarcophagi, sarcophagus) {
                    let s = client.get_sarcophagus(&id);
                    let slot = slot as u32 % s.archaeologists.len();
                    if let Some(outgoing) = s.archaeologists.get(slot) {
                        if let Some(key) = key_of(&outgoing.archaeologist) {
                            let name = format!("payload-fuzz-{}", s.payload_refs.len());
                            let payload = String::from_str(&env, &name);
                            let message = signature::transfer_message(
                                &env,
                                &id,
                                &outgoing.archaeologist,
                                &payload,
                            );
                            let sig = sign(&env, &key, &message);
                            let incoming = &archaeologists[incoming as usize % ARCHAEOLOGISTS].0;
                            let _ = client.try_finalize_transfer(
                                incoming,
                                &id,
                                &outgoing.archaeologist,
                                &payload,
                                &sig,
                            );
                        }
                    }
                }
            }
            FuzzAction::Deposit { archaeologist, amount } => {
                let address = &archaeologists[archaeologist as usize % ARCHAEOLOGISTS].0;
                let _ = client.try_deposit_free_bond(address, &(amount as i128));
            }
            FuzzAction::Withdraw { archaeologist, amount } => {
                let address = &archaeologists[archaeologist as usize % ARCHAEOLOGISTS].0;
                let _ = client.try_withdraw_free_bond(address, &(amount as i128));
            }
            FuzzAction::WithdrawRewards { archaeologist } => {
                let address = &archaeologists[archaeologist as usize % ARCHAEOLOGISTS].0;
                let _ = client.try_withdraw_rewards(address);
            }
            FuzzAction::AdvanceTime { delta } => {
                let ts = env.ledger().timestamp().saturating_add(delta as u64);
                env.ledger().set_timestamp(ts);
            }
        }

        // ── Post-action invariant checks ──
        let mut owed = client.get_protocol_fees();
        for (address, _) in &archaeologists {
            let profile = client.get_archaeologist(address);
            assert!(
                profile.free_bond >= 0 && profile.cursed_bond >= 0 && profile.rewards >= 0,
                "INVARIANT VIOLATION: negative balance {:?}",
                profile
            );
            owed += profile.free_bond + profile.cursed_bond + profile.rewards;
        }
        for id in &sarcophagi {
            let s = client.get_sarcophagus(id);
            assert!(s.fee_escrow >= 0, "INVARIANT VIOLATION: negative escrow");
            assert_eq!(
                s.state == SarcophagusState::Compromised,
                s.accused_count >= s.threshold,
                "INVARIANT VIOLATION: compromise flag disagrees with accusations"
            );
            owed += s.fee_escrow;
        }
        let held = TokenClient::new(&env, &token).balance(&contract_id);
        assert_eq!(held, owed, "INVARIANT VIOLATION: contract balance != liabilities");
    }
});
