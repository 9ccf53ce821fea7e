//! # Sarcophagus Testing Framework: Integration Tests
//!
//! End-to-end tests driving the contract through the harness:
//! - Property-based testing with invariant verification
//! - State space exploration
//! - Bond and accusation scenarios

extern crate std;

use proptest::prelude::*;
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{Address, String};

use sarcophagus::{ProtocolConfig, SarcophagusError, SarcophagusState};
use test_framework::generators::*;
use test_framework::invariants::*;
use test_framework::state_explorer::*;
use test_framework::*;

const BOND: i128 = 200;

fn grace() -> u64 {
    ProtocolConfig::default_config().grace_period
}

// ═════════════════════════════════════════════════════════════════════════════
//  Property-Based Tests
// ═════════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// **Property**: for any instant, publishing a key share and accusing the
    /// same slot are never both accepted.
    #[test]
    fn prop_publish_and_accuse_windows_disjoint(
        offset in window_offset_strategy(grace()),
    ) {
        let mut env = TestEnv::new();
        let harness = SarcophagusTestHarness::new(&mut env);
        let archs = harness.add_archaeologists(2, BOND);
        let id = harness.create_active(&archs, 2);
        let deadline = harness.resurrection_time(&id) as i64;
        harness.env.set_timestamp((deadline + offset) as u64);

        let holder = harness.archaeologist(archs[0]);
        let accuser = Address::generate(&harness.env.env);
        let published = harness
            .client
            .try_publish_key_share(&holder, &id, &harness.share(0))
            .is_ok();
        let accused = harness
            .client
            .try_accuse(&accuser, &id, &holder, &harness.share(0))
            .is_ok();

        prop_assert!(!(published && accused), "share both published and accused at offset {}", offset);
        let in_window = offset >= 0 && offset <= grace() as i64;
        prop_assert_eq!(published, in_window);
        prop_assert_eq!(accused, offset < 0);
    }

    /// **Property**: a sarcophagus is compromised exactly when the number of
    /// accused archaeologists reaches its threshold.
    #[test]
    fn prop_compromise_at_threshold(
        (size, threshold) in committee_strategy(5),
        accusations in 0u32..=5,
    ) {
        let mut env = TestEnv::new();
        let harness = SarcophagusTestHarness::new(&mut env);
        let archs = harness.add_archaeologists(size as usize, BOND);
        let id = harness.create_active(&archs, threshold);
        let accusations = accusations.min(size);

        for slot in 0..accusations {
            let accuser = Address::generate(&harness.env.env);
            let target = harness.archaeologist(archs[slot as usize]);
            let result = harness.client.try_accuse(&accuser, &id, &target, &harness.share(slot));
            if slot < threshold {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(Ok(SarcophagusError::SarcophagusCompromised)));
            }
        }

        let sarcophagus = harness.client.get_sarcophagus(&id);
        let expect_compromised = accusations >= threshold;
        prop_assert_eq!(sarcophagus.state == SarcophagusState::Compromised, expect_compromised);
        InvariantSet::sarcophagus_defaults().assert_all(&harness.snapshot());
    }

    /// **Property**: every locked digging fee is released by bury, returning
    /// each archaeologist's free bond to where it started.
    #[test]
    fn prop_bury_releases_every_lock((size, threshold) in committee_strategy(5)) {
        let mut env = TestEnv::new();
        let harness = SarcophagusTestHarness::new(&mut env);
        let archs = harness.add_archaeologists(size as usize, BOND);
        let id = harness.create_active(&archs, threshold);

        for index in &archs {
            let address = harness.archaeologist(*index);
            prop_assert_eq!(harness.client.get_cursed_bond(&address), DIGGING_FEE);
        }

        harness.client.bury_sarcophagus(&harness.embalmer, &id);

        for index in &archs {
            let address = harness.archaeologist(*index);
            prop_assert_eq!(harness.client.get_cursed_bond(&address), 0);
            prop_assert_eq!(harness.client.get_free_bond(&address), BOND);
            prop_assert_eq!(harness.client.get_rewards(&address), DIGGING_FEE);
        }
        InvariantSet::sarcophagus_defaults().assert_all(&harness.snapshot());
    }

    /// **Property**: non-positive bond amounts are rejected without moving
    /// any value.
    #[test]
    fn prop_invalid_amounts_rejected(amount in invalid_amount_strategy()) {
        let mut env = TestEnv::new();
        let harness = SarcophagusTestHarness::new(&mut env);
        let arch = harness.archaeologist(harness.add_archaeologist(BOND));
        let before = harness.snapshot();

        prop_assert_eq!(
            harness.client.try_deposit_free_bond(&arch, &amount),
            Err(Ok(SarcophagusError::InvalidAmount))
        );
        prop_assert_eq!(harness.snapshot().contract_balance, before.contract_balance);
    }

    /// **Property**: the default invariants survive random action sequences.
    #[test]
    fn prop_invariants_hold_under_random_actions(actions in sarcophagus_action_sequence(5, 40)) {
        let mut env = TestEnv::new();
        let harness = SarcophagusTestHarness::new(&mut env);
        let mut explorer = StateExplorer::with_defaults(&harness);

        let result = explorer.explore(&actions);
        prop_assert!(result.passed(), "violations: {:?}", result.summary.invariant_violations);
        prop_assert!(result.no_unexpected_errors(), "log: {:?}", result.action_log);
    }
}

// ═════════════════════════════════════════════════════════════════════════════
//  Scenario Tests
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn test_default_grace_period_matches_config() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    assert_eq!(harness.client.get_grace_period(), grace());
}

#[test]
fn test_scenario_single_archaeologist_unwraps() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let index = harness.add_archaeologist(BOND);
    let arch = harness.archaeologist(index);

    let id = harness.create_active(&[index], 1);
    assert_eq!(harness.client.get_free_bond(&arch), BOND - DIGGING_FEE);
    assert_eq!(harness.client.get_cursed_bond(&arch), DIGGING_FEE);

    harness.env.set_timestamp(harness.resurrection_time(&id));
    harness.client.publish_key_share(&arch, &id, &harness.share(0));

    assert_eq!(harness.client.get_free_bond(&arch), BOND);
    assert_eq!(harness.client.get_cursed_bond(&arch), 0);
    assert_eq!(harness.client.get_rewards(&arch), DIGGING_FEE);
    InvariantSet::sarcophagus_defaults().assert_all(&harness.snapshot());
}

#[test]
fn test_scenario_two_accused_below_threshold_then_bury() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let archs = harness.add_archaeologists(5, BOND);
    let id = harness.create_active(&archs, 3);
    let invariants = InvariantSet::sarcophagus_defaults();

    for slot in 0..2u32 {
        let accuser = Address::generate(&harness.env.env);
        let target = harness.archaeologist(archs[slot as usize]);
        harness.client.accuse(&accuser, &id, &target, &harness.share(slot));
        invariants.assert_all(&harness.snapshot());
    }

    let sarcophagus = harness.client.get_sarcophagus(&id);
    assert_eq!(sarcophagus.state, SarcophagusState::Active);
    assert_eq!(sarcophagus.accused_count, 2);

    harness.client.bury_sarcophagus(&harness.embalmer, &id);
    invariants.assert_all(&harness.snapshot());

    for (slot, index) in archs.iter().enumerate() {
        let address = harness.archaeologist(*index);
        assert_eq!(harness.client.get_cursed_bond(&address), 0);
        if slot < 2 {
            assert_eq!(harness.client.get_rewards(&address), 0);
            assert_eq!(harness.client.get_free_bond(&address), BOND - DIGGING_FEE);
        } else {
            assert_eq!(harness.client.get_rewards(&address), DIGGING_FEE);
            assert_eq!(harness.client.get_free_bond(&address), BOND);
        }
    }
}

#[test]
fn test_scenario_third_accusation_compromises() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let archs = harness.add_archaeologists(5, BOND);
    let id = harness.create_active(&archs, 3);

    for slot in 0..3u32 {
        let accuser = Address::generate(&harness.env.env);
        let target = harness.archaeologist(archs[slot as usize]);
        harness.client.accuse(&accuser, &id, &target, &harness.share(slot));
    }

    let sarcophagus = harness.client.get_sarcophagus(&id);
    assert_eq!(sarcophagus.state, SarcophagusState::Compromised);
    assert!(sarcophagus.compromised);
    assert_eq!(sarcophagus.fee_escrow, 0);

    for index in &archs[3..] {
        let address = harness.archaeologist(*index);
        assert_eq!(harness.client.get_free_bond(&address), BOND);
        assert_eq!(harness.client.get_cursed_bond(&address), 0);
        assert_eq!(harness.client.get_rewards(&address), 0);
    }
    InvariantSet::sarcophagus_defaults().assert_all(&harness.snapshot());

    assert_eq!(
        harness.client.try_bury_sarcophagus(&harness.embalmer, &id),
        Err(Ok(SarcophagusError::SarcophagusCompromised))
    );
}

#[test]
fn test_scenario_transfer_then_unwrap() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let archs = harness.add_archaeologists(2, BOND);
    let id = harness.create_active(&archs, 1);
    let incoming_index = harness.add_archaeologist(BOND);
    let incoming = harness.archaeologist(incoming_index);
    let outgoing = harness.archaeologist(archs[1]);

    let payload = String::from_str(&harness.env.env, "payload-1");
    let signature = harness.transfer_signature(&id, archs[1], &payload);
    harness
        .client
        .finalize_transfer(&incoming, &id, &outgoing, &payload, &signature);
    InvariantSet::sarcophagus_defaults().assert_all(&harness.snapshot());

    harness.env.set_timestamp(harness.resurrection_time(&id));
    harness.client.publish_key_share(&incoming, &id, &harness.share(1));
    assert_eq!(harness.client.get_rewards(&incoming), DIGGING_FEE);
    assert_eq!(harness.client.get_rewards(&outgoing), 0);
    assert_eq!(harness.client.get_free_bond(&outgoing), BOND);
}

#[test]
fn test_scenario_clean_after_grace() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let archs = harness.add_archaeologists(3, BOND);
    let id = harness.create_active(&archs, 2);
    let deadline = harness.resurrection_time(&id);

    harness.env.set_timestamp(deadline);
    let first = harness.archaeologist(archs[0]);
    harness.client.publish_key_share(&first, &id, &harness.share(0));

    harness.env.set_timestamp(deadline + grace() + 1);
    let embalmer_before = harness.balance(&harness.embalmer);
    assert_eq!(harness.client.clean(&harness.embalmer, &id), 2);

    let sarcophagus = harness.client.get_sarcophagus(&id);
    assert_eq!(sarcophagus.state, SarcophagusState::Compromised);
    // Two refunded fees plus the two slashed bonds.
    assert_eq!(
        harness.balance(&harness.embalmer),
        embalmer_before + 4 * DIGGING_FEE
    );
    InvariantSet::sarcophagus_defaults().assert_all(&harness.snapshot());
}

// ═════════════════════════════════════════════════════════════════════════════
//  Invariant Tests
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn test_all_invariants_hold_on_fresh_contract() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    InvariantSet::sarcophagus_defaults().assert_all(&harness.snapshot());
}

#[test]
fn test_invariants_through_full_lifecycle() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let invariants = InvariantSet::sarcophagus_defaults();
    let transitions = TransitionInvariantSet::sarcophagus_defaults();
    let archs = harness.add_archaeologists(3, 1_000);

    let mut before = harness.snapshot();
    let mut step = |label: &str| {
        let after = harness.snapshot();
        invariants.assert_all(&after);
        let violations = transitions.check_all(&before, &after);
        assert!(violations.is_empty(), "{}: {:?}", label, violations);
        before = after;
    };

    let id = harness.create(&archs, 2);
    step("create");
    harness.finalize(&id);
    step("finalize");

    harness.env.advance_time(DAY / 2);
    let new_time = harness.resurrection_time(&id) + DAY;
    harness
        .client
        .rewrap_sarcophagus(&harness.embalmer, &id, &new_time);
    step("rewrap");

    harness.env.set_timestamp(new_time);
    let first = harness.archaeologist(archs[0]);
    harness.client.publish_key_share(&first, &id, &harness.share(0));
    step("publish");

    harness.client.withdraw_rewards(&first);
    step("withdraw rewards");

    let cancelled = harness.create(&archs, 1);
    harness.client.cancel_sarcophagus(&harness.embalmer, &cancelled);
    step("cancel");
}

#[test]
fn test_terminal_state_invariant_detects_change() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let archs = harness.add_archaeologists(1, BOND);
    let id = harness.create_active(&archs, 1);
    harness.client.bury_sarcophagus(&harness.embalmer, &id);

    let before = harness.snapshot();
    let mut after = before.clone();
    after.sarcophagi[0].fee_escrow = 1;

    let violations = TerminalStatesFinal.check(&before, &after);
    assert!(violations.is_err());
}

#[test]
fn test_solvency_invariant_detects_leak() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    harness.add_archaeologists(2, BOND);

    let mut snapshot = harness.snapshot();
    assert!(TokenSolvency.check(&snapshot).is_ok());
    snapshot.contract_balance -= 1;
    assert!(TokenSolvency.check(&snapshot).is_err());
}

#[test]
fn test_cursed_bond_invariant_is_per_archaeologist() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let archs = harness.add_archaeologists(2, BOND);
    harness.create_active(&archs, 1);

    let mut snapshot = harness.snapshot();
    assert!(CursedBondMatchesSlots.check(&snapshot).is_ok());

    // Shift a lock between archaeologists without changing the total.
    snapshot.archaeologists[0].1.cursed_bond += DIGGING_FEE;
    snapshot.archaeologists[1].1.cursed_bond -= DIGGING_FEE;
    assert!(CursedBondMatchesSlots.check(&snapshot).is_err());
}

// ═════════════════════════════════════════════════════════════════════════════
//  State Space Explorer Tests
// ═════════════════════════════════════════════════════════════════════════════

#[test]
fn test_explorer_simple_sequence() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let mut explorer = StateExplorer::with_defaults(&harness);

    let actions = std::vec![
        SarcophagusAction::CreateActive { archaeologists: 3, threshold: 2 },
        SarcophagusAction::Accuse { sarcophagus: 0, slot: 1 },
        SarcophagusAction::AdvanceTime { delta: DAY },
        SarcophagusAction::Publish { sarcophagus: 0, slot: 0 },
        SarcophagusAction::Publish { sarcophagus: 0, slot: 2 },
        SarcophagusAction::WithdrawRewards { archaeologist: 0 },
    ];

    let result = explorer.explore(&actions);
    assert!(result.passed(), "{:?}", result.summary.invariant_violations);
    assert!(result.no_unexpected_errors());
    assert_eq!(result.summary.actions_executed, 6);
    assert!(result
        .action_log
        .iter()
        .all(|(_, outcome)| matches!(outcome, ActionOutcome::Ok)));
}

#[test]
fn test_explorer_records_rejections() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let mut explorer = StateExplorer::with_defaults(&harness);

    let actions = std::vec![
        SarcophagusAction::CreatePending { archaeologists: 2 },
        SarcophagusAction::Bury { sarcophagus: 0 },
        SarcophagusAction::Cancel { sarcophagus: 0 },
        SarcophagusAction::Cancel { sarcophagus: 0 },
    ];

    let result = explorer.explore(&actions);
    assert!(result.passed());
    let codes: std::vec::Vec<_> = result
        .action_log
        .iter()
        .map(|(_, outcome)| std::format!("{:?}", outcome))
        .collect();
    assert_eq!(
        codes,
        std::vec![
            std::format!("{:?}", ActionOutcome::Ok),
            std::format!(
                "{:?}",
                ActionOutcome::ExpectedError(SarcophagusError::SarcophagusNotFinalized as u32)
            ),
            std::format!("{:?}", ActionOutcome::Ok),
            std::format!(
                "{:?}",
                ActionOutcome::ExpectedError(SarcophagusError::SarcophagusNotPending as u32)
            ),
        ]
    );
}

#[test]
fn test_explorer_coverage_tracking() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let mut explorer = StateExplorer::with_defaults(&harness);

    let actions = std::vec![
        SarcophagusAction::DepositBond { archaeologist: 0, amount: 50 },
        SarcophagusAction::CreateActive { archaeologists: 2, threshold: 1 },
        SarcophagusAction::Rewrap { sarcophagus: 0, extend_by: DAY },
        SarcophagusAction::Transfer { sarcophagus: 0, slot: 0, incoming: 5 },
        SarcophagusAction::WithdrawBond { archaeologist: 0, amount: 50 },
        SarcophagusAction::AdvanceTime { delta: 3 * DAY },
        SarcophagusAction::Clean { sarcophagus: 0, as_admin: true },
    ];

    let result = explorer.explore(&actions);
    assert!(result.passed(), "{:?}", result.summary.invariant_violations);
    assert!(result.no_unexpected_errors());
    for entry in [
        "deposit_free_bond",
        "finalize_sarcophagus",
        "rewrap_sarcophagus",
        "finalize_transfer",
        "withdraw_free_bond",
        "clean",
    ] {
        assert!(result.summary.entry_points_hit.contains(entry), "missing {}", entry);
    }
}

#[test]
fn test_explorer_respects_max_steps() {
    let mut env = TestEnv::new();
    let harness = SarcophagusTestHarness::new(&mut env);
    let config = ExplorerConfig {
        max_steps: 2,
        ..ExplorerConfig::default()
    };
    let mut explorer = StateExplorer::new(
        &harness,
        InvariantSet::sarcophagus_defaults(),
        TransitionInvariantSet::sarcophagus_defaults(),
        config,
    );

    let actions = std::vec![SarcophagusAction::AdvanceTime { delta: 1 }; 5];
    let result = explorer.explore(&actions);
    assert_eq!(result.summary.actions_executed, 2);
}
