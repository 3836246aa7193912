use proptest::prelude::*;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::account::{SimAccount, random_accounts};
use crate::address::{AccountAddress, ValidatorAddress};
use crate::config::GeneratorConfig;
use crate::generators::genesis::{Genesis, arb_genesis};
use crate::generators::stake::arb_broken_stake;
use crate::keeper::AccountKeeper;
use crate::law::invariants::{
    assert_conserved, assert_delegations_positive, assert_delegator_shares_match,
};
use crate::law::outcomes::{
    assert_commission_within, assert_distinct_redelegation, assert_principal_positive,
    assert_principal_within,
};
use crate::msgs::StakingMsg;
use crate::operation::OperationError;
use crate::random::sim_rng;
use crate::staking::{
    COMMISSION_UPDATE_WINDOW_MS, Commission, CommissionRates, Description, StakingParams,
};
use crate::testing::InMemoryChain;

const CHAIN_ID: &str = "sim-chain";

fn run(
    kind: OperationKind,
    seed: u64,
    chain: &mut InMemoryChain,
    accounts: &[SimAccount],
) -> OperationOutcome {
    let header = chain.header().clone();
    let config = GeneratorConfig::default();
    let ctx = SimContext::new(accounts, &header, &config);
    kind.simulate(&mut sim_rng(seed), chain, &ctx)
}

fn rates(rate: Decimal, max_rate: Decimal, max_change_rate: Decimal) -> CommissionRates {
    CommissionRates::new(rate, max_rate, max_change_rate)
}

fn validator(operator: ValidatorAddress, tokens: u64, shares: Decimal) -> Validator {
    Validator {
        operator,
        consensus_pubkey: [0; 32],
        tokens,
        delegator_shares: shares,
        description: Description::new("fixture", "", "", "", ""),
        commission: Commission::new(rates(dec!(0.1), dec!(0.2), dec!(0.01)), 0),
        min_self_delegation: 1,
    }
}

fn funded(seed: u64, count: usize, balance: u64) -> (Vec<SimAccount>, InMemoryChain) {
    let accounts = random_accounts(&mut sim_rng(seed), count);
    let chain = InMemoryChain::genesis(CHAIN_ID, &accounts, balance);
    (accounts, chain)
}

/// Dust delegation worth 3 tokens, where any 1..=3 token amount converts to
/// fewer shares than 18 fractional digits can hold, plus an empty second validator.
fn dust_chain(seed: u64) -> (Vec<SimAccount>, InMemoryChain) {
    let (accounts, mut chain) = funded(seed, 2, 1_000);
    let dust: ValidatorAddress = accounts[0].address.into();
    chain.insert_validator(validator(dust, 10_000_000_000_000_000_000, dec!(3)));
    chain.insert_delegation(accounts[1].address, dust, dec!(0.000000000000000001));
    chain.insert_validator(validator(ValidatorAddress::new([0x5a; 20]), 10, dec!(10)));
    (accounts, chain)
}

/// Funded accounts plus one validator whose exchange rate is undefined.
fn broken_chain(seed: u64, tokens: u64, shares: Decimal) -> (Vec<SimAccount>, InMemoryChain) {
    let (accounts, mut chain) = funded(seed, 3, 1_000);
    chain.insert_validator(validator(ValidatorAddress::new([0x5a; 20]), tokens, shares));
    (accounts, chain)
}

proptest! {
    #[test]
    fn delegating_to_broken_rate_is_noop(
        (tokens, shares) in arb_broken_stake(1_000_000),
        seed in any::<u64>(),
    ) {
        let (accounts, mut chain) = broken_chain(seed, tokens, shares);
        let outcome = run(OperationKind::Delegate, seed, &mut chain, &accounts);
        prop_assert!(outcome.is_noop(), "delegate returned {:?}", outcome);
        prop_assert!(chain.delivered().is_empty());
    }

    #[test]
    fn redelegating_to_broken_rate_is_noop(
        (tokens, shares) in arb_broken_stake(1_000_000),
        seed in any::<u64>(),
    ) {
        let (accounts, mut chain) = broken_chain(seed, tokens, shares);
        chain.bootstrap_validator(&accounts[0], 100, rates(dec!(0), dec!(0.1), dec!(0.1)));
        for offset in 0..8 {
            let outcome = run(OperationKind::BeginRedelegate, seed.wrapping_add(offset), &mut chain, &accounts);
            prop_assert!(outcome.is_noop(), "redelegate returned {:?}", outcome);
        }
        prop_assert!(chain.delivered().is_empty());
    }

    #[test]
    fn empty_bond_balance_is_noop(seed in any::<u64>(), count in 1_usize..4) {
        let (accounts, mut chain) = funded(seed, count, 0);
        chain.insert_validator(validator(ValidatorAddress::new([0x5a; 20]), 10, dec!(10)));
        for kind in [OperationKind::CreateValidator, OperationKind::Delegate] {
            let outcome = run(kind, seed, &mut chain, &accounts);
            prop_assert!(outcome.is_noop(), "{kind} returned {:?}", outcome);
        }
        prop_assert!(chain.delivered().is_empty());
    }

    #[test]
    fn no_validators_means_noop(seed in any::<u64>(), count in 1_usize..6, balance in 1_u64..1_000_000) {
        let (accounts, mut chain) = funded(seed, count, balance);
        for kind in [
            OperationKind::EditValidator,
            OperationKind::Delegate,
            OperationKind::Undelegate,
            OperationKind::BeginRedelegate,
        ] {
            let outcome = run(kind, seed, &mut chain, &accounts);
            prop_assert!(outcome.is_noop(), "{kind} returned {:?}", outcome);
        }
        prop_assert!(chain.delivered().is_empty());
    }

    #[test]
    fn bonded_principal_is_within_balance(genesis in arb_genesis(5), seed in any::<u64>()) {
        let Genesis { accounts, mut chain } = genesis;
        for (offset, kind) in [OperationKind::CreateValidator, OperationKind::Delegate]
            .into_iter()
            .enumerate()
        {
            let before = chain.clone();
            let outcome = run(kind, seed.wrapping_add(offset as u64), &mut chain, &accounts);
            prop_assert!(!outcome.is_error(), "{kind} failed: {:?}", outcome.error());
            match outcome.msg() {
                Some(msg) => {
                    let available = before.balance(&msg.signer(), "stake");
                    assert_principal_positive(&outcome);
                    assert_principal_within(&outcome, available);
                    assert_commission_within(&outcome, Decimal::ONE);
                }
                None => {
                    prop_assert_eq!(&chain, &before);
                }
            }
        }
    }

    #[test]
    fn random_walk_preserves_invariants(
        genesis in arb_genesis(6),
        seed in any::<u64>(),
        steps in 1_usize..40,
    ) {
        let Genesis { accounts, mut chain } = genesis;
        let supply = chain.total_bond_supply();
        let mut picker = sim_rng(seed);
        for step in 0..steps {
            let kind = OperationKind::ALL[picker.gen_range(0..OperationKind::ALL.len())];
            let before = chain.clone();
            let outcome = run(kind, seed ^ step as u64, &mut chain, &accounts);
            prop_assert!(!outcome.is_error(), "{kind} failed: {:?}", outcome.error());
            assert_principal_positive(&outcome);
            assert_distinct_redelegation(&outcome);
            if outcome.is_noop() {
                prop_assert_eq!(&chain, &before);
            }
            if step % 5 == 4 {
                chain.advance_block(COMMISSION_UPDATE_WINDOW_MS);
            }
        }
        assert_delegator_shares_match(&chain);
        assert_delegations_positive(&chain);
        assert_conserved("bond supply", supply, chain.total_bond_supply());
    }

    #[test]
    fn dust_amounts_are_never_delivered(seed in any::<u64>()) {
        let (accounts, chain) = dust_chain(seed);
        for kind in [OperationKind::Undelegate, OperationKind::BeginRedelegate] {
            let mut attempt = chain.clone();
            let outcome = run(kind, seed, &mut attempt, &accounts);
            prop_assert!(outcome.is_noop(), "{kind} returned {:?}", outcome);
            prop_assert!(attempt.delivered().is_empty());
        }
    }

    #[test]
    fn unregistered_delegator_is_an_error(seed in any::<u64>()) {
        let (accounts, mut chain) = funded(seed, 2, 1_000);
        let stranger = AccountAddress::new([0xab; 20]);
        let operator: ValidatorAddress = accounts[0].address.into();
        chain.insert_validator(validator(operator, 500, dec!(500)));
        chain.insert_delegation(stranger, operator, dec!(500));

        for kind in [OperationKind::Undelegate, OperationKind::BeginRedelegate] {
            let outcome = run(kind, seed, &mut chain, &accounts);
            prop_assert!(
                matches!(
                    outcome.error(),
                    Some(OperationError::UnknownSimAccount(address)) if *address == stranger
                ),
                "{kind} returned {:?}",
                outcome
            );
        }
    }

    #[test]
    fn same_seed_same_outcome(genesis in arb_genesis(4), seed in any::<u64>()) {
        for kind in OperationKind::ALL {
            let mut left = genesis.chain.clone();
            let mut right = genesis.chain.clone();
            let a = run(kind, seed, &mut left, &genesis.accounts);
            let b = run(kind, seed, &mut right, &genesis.accounts);
            prop_assert_eq!(a.record(), b.record());
            prop_assert_eq!(&left, &right);
        }
    }
}

#[test]
fn undelegation_never_exceeds_delegated_tokens() {
    let (accounts, mut chain) = funded(21, 2, 1_000);
    let operator: ValidatorAddress = accounts[0].address.into();
    chain.insert_validator(validator(operator, 1_000_000, dec!(1000000)));
    chain.insert_delegation(accounts[0].address, operator, dec!(500000));
    chain.insert_delegation(accounts[1].address, operator, dec!(500000));

    for seed in 0..200 {
        let mut attempt = chain.clone();
        let outcome = run(OperationKind::Undelegate, seed, &mut attempt, &accounts);
        let Some(StakingMsg::Undelegate(msg)) = outcome.msg() else {
            panic!("seed {seed}: expected undelegation, got {:?}", outcome);
        };
        assert!(msg.amount.amount > 0 && msg.amount.amount <= 500_000);
    }
}

#[test]
fn edited_rate_respects_existing_max_rate() {
    let (accounts, mut chain) = funded(31, 1, 1_000);
    chain.bootstrap_validator(&accounts[0], 100, rates(dec!(0.10), dec!(0.45), dec!(0.45)));
    chain.advance_block(COMMISSION_UPDATE_WINDOW_MS);

    for seed in 0..200 {
        let mut attempt = chain.clone();
        let outcome = run(OperationKind::EditValidator, seed, &mut attempt, &accounts);
        let Some(StakingMsg::EditValidator(msg)) = outcome.msg() else {
            panic!("seed {seed}: expected edit, got {:?}", outcome);
        };
        let rate = msg.commission_rate.unwrap();
        assert!(rate >= Decimal::ZERO && rate <= dec!(0.45), "rate {rate}");
        assert_eq!(msg.min_self_delegation, None);
    }
}

#[test]
fn edit_inside_update_window_is_skipped() {
    let (accounts, mut chain) = funded(32, 1, 1_000);
    chain.bootstrap_validator(&accounts[0], 100, rates(dec!(0.10), dec!(0.45), dec!(0.45)));
    for seed in 0..50 {
        assert!(run(OperationKind::EditValidator, seed, &mut chain, &accounts).is_noop());
    }
}

#[test]
fn unregistered_operator_is_an_error() {
    let (accounts, mut chain) = funded(33, 1, 1_000);
    let operator = ValidatorAddress::new([0xcd; 20]);
    chain.insert_validator(validator(operator, 10, dec!(10)));
    let outcome = run(OperationKind::EditValidator, 1, &mut chain, &accounts);
    assert!(matches!(
        outcome.error(),
        Some(OperationError::UnknownSimAccount(address)) if *address == AccountAddress::from(operator)
    ));
}

#[test]
fn created_commission_stays_under_its_max() {
    for seed in 0..100 {
        let (accounts, mut chain) = funded(seed, 1, 1_000_000);
        let header = chain.header().clone();
        let config = GeneratorConfig::default();
        let ctx = SimContext::new(&accounts, &header, &config);
        let outcome = simulate_msg_create_validator(&mut sim_rng(seed), &mut chain, &ctx);
        let Some(StakingMsg::CreateValidator(msg)) = outcome.msg() else {
            panic!("seed {seed}: expected creation, got {:?}", outcome);
        };
        assert!(msg.commission.rate <= msg.commission.max_rate);
        assert!(msg.commission.max_change_rate <= msg.commission.max_rate);
        assert!(msg.commission.max_rate <= Decimal::ONE);
        assert_eq!(msg.description.moniker.len(), 10);
    }
}

#[test]
fn existing_operator_cannot_create_again() {
    let (accounts, mut chain) = funded(34, 1, 1_000);
    chain.bootstrap_validator(&accounts[0], 100, rates(dec!(0), dec!(0.1), dec!(0.1)));
    for seed in 0..20 {
        assert!(run(OperationKind::CreateValidator, seed, &mut chain, &accounts).is_noop());
    }
}

#[test]
fn delivery_failure_is_an_error() {
    let (accounts, mut chain) = funded(41, 1, 1_000);
    chain.bootstrap_validator(&accounts[0], 100, rates(dec!(0), dec!(0.1), dec!(0.1)));
    chain.fail_next_delivery("out of gas");
    let header = chain.header().clone();
    let config = GeneratorConfig::default();
    let ctx = SimContext::new(&accounts, &header, &config);
    let outcome = simulate_msg_delegate(&mut sim_rng(1), &mut chain, &ctx);
    assert!(matches!(
        outcome.error(),
        Some(OperationError::Delivery { log }) if log == "out of gas"
    ));
    assert!(outcome.record().comment.contains("out of gas"));
}

#[test]
fn signer_without_ledger_account_is_an_error() {
    let accounts = random_accounts(&mut sim_rng(42), 1);
    let mut chain = InMemoryChain::new(CHAIN_ID, StakingParams::default());
    let operator = ValidatorAddress::new([0xee; 20]);
    chain.insert_validator(validator(operator, 10, dec!(10)));
    chain.insert_delegation(accounts[0].address, operator, dec!(10));
    let outcome = run(OperationKind::Undelegate, 3, &mut chain, &accounts);
    assert!(matches!(
        outcome.error(),
        Some(OperationError::MissingLedgerAccount(address)) if *address == accounts[0].address
    ));
}

#[test]
fn max_unbonding_entries_skip() {
    let (accounts, mut chain) = funded(43, 1, 1_000);
    chain.bootstrap_validator(&accounts[0], 100, rates(dec!(0), dec!(0.1), dec!(0.1)));
    let operator: ValidatorAddress = accounts[0].address.into();
    chain.add_unbonding_entries(accounts[0].address, operator, 7);
    for seed in 0..20 {
        assert!(run(OperationKind::Undelegate, seed, &mut chain, &accounts).is_noop());
    }
}

#[test]
fn pending_incoming_redelegation_skips() {
    let (accounts, mut chain) = funded(44, 2, 1_000);
    for account in &accounts {
        chain.bootstrap_validator(account, 100, rates(dec!(0), dec!(0.1), dec!(0.1)));
    }
    let a: ValidatorAddress = accounts[0].address.into();
    let b: ValidatorAddress = accounts[1].address.into();
    chain.add_redelegation_entries(accounts[0].address, b, a, 1);
    chain.add_redelegation_entries(accounts[1].address, a, b, 1);
    for seed in 0..50 {
        assert!(run(OperationKind::BeginRedelegate, seed, &mut chain, &accounts).is_noop());
    }
}

#[test]
fn max_redelegation_entries_skip() {
    let (accounts, mut chain) = funded(45, 2, 1_000);
    for account in &accounts {
        chain.bootstrap_validator(account, 100, rates(dec!(0), dec!(0.1), dec!(0.1)));
    }
    let a: ValidatorAddress = accounts[0].address.into();
    let b: ValidatorAddress = accounts[1].address.into();
    let cap = usize::from(chain.staking_params().max_entries);
    chain.add_redelegation_entries(accounts[0].address, a, b, cap);
    chain.add_redelegation_entries(accounts[1].address, b, a, cap);
    for seed in 0..50 {
        assert!(run(OperationKind::BeginRedelegate, seed, &mut chain, &accounts).is_noop());
    }
    assert!(chain.delivered().is_empty());
}

#[test]
fn sub_precision_max_rate_edits_to_zero() {
    let (accounts, mut chain) = funded(35, 1, 1_000);
    let tiny = Decimal::new(1, 19);
    chain.bootstrap_validator(&accounts[0], 100, rates(Decimal::ZERO, tiny, tiny));
    chain.advance_block(COMMISSION_UPDATE_WINDOW_MS);

    for seed in 0..50 {
        let mut attempt = chain.clone();
        let outcome = run(OperationKind::EditValidator, seed, &mut attempt, &accounts);
        let Some(StakingMsg::EditValidator(msg)) = outcome.msg() else {
            panic!("seed {seed}: expected edit, got {:?}", outcome);
        };
        assert_eq!(msg.commission_rate, Some(Decimal::ZERO));
    }
}
