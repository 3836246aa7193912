//! Whole-chain starting states built on [`InMemoryChain`].

use proptest::prelude::*;

use super::commission::arb_commission_rates;
use crate::account::{SimAccount, random_accounts};
use crate::random::sim_rng;
use crate::staking::CommissionRates;
use crate::testing::InMemoryChain;

/// Chain id used by generated genesis states.
pub const GENESIS_CHAIN_ID: &str = "sim-chain";

/// Parameters of a generated starting state.
#[derive(Debug, Clone)]
pub struct GenesisParams {
    /// Seed for account keys.
    pub seed: u64,
    /// Number of simulation accounts.
    pub accounts: usize,
    /// Bond-denom balance of every account.
    pub initial_balance: u64,
    /// Self-bond of each genesis validator.
    pub self_bond: u64,
    /// Commission of each genesis validator; its length is the validator count.
    pub validators: Vec<CommissionRates>,
}

/// A built starting state.
#[derive(Debug, Clone)]
pub struct Genesis {
    /// Simulation-account registry.
    pub accounts: Vec<SimAccount>,
    /// Chain state.
    pub chain: InMemoryChain,
}

impl GenesisParams {
    /// Build the accounts and chain.
    ///
    /// The first `validators.len()` accounts operate the genesis validators.
    pub fn build(&self) -> Genesis {
        let accounts = random_accounts(&mut sim_rng(self.seed), self.accounts);
        let mut chain = InMemoryChain::genesis(GENESIS_CHAIN_ID, &accounts, self.initial_balance);
        for (operator, rates) in accounts.iter().zip(&self.validators) {
            chain.bootstrap_validator(operator, self.self_bond, *rates);
        }
        Genesis { accounts, chain }
    }
}

/// Generate genesis parameters with up to `max_accounts` accounts.
///
/// Balances stay below one billion so share sums keep full 18-digit precision.
pub fn arb_genesis_params(max_accounts: usize) -> impl Strategy<Value = GenesisParams> {
    assert!(max_accounts > 0, "max_accounts must be positive");
    (any::<u64>(), 1..=max_accounts, 1_u64..=1_000_000_000)
        .prop_flat_map(|(seed, accounts, initial_balance)| {
            (
                Just(seed),
                Just(accounts),
                Just(initial_balance),
                1..=initial_balance,
                proptest::collection::vec(arb_commission_rates(), 0..=accounts),
            )
        })
        .prop_map(
            |(seed, accounts, initial_balance, self_bond, validators)| GenesisParams {
                seed,
                accounts,
                initial_balance,
                self_bond,
                validators,
            },
        )
}

/// Generate built genesis states.
pub fn arb_genesis(max_accounts: usize) -> impl Strategy<Value = Genesis> {
    arb_genesis_params(max_accounts).prop_map(|params| params.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::StakingKeeper;

    proptest! {
        #[test]
        fn genesis_validators_match_params(params in arb_genesis_params(5)) {
            let genesis = params.build();
            prop_assert_eq!(genesis.accounts.len(), params.accounts);
            prop_assert_eq!(genesis.chain.validators().len(), params.validators.len());
            for validator in genesis.chain.validators() {
                prop_assert_eq!(validator.tokens, params.self_bond);
            }
        }
    }
}
