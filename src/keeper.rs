//! Capabilities the generators consume from the surrounding chain.
//!
//! Generators only read through [`AccountKeeper`] and [`StakingKeeper`] and
//! write through [`TxDeliverer`]; the harness owns the state behind them.

use rand::Rng;

use crate::address::{AccountAddress, ValidatorAddress};
use crate::coins::Coins;
use crate::staking::{Delegation, StakingParams, Validator};
use crate::tx::{DeliverResult, SimTx};

/// Ledger metadata needed to authorize a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    /// Account number.
    pub account_number: u64,
    /// Next transaction sequence.
    pub sequence: u64,
}

/// Read access to account balances.
pub trait AccountKeeper {
    /// Ledger metadata, `None` when the account does not exist.
    fn account(&self, address: &AccountAddress) -> Option<AccountInfo>;

    /// Total balance held in `denom`, including locked coins.
    fn balance(&self, address: &AccountAddress, denom: &str) -> u64;

    /// Coins spendable at `time_ms`.
    fn spendable_coins(&self, address: &AccountAddress, time_ms: i64) -> Coins;
}

/// Read access to staking state.
pub trait StakingKeeper {
    /// Module parameters.
    fn params(&self) -> StakingParams;

    /// Validator registered at `operator`.
    fn validator(&self, operator: &ValidatorAddress) -> Option<Validator>;

    /// All validators in a stable order.
    fn validators(&self) -> Vec<Validator>;

    /// Delegations held in `operator`.
    fn validator_delegations(&self, operator: &ValidatorAddress) -> Vec<Delegation>;

    /// True when `(delegator, validator)` has no room for another unbonding entry.
    fn has_max_unbonding_entries(
        &self,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
    ) -> bool;

    /// True when `(delegator, src, dst)` has no room for another redelegation entry.
    fn has_max_redelegation_entries(
        &self,
        delegator: &AccountAddress,
        src: &ValidatorAddress,
        dst: &ValidatorAddress,
    ) -> bool;

    /// True when `delegator` has an unfinished redelegation whose destination is `validator`.
    fn has_receiving_redelegation(
        &self,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
    ) -> bool;

    /// Bonding denomination.
    fn bond_denom(&self) -> String {
        self.params().bond_denom
    }
}

/// Submits signed transactions against current state.
pub trait TxDeliverer {
    /// Execute `tx`; a failed result carries the diagnostic log.
    fn deliver(&mut self, tx: &SimTx) -> DeliverResult;
}

/// Everything a generator needs from the chain.
pub trait SimApp: AccountKeeper + StakingKeeper + TxDeliverer {}

impl<T: AccountKeeper + StakingKeeper + TxDeliverer + ?Sized> SimApp for T {}

/// Pick a uniformly random existing validator.
pub fn random_validator<K, R>(rng: &mut R, keeper: &K) -> Option<Validator>
where
    K: StakingKeeper + ?Sized,
    R: Rng + ?Sized,
{
    let mut validators = keeper.validators();
    if validators.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..validators.len());
    Some(validators.swap_remove(index))
}
