//! Staking state invariants checked through the keeper traits.

use std::fmt::Debug;

use rust_decimal::Decimal;

use crate::keeper::StakingKeeper;

/// Assert every validator has issued exactly the shares its delegations hold.
pub fn assert_delegator_shares_match<K>(keeper: &K)
where
    K: StakingKeeper + ?Sized,
{
    for validator in keeper.validators() {
        let held: Decimal = keeper
            .validator_delegations(&validator.operator())
            .iter()
            .map(|delegation| delegation.shares)
            .sum();
        assert_eq!(
            held,
            validator.delegator_shares,
            "validator {} issued {} shares but delegations hold {}",
            validator.operator(),
            validator.delegator_shares,
            held
        );
    }
}

/// Assert no delegation holds a non-positive share balance.
pub fn assert_delegations_positive<K>(keeper: &K)
where
    K: StakingKeeper + ?Sized,
{
    for validator in keeper.validators() {
        for delegation in keeper.validator_delegations(&validator.operator()) {
            assert!(
                delegation.shares > Decimal::ZERO,
                "delegation {:?} holds non-positive shares",
                delegation
            );
        }
    }
}

/// Assert a conserved quantity did not change.
pub fn assert_conserved<T>(label: &str, before: T, after: T)
where
    T: PartialEq + Debug,
{
    assert_eq!(before, after, "{label} is not conserved");
}
