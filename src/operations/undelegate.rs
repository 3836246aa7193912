//! Undelegate generator.

use rand::Rng;

use super::{draw_bonded_amount, ensure_round_trip, random_delegation};
use crate::address::AccountAddress;
use crate::coins::Coin;
use crate::keeper::{AccountKeeper, StakingKeeper, random_validator};
use crate::msgs::{MsgUndelegate, StakingMsg};
use crate::operation::{Draft, Halt, OperationKind, OperationStrategy, SimContext, SkipReason};
use crate::staking::{Delegation, Validator};

/// Unbonds part of a random existing delegation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Undelegate;

/// Validator and one of its delegations.
#[derive(Debug, Clone)]
pub struct UndelegateSelection {
    /// Validator unbonded from.
    pub validator: Validator,
    /// Delegation unbonded.
    pub delegation: Delegation,
}

impl OperationStrategy for Undelegate {
    type Selection = UndelegateSelection;

    fn kind(&self) -> OperationKind {
        OperationKind::Undelegate
    }

    fn select<C, R>(
        &self,
        rng: &mut R,
        chain: &C,
        _ctx: &SimContext<'_>,
    ) -> Result<Self::Selection, SkipReason>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
        R: Rng + ?Sized,
    {
        let validator = random_validator(rng, chain).ok_or(SkipReason::NoValidators)?;
        let delegation = random_delegation(rng, chain, &validator)?;
        Ok(UndelegateSelection {
            validator,
            delegation,
        })
    }

    fn signer(&self, selection: &Self::Selection) -> AccountAddress {
        selection.delegation.delegator
    }

    fn admit<C>(
        &self,
        chain: &C,
        _ctx: &SimContext<'_>,
        selection: &Self::Selection,
    ) -> Result<(), SkipReason>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
    {
        if chain.has_max_unbonding_entries(
            &selection.delegation.delegator,
            &selection.validator.operator(),
        ) {
            return Err(SkipReason::MaxUnbondingEntries);
        }
        Ok(())
    }

    fn draft<C, R>(
        &self,
        rng: &mut R,
        chain: &C,
        _ctx: &SimContext<'_>,
        selection: &Self::Selection,
    ) -> Result<Draft, Halt>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
        R: Rng + ?Sized,
    {
        let amount = draw_bonded_amount(rng, &selection.validator, &selection.delegation)?;
        ensure_round_trip(&selection.validator, amount)?;
        let msg = StakingMsg::Undelegate(MsgUndelegate {
            delegator_address: selection.delegation.delegator,
            validator_address: selection.validator.operator(),
            amount: Coin::new(chain.bond_denom(), amount),
        });
        Ok(Draft { msg, reserved: None })
    }
}
