//! Delegate generator.

use rand::Rng;

use crate::address::AccountAddress;
use crate::coins::Coin;
use crate::keeper::{AccountKeeper, StakingKeeper, random_validator};
use crate::msgs::{MsgDelegate, StakingMsg};
use crate::operation::{Draft, Halt, OperationKind, OperationStrategy, SimContext, SkipReason};
use crate::random::{rand_positive_int, random_acc};
use crate::staking::Validator;

/// Bonds part of a random account's balance to a random validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delegate;

/// Delegator and target validator.
#[derive(Debug, Clone)]
pub struct DelegateSelection {
    /// Delegating account.
    pub delegator: AccountAddress,
    /// Target validator.
    pub validator: Validator,
}

impl OperationStrategy for Delegate {
    type Selection = DelegateSelection;

    fn kind(&self) -> OperationKind {
        OperationKind::Delegate
    }

    fn select<C, R>(
        &self,
        rng: &mut R,
        chain: &C,
        ctx: &SimContext<'_>,
    ) -> Result<Self::Selection, SkipReason>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
        R: Rng + ?Sized,
    {
        if chain.validators().is_empty() {
            return Err(SkipReason::NoValidators);
        }
        let delegator = random_acc(rng, ctx.accounts)
            .ok_or(SkipReason::NoAccounts)?
            .address;
        let validator = random_validator(rng, chain).ok_or(SkipReason::NoValidators)?;
        Ok(DelegateSelection {
            delegator,
            validator,
        })
    }

    fn signer(&self, selection: &Self::Selection) -> AccountAddress {
        selection.delegator
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
        if selection.validator.invalid_ex_rate() {
            return Err(SkipReason::InvalidExchangeRate);
        }
        if chain.balance(&selection.delegator, &chain.bond_denom()) == 0 {
            return Err(SkipReason::NoBondBalance);
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
        let denom = chain.bond_denom();
        let balance = chain.balance(&selection.delegator, &denom);
        let bond = Coin::new(denom, rand_positive_int(rng, balance)?);

        let msg = StakingMsg::Delegate(MsgDelegate {
            delegator_address: selection.delegator,
            validator_address: selection.validator.operator(),
            amount: bond.clone(),
        });
        Ok(Draft {
            msg,
            reserved: Some(bond),
        })
    }
}
