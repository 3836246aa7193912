//! Begin-redelegate generator.

use rand::Rng;

use super::{draw_bonded_amount, ensure_round_trip, random_delegation};
use crate::address::AccountAddress;
use crate::coins::Coin;
use crate::keeper::{AccountKeeper, StakingKeeper, random_validator};
use crate::msgs::{MsgBeginRedelegate, StakingMsg};
use crate::operation::{Draft, Halt, OperationKind, OperationStrategy, SimContext, SkipReason};
use crate::staking::{Delegation, Validator};

/// Moves part of a random delegation to another random validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeginRedelegate;

/// Source validator, one of its delegations and the destination.
#[derive(Debug, Clone)]
pub struct RedelegateSelection {
    /// Source validator.
    pub src: Validator,
    /// Delegation moved.
    pub delegation: Delegation,
    /// Destination validator, sampled independently of the source.
    pub dst: Validator,
}

impl OperationStrategy for BeginRedelegate {
    type Selection = RedelegateSelection;

    fn kind(&self) -> OperationKind {
        OperationKind::BeginRedelegate
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
        let src = random_validator(rng, chain).ok_or(SkipReason::NoValidators)?;
        let delegation = random_delegation(rng, chain, &src)?;
        let dst = random_validator(rng, chain).ok_or(SkipReason::NoValidators)?;
        Ok(RedelegateSelection {
            src,
            delegation,
            dst,
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
        let src = selection.src.operator();
        let dst = selection.dst.operator();
        if chain.has_receiving_redelegation(&selection.delegation.delegator, &src) {
            return Err(SkipReason::ReceivingRedelegation);
        }
        if src == dst {
            return Err(SkipReason::SelfRedelegation);
        }
        if selection.dst.invalid_ex_rate() {
            return Err(SkipReason::InvalidExchangeRate);
        }
        if chain.has_max_redelegation_entries(&selection.delegation.delegator, &src, &dst) {
            return Err(SkipReason::MaxRedelegationEntries);
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
        let src = &selection.src;
        let amount = draw_bonded_amount(rng, src, &selection.delegation)?;
        ensure_round_trip(src, amount)?;

        let msg = StakingMsg::BeginRedelegate(MsgBeginRedelegate {
            delegator_address: selection.delegation.delegator,
            validator_src_address: src.operator(),
            validator_dst_address: selection.dst.operator(),
            amount: Coin::new(chain.bond_denom(), amount),
        });
        Ok(Draft { msg, reserved: None })
    }
}
