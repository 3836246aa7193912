//! Edit-validator generator.

use rand::Rng;

use super::random_description;
use crate::address::AccountAddress;
use crate::keeper::{AccountKeeper, StakingKeeper, random_validator};
use crate::msgs::{MsgEditValidator, StakingMsg};
use crate::operation::{Draft, Halt, OperationKind, OperationStrategy, SimContext, SkipReason};
use crate::random::random_dec_amount;
use crate::staking::Validator;

/// Changes a random validator's commission rate and description.
///
/// The new rate is bounded by the validator's own max-rate; draws the
/// commission-change rule rejects are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditValidator;

impl OperationStrategy for EditValidator {
    type Selection = Validator;

    fn kind(&self) -> OperationKind {
        OperationKind::EditValidator
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
        random_validator(rng, chain).ok_or(SkipReason::NoValidators)
    }

    fn signer(&self, validator: &Self::Selection) -> AccountAddress {
        validator.operator().into()
    }

    fn draft<C, R>(
        &self,
        rng: &mut R,
        _chain: &C,
        ctx: &SimContext<'_>,
        validator: &Self::Selection,
    ) -> Result<Draft, Halt>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
        R: Rng + ?Sized,
    {
        let new_rate = random_dec_amount(rng, validator.commission.rates.max_rate);
        if validator
            .commission
            .validate_new_rate(new_rate, ctx.header.time_ms)
            .is_err()
        {
            return Err(SkipReason::InvalidCommissionChange.into());
        }

        let msg = StakingMsg::EditValidator(MsgEditValidator {
            description: random_description(rng, ctx.config.description_len),
            validator_address: validator.operator(),
            commission_rate: Some(new_rate),
            min_self_delegation: None,
        });
        Ok(Draft { msg, reserved: None })
    }
}
