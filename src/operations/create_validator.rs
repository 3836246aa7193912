//! Create-validator generator.

use rand::Rng;
use rust_decimal::Decimal;

use super::random_description;
use crate::address::{AccountAddress, ValidatorAddress};
use crate::coins::Coin;
use crate::keeper::{AccountKeeper, StakingKeeper};
use crate::msgs::{MsgCreateValidator, StakingMsg};
use crate::operation::{Draft, Halt, OperationKind, OperationStrategy, SimContext, SkipReason};
use crate::random::{rand_int_between, rand_positive_int, random_acc, random_dec_amount};
use crate::staking::CommissionRates;

/// Registers a random simulation account as a validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateValidator;

/// Account chosen to become a validator.
#[derive(Debug, Clone)]
pub struct CreateValidatorSelection {
    /// Operator account.
    pub account: AccountAddress,
    /// Consensus key bytes.
    pub pub_key: [u8; 32],
}

impl OperationStrategy for CreateValidator {
    type Selection = CreateValidatorSelection;

    fn kind(&self) -> OperationKind {
        OperationKind::CreateValidator
    }

    fn select<C, R>(
        &self,
        rng: &mut R,
        _chain: &C,
        ctx: &SimContext<'_>,
    ) -> Result<Self::Selection, SkipReason>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
        R: Rng + ?Sized,
    {
        let account = random_acc(rng, ctx.accounts).ok_or(SkipReason::NoAccounts)?;
        Ok(CreateValidatorSelection {
            account: account.address,
            pub_key: account.pub_key.to_bytes(),
        })
    }

    fn signer(&self, selection: &Self::Selection) -> AccountAddress {
        selection.account
    }

    fn admit<C>(
        &self,
        chain: &C,
        ctx: &SimContext<'_>,
        selection: &Self::Selection,
    ) -> Result<(), SkipReason>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
    {
        if chain
            .validator(&ValidatorAddress::from(selection.account))
            .is_some()
        {
            return Err(SkipReason::ValidatorExists);
        }
        let balance = chain.balance(&selection.account, &chain.bond_denom());
        if balance == 0 || balance < ctx.config.min_self_delegation {
            return Err(SkipReason::NoBondBalance);
        }
        Ok(())
    }

    fn draft<C, R>(
        &self,
        rng: &mut R,
        chain: &C,
        ctx: &SimContext<'_>,
        selection: &Self::Selection,
    ) -> Result<Draft, Halt>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
        R: Rng + ?Sized,
    {
        let denom = chain.bond_denom();
        let balance = chain.balance(&selection.account, &denom);
        let floor = ctx.config.min_self_delegation.max(1);
        let amount = floor - 1 + rand_positive_int(rng, balance.saturating_sub(floor) + 1)?;
        let self_delegation = Coin::new(denom, amount);

        let description = random_description(rng, ctx.config.description_len);

        let percent = rand_int_between(rng, 0, i64::from(ctx.config.max_commission_percent) + 1)?;
        let max_rate = Decimal::new(percent, 2);
        let commission = CommissionRates::new(
            random_dec_amount(rng, max_rate),
            max_rate,
            random_dec_amount(rng, max_rate),
        );

        let msg = StakingMsg::CreateValidator(MsgCreateValidator {
            description,
            commission,
            min_self_delegation: floor,
            delegator_address: selection.account,
            validator_address: ValidatorAddress::from(selection.account),
            pubkey: selection.pub_key,
            value: self_delegation.clone(),
        });
        Ok(Draft {
            msg,
            reserved: Some(self_delegation),
        })
    }
}
