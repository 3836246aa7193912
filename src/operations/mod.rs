//! The five staking operation generators.

mod create_validator;
mod delegate;
mod edit_validator;
mod redelegate;
mod undelegate;

use rand::Rng;

pub use create_validator::{CreateValidator, CreateValidatorSelection};
pub use delegate::{Delegate, DelegateSelection};
pub use edit_validator::EditValidator;
pub use redelegate::{BeginRedelegate, RedelegateSelection};
pub use undelegate::{Undelegate, UndelegateSelection};

use crate::keeper::{SimApp, StakingKeeper};
use crate::operation::{Halt, OperationKind, OperationOutcome, SimContext, SkipReason, simulate};
use crate::random::{rand_positive_int, rand_string_of_length};
use crate::staking::{Delegation, Description, Validator};

/// Five independent random strings.
pub(crate) fn random_description<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Description {
    Description::new(
        rand_string_of_length(rng, len),
        rand_string_of_length(rng, len),
        rand_string_of_length(rng, len),
        rand_string_of_length(rng, len),
        rand_string_of_length(rng, len),
    )
}

/// Uniformly random delegation held in `validator`.
pub(crate) fn random_delegation<K, R>(
    rng: &mut R,
    chain: &K,
    validator: &Validator,
) -> Result<Delegation, SkipReason>
where
    K: StakingKeeper + ?Sized,
    R: Rng + ?Sized,
{
    let mut delegations = chain.validator_delegations(&validator.operator());
    if delegations.is_empty() {
        return Err(SkipReason::NoDelegations);
    }
    let index = rng.gen_range(0..delegations.len());
    Ok(delegations.swap_remove(index))
}

/// Random positive amount bounded by the whole tokens `delegation` is worth.
pub(crate) fn draw_bonded_amount<R: Rng + ?Sized>(
    rng: &mut R,
    validator: &Validator,
    delegation: &Delegation,
) -> Result<u64, Halt> {
    let total_bond = validator.truncated_tokens_from_shares(delegation.shares)?;
    if total_bond == 0 {
        return Err(SkipReason::ZeroBond.into());
    }
    let amount = rand_positive_int(rng, total_bond)?;
    if amount == 0 {
        return Err(SkipReason::ZeroAmount.into());
    }
    Ok(amount)
}

/// Skip amounts whose tokens → shares → tokens round trip truncates to nothing.
pub(crate) fn ensure_round_trip(validator: &Validator, amount: u64) -> Result<(), Halt> {
    let shares = validator.shares_from_tokens(amount)?;
    if validator.truncated_tokens_from_shares(shares)? == 0 {
        return Err(SkipReason::SharesTruncateToZero.into());
    }
    Ok(())
}

impl OperationKind {
    /// Run the generator for this kind once.
    pub fn simulate<C, R>(
        &self,
        rng: &mut R,
        chain: &mut C,
        ctx: &SimContext<'_>,
    ) -> OperationOutcome
    where
        C: SimApp + ?Sized,
        R: Rng + ?Sized,
    {
        match self {
            Self::CreateValidator => simulate(&CreateValidator, rng, chain, ctx),
            Self::EditValidator => simulate(&EditValidator, rng, chain, ctx),
            Self::Delegate => simulate(&Delegate, rng, chain, ctx),
            Self::Undelegate => simulate(&Undelegate, rng, chain, ctx),
            Self::BeginRedelegate => simulate(&BeginRedelegate, rng, chain, ctx),
        }
    }
}

/// Generate and deliver a random create-validator message.
pub fn simulate_msg_create_validator<C, R>(
    rng: &mut R,
    chain: &mut C,
    ctx: &SimContext<'_>,
) -> OperationOutcome
where
    C: SimApp + ?Sized,
    R: Rng + ?Sized,
{
    simulate(&CreateValidator, rng, chain, ctx)
}

/// Generate and deliver a random edit-validator message.
pub fn simulate_msg_edit_validator<C, R>(
    rng: &mut R,
    chain: &mut C,
    ctx: &SimContext<'_>,
) -> OperationOutcome
where
    C: SimApp + ?Sized,
    R: Rng + ?Sized,
{
    simulate(&EditValidator, rng, chain, ctx)
}

/// Generate and deliver a random delegate message.
pub fn simulate_msg_delegate<C, R>(
    rng: &mut R,
    chain: &mut C,
    ctx: &SimContext<'_>,
) -> OperationOutcome
where
    C: SimApp + ?Sized,
    R: Rng + ?Sized,
{
    simulate(&Delegate, rng, chain, ctx)
}

/// Generate and deliver a random undelegate message.
pub fn simulate_msg_undelegate<C, R>(
    rng: &mut R,
    chain: &mut C,
    ctx: &SimContext<'_>,
) -> OperationOutcome
where
    C: SimApp + ?Sized,
    R: Rng + ?Sized,
{
    simulate(&Undelegate, rng, chain, ctx)
}

/// Generate and deliver a random begin-redelegate message.
pub fn simulate_msg_begin_redelegate<C, R>(
    rng: &mut R,
    chain: &mut C,
    ctx: &SimContext<'_>,
) -> OperationOutcome
where
    C: SimApp + ?Sized,
    R: Rng + ?Sized,
{
    simulate(&BeginRedelegate, rng, chain, ctx)
}

#[cfg(all(test, feature = "testing"))]
mod tests;
