//! Validator stake strategies.

use proptest::prelude::*;
use rust_decimal::Decimal;

/// Generate a tokens-per-share style ratio in `[0.50, 2.00]`.
pub fn arb_exchange_rate() -> impl Strategy<Value = Decimal> {
    (50_i64..=200).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate `(tokens, delegator_shares)` pairs with a defined exchange rate.
///
/// Both sides are positive, so the pair never trips the invalid-rate guard.
pub fn arb_validator_stake(max_tokens: u64) -> impl Strategy<Value = (u64, Decimal)> {
    assert!(max_tokens > 0, "max_tokens must be positive");
    (1..=max_tokens, arb_exchange_rate())
        .prop_map(|(tokens, ratio)| (tokens, Decimal::from(tokens) * ratio))
}

/// Generate an exchange-rate-breaking pair: exactly one side is zero.
pub fn arb_broken_stake(max_tokens: u64) -> impl Strategy<Value = (u64, Decimal)> {
    assert!(max_tokens > 0, "max_tokens must be positive");
    prop_oneof![
        (1..=max_tokens).prop_map(|tokens| (tokens, Decimal::ZERO)),
        (1..=max_tokens).prop_map(|shares| (0, Decimal::from(shares))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ValidatorAddress;
    use crate::staking::{Commission, CommissionRates, Description, Validator};

    fn validator(tokens: u64, shares: Decimal) -> Validator {
        Validator {
            operator: ValidatorAddress::new([9; 20]),
            consensus_pubkey: [0; 32],
            tokens,
            delegator_shares: shares,
            description: Description::default(),
            commission: Commission::new(
                CommissionRates::new(Decimal::ZERO, Decimal::ONE, Decimal::ONE),
                0,
            ),
            min_self_delegation: 1,
        }
    }

    proptest! {
        #[test]
        fn generated_stakes_have_valid_rate((tokens, shares) in arb_validator_stake(1_000_000)) {
            prop_assert!(!validator(tokens, shares).invalid_ex_rate());
        }

        #[test]
        fn broken_stakes_have_invalid_rate((tokens, shares) in arb_broken_stake(1_000_000)) {
            prop_assert!(validator(tokens, shares).invalid_ex_rate());
        }
    }
}
