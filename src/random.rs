//! Randomness utilities shared by the operation generators.
//!
//! Every helper draws from a caller-supplied generator so a whole simulation
//! run is reproducible from a single seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::account::SimAccount;
use crate::coins::{Coin, Coins};
use crate::staking::DEC_PRECISION;

/// Seedable generator used by simulation runs.
pub type SimRng = ChaCha8Rng;

/// Build the run-wide generator for `seed`.
pub fn sim_rng(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Failures of bounded random generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomError {
    /// Upper bound for a positive draw was zero.
    #[error("max too small: cannot draw a positive integer below {0}")]
    NonPositiveBound(u64),
    /// The coin chosen for fees had no amount.
    #[error("no coins found for random fees")]
    NoFeeCoins,
    /// Empty or inverted integer range.
    #[error("invalid range [{min}, {max})")]
    InvalidRange {
        /// Inclusive lower bound.
        min: i64,
        /// Exclusive upper bound.
        max: i64,
    },
}

/// Draw uniformly from `[1, max]`.
pub fn rand_positive_int<R: Rng + ?Sized>(rng: &mut R, max: u64) -> Result<u64, RandomError> {
    if max == 0 {
        return Err(RandomError::NonPositiveBound(max));
    }
    Ok(rng.gen_range(1..=max))
}

/// Draw uniformly from `[min, max)`.
pub fn rand_int_between<R: Rng + ?Sized>(
    rng: &mut R,
    min: i64,
    max: i64,
) -> Result<i64, RandomError> {
    if max <= min {
        return Err(RandomError::InvalidRange { min, max });
    }
    Ok(rng.gen_range(min..max))
}

/// Random string of ASCII letters with exactly `len` characters.
pub fn rand_string_of_length<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// Random decimal in `[0, max]` at 18-digit precision.
///
/// One draw in ten yields zero, one in ten yields `max` exactly, the rest are
/// uniform in `[0, max)`. `max` is truncated to 18 fractional digits first,
/// so a `max` that truncates to zero (including any non-positive one) always
/// yields zero.
pub fn random_dec_amount<R: Rng + ?Sized>(rng: &mut R, max: Decimal) -> Decimal {
    let truncated = max.round_dp_with_strategy(DEC_PRECISION, RoundingStrategy::ToZero);
    if truncated <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut scaled = truncated;
    scaled.rescale(DEC_PRECISION);
    let bound = scaled.mantissa();
    let pick = match rng.gen_range(0..10) {
        0 => 0,
        1 => bound,
        _ => rng.gen_range(0..bound),
    };
    Decimal::from_i128_with_scale(pick, scaled.scale())
}

/// Pick a uniformly random simulation account.
pub fn random_acc<'a, R: Rng + ?Sized>(
    rng: &mut R,
    accounts: &'a [SimAccount],
) -> Option<&'a SimAccount> {
    if accounts.is_empty() {
        return None;
    }
    accounts.get(rng.gen_range(0..accounts.len()))
}

/// Random fee drawn from one uniformly chosen denomination of `spendable`.
///
/// An empty set yields no fee.
pub fn random_fees<R: Rng + ?Sized>(rng: &mut R, spendable: &Coins) -> Result<Coins, RandomError> {
    if spendable.is_empty() {
        return Ok(Coins::empty());
    }
    let coins = spendable.as_slice();
    let chosen = &coins[rng.gen_range(0..coins.len())];
    if chosen.amount == 0 {
        return Err(RandomError::NoFeeCoins);
    }
    let amount = rand_positive_int(rng, chosen.amount)?;
    Ok(Coin::new(chosen.denom.clone(), amount).into())
}

/// Fee for a transaction that also spends `reserved` from `spendable`.
///
/// The fee is drawn from what remains after the reservation; when the
/// reservation is not covered, no fee is charged.
pub fn random_fees_after<R: Rng + ?Sized>(
    rng: &mut R,
    spendable: &Coins,
    reserved: Option<&Coin>,
) -> Result<Coins, RandomError> {
    match reserved {
        None => random_fees(rng, spendable),
        Some(principal) => match spendable.safe_sub(&principal.clone().into()) {
            Some(rest) => random_fees(rng, &rest),
            None => Ok(Coins::empty()),
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn positive_int_rejects_zero_bound() {
        let mut rng = sim_rng(7);
        assert_eq!(
            rand_positive_int(&mut rng, 0),
            Err(RandomError::NonPositiveBound(0))
        );
        assert_eq!(rand_positive_int(&mut rng, 1), Ok(1));
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = sim_rng(99);
        let mut b = sim_rng(99);
        assert_eq!(
            rand_string_of_length(&mut a, 10),
            rand_string_of_length(&mut b, 10)
        );
        assert_eq!(
            random_dec_amount(&mut a, dec!(0.45)),
            random_dec_amount(&mut b, dec!(0.45))
        );
    }

    #[test]
    fn dec_amount_below_precision_is_zero() {
        let mut rng = sim_rng(5);
        for _ in 0..64 {
            assert_eq!(random_dec_amount(&mut rng, Decimal::new(1, 19)), Decimal::ZERO);
            assert_eq!(random_dec_amount(&mut rng, Decimal::new(-3, 2)), Decimal::ZERO);
        }
    }

    #[test]
    fn dec_amount_truncates_excess_digits() {
        let max = Decimal::new(15, 19);
        let mut rng = sim_rng(6);
        for _ in 0..64 {
            let v = random_dec_amount(&mut rng, max);
            assert!(v >= Decimal::ZERO && v <= max, "{v} exceeds {max}");
        }
    }

    #[test]
    fn fees_skip_when_reservation_uncovered() {
        let mut rng = sim_rng(1);
        let spendable = Coins::from(Coin::new("stake", 10));
        let fees = random_fees_after(&mut rng, &spendable, Some(&Coin::new("stake", 11))).unwrap();
        assert!(fees.is_empty());
        let fees = random_fees_after(&mut rng, &spendable, Some(&Coin::new("stake", 10))).unwrap();
        assert!(fees.is_empty());
    }

    proptest! {
        #[test]
        fn positive_int_in_bounds(seed in any::<u64>(), max in 1u64..=u64::MAX) {
            let mut rng = sim_rng(seed);
            let v = rand_positive_int(&mut rng, max).unwrap();
            prop_assert!(v >= 1 && v <= max);
        }

        #[test]
        fn dec_amount_never_exceeds_max(seed in any::<u64>(), percent in 0i64..=100) {
            let max = Decimal::new(percent, 2);
            let mut rng = sim_rng(seed);
            for _ in 0..16 {
                let v = random_dec_amount(&mut rng, max);
                prop_assert!(v >= Decimal::ZERO && v <= max);
            }
        }

        #[test]
        fn dec_amount_within_fine_grained_max(seed in any::<u64>(), mantissa in 1i64..1_000_000, scale in 17u32..=24) {
            let max = Decimal::new(mantissa, scale);
            let mut rng = sim_rng(seed);
            for _ in 0..16 {
                let v = random_dec_amount(&mut rng, max);
                prop_assert!(v >= Decimal::ZERO && v <= max);
            }
        }

        #[test]
        fn string_has_requested_length(seed in any::<u64>(), len in 0usize..64) {
            let mut rng = sim_rng(seed);
            let s = rand_string_of_length(&mut rng, len);
            prop_assert_eq!(s.len(), len);
            prop_assert!(s.chars().all(|c| c.is_ascii_alphabetic()));
        }

        #[test]
        fn fees_bounded_by_remainder(seed in any::<u64>(), held in 1u64..1_000_000, principal in 0u64..1_000_000) {
            let mut rng = sim_rng(seed);
            let spendable = Coins::from(Coin::new("stake", held));
            let fees = random_fees_after(&mut rng, &spendable, Some(&Coin::new("stake", principal))).unwrap();
            prop_assert!(fees.amount_of("stake") <= held.saturating_sub(principal));
        }
    }
}
