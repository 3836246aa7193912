//! Commission and description strategies.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::staking::{CommissionRates, Description};

/// Generate a decimal in `[0, max]` with up to six extra fractional digits.
pub fn rate_up_to(max: Decimal) -> impl Strategy<Value = Decimal> {
    assert!(max >= Decimal::ZERO, "max must be non-negative");
    (0_i64..=1_000_000).prop_map(move |ppm| max * Decimal::new(ppm, 6))
}

/// Generate commission rates with `rate <= max_rate` and `max_change_rate <= max_rate`.
///
/// `max_rate` is a whole percentage in `[0, 100]`.
pub fn arb_commission_rates() -> impl Strategy<Value = CommissionRates> {
    (0_i64..=100).prop_flat_map(|percent| {
        let max_rate = Decimal::new(percent, 2);
        (rate_up_to(max_rate), rate_up_to(max_rate))
            .prop_map(move |(rate, change)| CommissionRates::new(rate, max_rate, change))
    })
}

/// Generate a description whose fields are letters of exact length `len`.
pub fn arb_description(len: usize) -> impl Strategy<Value = Description> {
    let pattern = format!("[A-Za-z]{{{len}}}");
    let field = || {
        proptest::string::string_regex(&pattern).expect("letter regex should compile")
    };
    (field(), field(), field(), field(), field())
        .prop_map(|(moniker, identity, website, contact, details)| {
            Description::new(moniker, identity, website, contact, details)
        })
}
