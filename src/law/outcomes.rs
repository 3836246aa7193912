//! Assertions over generator outcomes.

use rust_decimal::Decimal;

use crate::msgs::StakingMsg;
use crate::operation::OperationOutcome;

/// Assert a delivered message moves a strictly positive principal.
pub fn assert_principal_positive(outcome: &OperationOutcome) {
    if let Some(coin) = outcome.msg().and_then(StakingMsg::principal) {
        assert!(coin.is_positive(), "delivered zero principal: {:?}", outcome);
    }
}

/// Assert a delivered message moves no more than `available` tokens.
pub fn assert_principal_within(outcome: &OperationOutcome, available: u64) {
    if let Some(coin) = outcome.msg().and_then(StakingMsg::principal) {
        assert!(
            coin.amount <= available,
            "principal {} exceeds available {}",
            coin.amount,
            available
        );
    }
}

/// Assert a delivered redelegation has distinct endpoints.
pub fn assert_distinct_redelegation(outcome: &OperationOutcome) {
    if let Some(StakingMsg::BeginRedelegate(msg)) = outcome.msg() {
        assert_ne!(
            msg.validator_src_address, msg.validator_dst_address,
            "redelegation source equals destination"
        );
    }
}

/// Assert delivered commission figures stay inside `[0, max_rate]`.
///
/// Create-validator messages are checked against their own max rate and
/// `max_rate` is ignored; edit-validator rates are checked against `max_rate`.
pub fn assert_commission_within(outcome: &OperationOutcome, max_rate: Decimal) {
    match outcome.msg() {
        Some(StakingMsg::CreateValidator(msg)) => {
            let rates = &msg.commission;
            assert!(
                rates.max_rate >= Decimal::ZERO && rates.max_rate <= Decimal::ONE,
                "max rate {} outside [0, 1]",
                rates.max_rate
            );
            assert!(rates.rate >= Decimal::ZERO && rates.rate <= rates.max_rate);
            assert!(
                rates.max_change_rate >= Decimal::ZERO && rates.max_change_rate <= rates.max_rate
            );
        }
        Some(StakingMsg::EditValidator(msg)) => {
            if let Some(rate) = msg.commission_rate {
                assert!(
                    rate >= Decimal::ZERO && rate <= max_rate,
                    "edited rate {rate} outside [0, {max_rate}]"
                );
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AccountAddress, ValidatorAddress};
    use crate::coins::Coin;
    use crate::msgs::{MsgBeginRedelegate, MsgDelegate};

    fn success(msg: StakingMsg) -> OperationOutcome {
        OperationOutcome::Success {
            msg,
            future_operations: Vec::new(),
        }
    }

    #[test]
    fn noop_passes_every_assertion() {
        let outcome = OperationOutcome::NoOp;
        assert_principal_positive(&outcome);
        assert_principal_within(&outcome, 0);
        assert_distinct_redelegation(&outcome);
        assert_commission_within(&outcome, Decimal::ZERO);
    }

    #[test]
    #[should_panic(expected = "exceeds available")]
    fn oversized_principal_is_reported() {
        let outcome = success(StakingMsg::Delegate(MsgDelegate {
            delegator_address: AccountAddress::new([1; 20]),
            validator_address: ValidatorAddress::new([2; 20]),
            amount: Coin::new("stake", 11),
        }));
        assert_principal_within(&outcome, 10);
    }

    #[test]
    #[should_panic(expected = "source equals destination")]
    fn self_redelegation_is_reported() {
        let val = ValidatorAddress::new([2; 20]);
        let outcome = success(StakingMsg::BeginRedelegate(MsgBeginRedelegate {
            delegator_address: AccountAddress::new([1; 20]),
            validator_src_address: val,
            validator_dst_address: val,
            amount: Coin::new("stake", 1),
        }));
        assert_distinct_redelegation(&outcome);
    }
}
