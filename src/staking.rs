//! Read-only staking snapshots: validators, delegations, commission and parameters.
//!
//! Shares and rates are fixed-point decimals with 18 fractional digits; token
//! amounts are whole base units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{AccountAddress, ValidatorAddress};

/// Fractional digits carried by shares and rates.
pub const DEC_PRECISION: u32 = 18;

/// Minimum interval between two commission-rate changes of one validator.
pub const COMMISSION_UPDATE_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Exchange-rate conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeRateError {
    /// Validator holds no tokens, so tokens cannot be converted to shares.
    #[error("validator {0} has no bonded tokens")]
    NoTokens(ValidatorAddress),
    /// Validator has issued no shares, so shares cannot be converted to tokens.
    #[error("validator {0} has issued no shares")]
    NoShares(ValidatorAddress),
    /// Intermediate product exceeded decimal range.
    #[error("exchange-rate arithmetic overflow for validator {0}")]
    Overflow(ValidatorAddress),
}

/// Reasons a commission-rate change is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommissionError {
    /// Last change happened inside the update window.
    #[error("commission cannot be changed more than once in 24h")]
    UpdateTooSoon,
    /// Negative rate.
    #[error("commission rate must be non-negative")]
    Negative,
    /// Rate above the validator's max-rate.
    #[error("commission rate cannot exceed the max rate")]
    AboveMaxRate,
    /// Delta from the current rate exceeds the max change rate.
    #[error("commission change exceeds the max change rate")]
    AboveMaxChangeRate,
}

/// Human-readable validator metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Display name.
    pub moniker: String,
    /// Optional identity signature.
    pub identity: String,
    /// Website.
    pub website: String,
    /// Security contact.
    pub security_contact: String,
    /// Free-form details.
    pub details: String,
}

impl Description {
    /// Construct a description from its five fields.
    pub fn new(
        moniker: impl Into<String>,
        identity: impl Into<String>,
        website: impl Into<String>,
        security_contact: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            moniker: moniker.into(),
            identity: identity.into(),
            website: website.into(),
            security_contact: security_contact.into(),
            details: details.into(),
        }
    }
}

/// Commission parameters fixed at validator creation (except `rate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    /// Current rate.
    pub rate: Decimal,
    /// Upper bound the rate may ever reach.
    pub max_rate: Decimal,
    /// Largest allowed single change of the rate.
    pub max_change_rate: Decimal,
}

impl CommissionRates {
    /// Construct commission rates.
    pub fn new(rate: Decimal, max_rate: Decimal, max_change_rate: Decimal) -> Self {
        Self {
            rate,
            max_rate,
            max_change_rate,
        }
    }
}

/// Commission rates plus the time of the last rate change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    /// Rates.
    pub rates: CommissionRates,
    /// Unix milliseconds of the last rate change.
    pub update_time_ms: i64,
}

impl Commission {
    /// Construct commission state.
    pub fn new(rates: CommissionRates, update_time_ms: i64) -> Self {
        Self {
            rates,
            update_time_ms,
        }
    }

    /// Check whether `new_rate` may replace the current rate at `block_time_ms`.
    pub fn validate_new_rate(
        &self,
        new_rate: Decimal,
        block_time_ms: i64,
    ) -> Result<(), CommissionError> {
        if block_time_ms.saturating_sub(self.update_time_ms) < COMMISSION_UPDATE_WINDOW_MS {
            return Err(CommissionError::UpdateTooSoon);
        }
        if new_rate < Decimal::ZERO {
            return Err(CommissionError::Negative);
        }
        if new_rate > self.rates.max_rate {
            return Err(CommissionError::AboveMaxRate);
        }
        if new_rate - self.rates.rate > self.rates.max_change_rate {
            return Err(CommissionError::AboveMaxChangeRate);
        }
        Ok(())
    }
}

/// Snapshot of one validator as of the current block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Operator address.
    pub operator: ValidatorAddress,
    /// Consensus public key bytes.
    pub consensus_pubkey: [u8; 32],
    /// Total bonded tokens.
    pub tokens: u64,
    /// Total shares issued to delegators.
    pub delegator_shares: Decimal,
    /// Metadata.
    pub description: Description,
    /// Commission state.
    pub commission: Commission,
    /// Minimum self-delegation in tokens.
    pub min_self_delegation: u64,
}

impl Validator {
    /// Operator address.
    pub fn operator(&self) -> ValidatorAddress {
        self.operator
    }

    /// True when tokens-per-share is undefined: exactly one of tokens and shares is zero.
    pub fn invalid_ex_rate(&self) -> bool {
        let no_tokens = self.tokens == 0;
        let no_shares = self.delegator_shares.is_zero();
        (no_tokens && self.delegator_shares > Decimal::ZERO) || (no_shares && self.tokens > 0)
    }

    /// Convert delegation shares to tokens, rounded half away from zero at 18 digits.
    pub fn tokens_from_shares(&self, shares: Decimal) -> Result<Decimal, ExchangeRateError> {
        if self.delegator_shares.is_zero() {
            return Err(ExchangeRateError::NoShares(self.operator));
        }
        shares
            .checked_mul(Decimal::from(self.tokens))
            .and_then(|product| product.checked_div(self.delegator_shares))
            .map(|tokens| {
                tokens.round_dp_with_strategy(DEC_PRECISION, RoundingStrategy::MidpointAwayFromZero)
            })
            .ok_or(ExchangeRateError::Overflow(self.operator))
    }

    /// Convert delegation shares to whole tokens, truncating toward zero.
    pub fn truncated_tokens_from_shares(&self, shares: Decimal) -> Result<u64, ExchangeRateError> {
        let tokens = self.tokens_from_shares(shares)?;
        tokens
            .trunc()
            .to_u64()
            .ok_or(ExchangeRateError::Overflow(self.operator))
    }

    /// Convert a token amount to shares, truncated at 18 digits.
    pub fn shares_from_tokens(&self, amount: u64) -> Result<Decimal, ExchangeRateError> {
        if self.tokens == 0 {
            return Err(ExchangeRateError::NoTokens(self.operator));
        }
        self.delegator_shares
            .checked_mul(Decimal::from(amount))
            .and_then(|product| product.checked_div(Decimal::from(self.tokens)))
            .map(|shares| shares.round_dp_with_strategy(DEC_PRECISION, RoundingStrategy::ToZero))
            .ok_or(ExchangeRateError::Overflow(self.operator))
    }
}

/// Shares held by one delegator in one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Delegator.
    pub delegator: AccountAddress,
    /// Validator.
    pub validator: ValidatorAddress,
    /// Shares held.
    pub shares: Decimal,
}

/// Staking module parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    /// Denomination that can be bonded.
    pub bond_denom: String,
    /// Cap on outstanding unbonding or redelegation entries per pair/triple.
    pub max_entries: u16,
    /// Time an unbonding or redelegation stays outstanding.
    pub unbonding_time_ms: i64,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            bond_denom: "stake".to_string(),
            max_entries: 7,
            unbonding_time_ms: 3 * 24 * 60 * 60 * 1000,
        }
    }
}
