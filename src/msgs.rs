//! Staking messages produced by the generators.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{AccountAddress, ValidatorAddress};
use crate::coins::Coin;
use crate::staking::{CommissionRates, Description};

/// Message route shared by every staking message.
pub const ROUTER_KEY: &str = "staking";

/// Stateless message validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MsgValidationError {
    /// Principal amount is zero.
    #[error("amount must be positive")]
    ZeroAmount,
    /// Validator moniker is empty.
    #[error("empty description moniker")]
    EmptyMoniker,
    /// Commission rate exceeds max-rate, or max-change-rate exceeds max-rate.
    #[error("invalid commission rates")]
    InvalidCommission,
    /// Minimum self-delegation is zero or above the self-delegation.
    #[error("invalid minimum self delegation")]
    InvalidMinSelfDelegation,
    /// Source and destination validator are the same.
    #[error("cannot redelegate to the same validator")]
    SelfRedelegation,
}

/// Register a new validator with an initial self-delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateValidator {
    /// Metadata.
    pub description: Description,
    /// Initial commission.
    pub commission: CommissionRates,
    /// Minimum self-delegation in tokens.
    pub min_self_delegation: u64,
    /// Operator account.
    pub delegator_address: AccountAddress,
    /// Operator address.
    pub validator_address: ValidatorAddress,
    /// Consensus public key.
    pub pubkey: [u8; 32],
    /// Self-delegation.
    pub value: Coin,
}

/// Change a validator's description and, optionally, commission rate or min self-delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgEditValidator {
    /// New metadata.
    pub description: Description,
    /// Validator being edited.
    pub validator_address: ValidatorAddress,
    /// New commission rate; `None` leaves it untouched.
    pub commission_rate: Option<Decimal>,
    /// New minimum self-delegation; `None` leaves it untouched.
    pub min_self_delegation: Option<u64>,
}

/// Bond tokens to a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegate {
    /// Delegator.
    pub delegator_address: AccountAddress,
    /// Validator.
    pub validator_address: ValidatorAddress,
    /// Amount bonded.
    pub amount: Coin,
}

/// Begin unbonding tokens from a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUndelegate {
    /// Delegator.
    pub delegator_address: AccountAddress,
    /// Validator.
    pub validator_address: ValidatorAddress,
    /// Amount unbonded.
    pub amount: Coin,
}

/// Move bonded tokens from one validator to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBeginRedelegate {
    /// Delegator.
    pub delegator_address: AccountAddress,
    /// Source validator.
    pub validator_src_address: ValidatorAddress,
    /// Destination validator.
    pub validator_dst_address: ValidatorAddress,
    /// Amount moved.
    pub amount: Coin,
}

/// Any staking message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StakingMsg {
    /// Create a validator.
    CreateValidator(MsgCreateValidator),
    /// Edit a validator.
    EditValidator(MsgEditValidator),
    /// Delegate.
    Delegate(MsgDelegate),
    /// Undelegate.
    Undelegate(MsgUndelegate),
    /// Begin a redelegation.
    BeginRedelegate(MsgBeginRedelegate),
}

impl StakingMsg {
    /// Message route.
    pub fn route(&self) -> &'static str {
        ROUTER_KEY
    }

    /// Message type name.
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::CreateValidator(_) => "create_validator",
            Self::EditValidator(_) => "edit_validator",
            Self::Delegate(_) => "delegate",
            Self::Undelegate(_) => "begin_unbonding",
            Self::BeginRedelegate(_) => "begin_redelegate",
        }
    }

    /// The account whose signature authorizes this message.
    pub fn signer(&self) -> AccountAddress {
        match self {
            Self::CreateValidator(msg) => msg.delegator_address,
            Self::EditValidator(msg) => msg.validator_address.into(),
            Self::Delegate(msg) => msg.delegator_address,
            Self::Undelegate(msg) => msg.delegator_address,
            Self::BeginRedelegate(msg) => msg.delegator_address,
        }
    }

    /// Principal moved by the message, if any.
    pub fn principal(&self) -> Option<&Coin> {
        match self {
            Self::CreateValidator(msg) => Some(&msg.value),
            Self::EditValidator(_) => None,
            Self::Delegate(msg) => Some(&msg.amount),
            Self::Undelegate(msg) => Some(&msg.amount),
            Self::BeginRedelegate(msg) => Some(&msg.amount),
        }
    }

    /// Checks that need no chain state.
    pub fn validate_basic(&self) -> Result<(), MsgValidationError> {
        if let Some(coin) = self.principal() {
            if !coin.is_positive() {
                return Err(MsgValidationError::ZeroAmount);
            }
        }
        match self {
            Self::CreateValidator(msg) => {
                if msg.description.moniker.is_empty() {
                    return Err(MsgValidationError::EmptyMoniker);
                }
                let rates = &msg.commission;
                if rates.rate > rates.max_rate || rates.max_change_rate > rates.max_rate {
                    return Err(MsgValidationError::InvalidCommission);
                }
                if msg.min_self_delegation == 0 || msg.value.amount < msg.min_self_delegation {
                    return Err(MsgValidationError::InvalidMinSelfDelegation);
                }
            }
            Self::EditValidator(msg) => {
                if msg.min_self_delegation == Some(0) {
                    return Err(MsgValidationError::InvalidMinSelfDelegation);
                }
            }
            Self::BeginRedelegate(msg) => {
                if msg.validator_src_address == msg.validator_dst_address {
                    return Err(MsgValidationError::SelfRedelegation);
                }
            }
            Self::Delegate(_) | Self::Undelegate(_) => {}
        }
        Ok(())
    }
}
