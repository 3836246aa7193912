//! Outcome model and the shared select → guard → quantity → sign → deliver pipeline.
//!
//! Each staking action is an [`OperationStrategy`]: it picks entities, runs its
//! admission guards and derives quantities. [`simulate`] drives any strategy
//! through the same control flow so that skips, failures and successes are
//! classified identically for all five actions.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::account::{SimAccount, find_account};
use crate::address::AccountAddress;
use crate::coins::Coin;
use crate::config::GeneratorConfig;
use crate::keeper::{AccountKeeper, SimApp, StakingKeeper};
use crate::msgs::{ROUTER_KEY, StakingMsg};
use crate::random::{RandomError, random_fees_after};
use crate::staking::ExchangeRateError;
use crate::tx::{Fee, TxError, gen_tx};

/// The five staking actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Register a validator.
    CreateValidator,
    /// Edit a validator.
    EditValidator,
    /// Delegate to a validator.
    Delegate,
    /// Undelegate from a validator.
    Undelegate,
    /// Redelegate between validators.
    BeginRedelegate,
}

impl OperationKind {
    /// Every kind, in declaration order.
    pub const ALL: [OperationKind; 5] = [
        OperationKind::CreateValidator,
        OperationKind::EditValidator,
        OperationKind::Delegate,
        OperationKind::Undelegate,
        OperationKind::BeginRedelegate,
    ];

    /// Stable snake-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateValidator => "create_validator",
            Self::EditValidator => "edit_validator",
            Self::Delegate => "delegate",
            Self::Undelegate => "undelegate",
            Self::BeginRedelegate => "begin_redelegate",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why no legal operation existed. Logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No simulation accounts to pick from.
    NoAccounts,
    /// No validators exist.
    NoValidators,
    /// Chosen validator has no delegations.
    NoDelegations,
    /// Account already operates a validator.
    ValidatorExists,
    /// Account holds no bondable balance.
    NoBondBalance,
    /// Validator exchange rate is undefined.
    InvalidExchangeRate,
    /// New commission rate violates the change rules.
    InvalidCommissionChange,
    /// Unbonding entries are at the cap.
    MaxUnbondingEntries,
    /// Redelegation entries are at the cap.
    MaxRedelegationEntries,
    /// Delegator still has an incoming redelegation into the source validator.
    ReceivingRedelegation,
    /// Source and destination validator coincide.
    SelfRedelegation,
    /// Delegation is worth no whole tokens.
    ZeroBond,
    /// Drawn amount is zero.
    ZeroAmount,
    /// Amount does not survive a tokens → shares → tokens round trip.
    SharesTruncateToZero,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoAccounts => "no simulation accounts",
            Self::NoValidators => "no validators",
            Self::NoDelegations => "validator has no delegations",
            Self::ValidatorExists => "validator already exists",
            Self::NoBondBalance => "no bondable balance",
            Self::InvalidExchangeRate => "invalid exchange rate",
            Self::InvalidCommissionChange => "invalid commission change",
            Self::MaxUnbondingEntries => "max unbonding entries",
            Self::MaxRedelegationEntries => "max redelegation entries",
            Self::ReceivingRedelegation => "receiving redelegation pending",
            Self::SelfRedelegation => "source equals destination",
            Self::ZeroBond => "delegation worth zero tokens",
            Self::ZeroAmount => "zero amount drawn",
            Self::SharesTruncateToZero => "shares truncate to zero",
        };
        f.write_str(text)
    }
}

/// Unexpected failures surfaced to the harness.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Chain state references an address the simulation holds no keypair for.
    #[error("address {0} does not exist in simulation accounts")]
    UnknownSimAccount(AccountAddress),
    /// Signer has no ledger account.
    #[error("account {0} not found in the account keeper")]
    MissingLedgerAccount(AccountAddress),
    /// Bounded random generation failed.
    #[error("random generation failed: {0}")]
    Random(#[from] RandomError),
    /// Share/token conversion failed.
    #[error("exchange rate: {0}")]
    ExchangeRate(#[from] ExchangeRateError),
    /// Transaction could not be built.
    #[error("tx construction failed: {0}")]
    Tx(#[from] TxError),
    /// Transaction pipeline rejected the transaction.
    #[error("{log}")]
    Delivery {
        /// Pipeline diagnostic log.
        log: String,
    },
}

/// Early exit from the pipeline.
#[derive(Debug)]
pub enum Halt {
    /// No legal operation; becomes [`OperationOutcome::NoOp`].
    Skip(SkipReason),
    /// Unexpected failure; becomes [`OperationOutcome::Error`].
    Fail(OperationError),
}

impl From<SkipReason> for Halt {
    fn from(reason: SkipReason) -> Self {
        Halt::Skip(reason)
    }
}

impl From<OperationError> for Halt {
    fn from(error: OperationError) -> Self {
        Halt::Fail(error)
    }
}

impl From<RandomError> for Halt {
    fn from(error: RandomError) -> Self {
        Halt::Fail(error.into())
    }
}

impl From<ExchangeRateError> for Halt {
    fn from(error: ExchangeRateError) -> Self {
        Halt::Fail(error.into())
    }
}

/// Follow-up operation scheduled for a later block. Single-shot generators never emit one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureOperation {
    /// Block height at which to run.
    pub block_height: u64,
    /// Operation to run.
    pub kind: OperationKind,
}

/// Result of one generator call.
#[derive(Debug)]
pub enum OperationOutcome {
    /// No legal operation existed.
    NoOp,
    /// The message was delivered.
    Success {
        /// Delivered message.
        msg: StakingMsg,
        /// Follow-up operations; always empty here.
        future_operations: Vec<FutureOperation>,
    },
    /// Registry inconsistency, generation failure or delivery failure.
    Error(OperationError),
}

impl OperationOutcome {
    /// True for [`OperationOutcome::NoOp`].
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// True for [`OperationOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// True for [`OperationOutcome::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Delivered message, if any.
    pub fn msg(&self) -> Option<&StakingMsg> {
        match self {
            Self::Success { msg, .. } => Some(msg),
            _ => None,
        }
    }

    /// Failure, if any.
    pub fn error(&self) -> Option<&OperationError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Split into the conventional `Result` shape; `Ok(None)` is a no-op.
    pub fn into_result(self) -> Result<Option<StakingMsg>, OperationError> {
        match self {
            Self::NoOp => Ok(None),
            Self::Success { msg, .. } => Ok(Some(msg)),
            Self::Error(error) => Err(error),
        }
    }

    /// Loggable record of this outcome.
    pub fn record(&self) -> OperationMsg {
        match self {
            Self::Success { msg, .. } => OperationMsg::from_msg(msg, true, ""),
            Self::NoOp => OperationMsg::no_op(ROUTER_KEY),
            Self::Error(error) => {
                let mut record = OperationMsg::no_op(ROUTER_KEY);
                record.comment = error.to_string();
                record
            }
        }
    }
}

/// Serializable summary of an operation for harness logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationMsg {
    /// Message route.
    pub route: String,
    /// Message type, or `no-operation`.
    pub name: String,
    /// Free-form comment.
    pub comment: String,
    /// True when a message was delivered.
    pub ok: bool,
    /// Message body.
    pub msg: Option<serde_json::Value>,
}

impl OperationMsg {
    /// Record for a delivered message.
    pub fn from_msg(msg: &StakingMsg, ok: bool, comment: impl Into<String>) -> Self {
        Self {
            route: msg.route().to_string(),
            name: msg.msg_type().to_string(),
            comment: comment.into(),
            ok,
            msg: serde_json::to_value(msg).ok(),
        }
    }

    /// Record for a skipped operation.
    pub fn no_op(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            name: "no-operation".to_string(),
            comment: String::new(),
            ok: false,
            msg: None,
        }
    }
}

/// Header of the block being simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Chain identifier.
    pub chain_id: String,
    /// Block height.
    pub height: u64,
    /// Block time, unix milliseconds.
    pub time_ms: i64,
}

/// Per-call inputs that are not chain state.
#[derive(Debug, Clone, Copy)]
pub struct SimContext<'a> {
    /// Simulation-account registry.
    pub accounts: &'a [SimAccount],
    /// Current block.
    pub header: &'a BlockHeader,
    /// Generator knobs.
    pub config: &'a GeneratorConfig,
}

impl<'a> SimContext<'a> {
    /// Bundle per-call inputs.
    pub fn new(
        accounts: &'a [SimAccount],
        header: &'a BlockHeader,
        config: &'a GeneratorConfig,
    ) -> Self {
        Self {
            accounts,
            header,
            config,
        }
    }
}

/// Message plus the principal to reserve before drawing fees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Message to sign and deliver.
    pub msg: StakingMsg,
    /// Principal spent by the message; `None` when it spends nothing.
    pub reserved: Option<Coin>,
}

/// One staking action expressed as selection, guards and quantity rules.
pub trait OperationStrategy {
    /// Entities picked for one attempt.
    type Selection;

    /// Action kind.
    fn kind(&self) -> OperationKind;

    /// Pick the entities to act on.
    fn select<C, R>(
        &self,
        rng: &mut R,
        chain: &C,
        ctx: &SimContext<'_>,
    ) -> Result<Self::Selection, SkipReason>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
        R: Rng + ?Sized;

    /// Account that must sign for `selection`.
    fn signer(&self, selection: &Self::Selection) -> AccountAddress;

    /// Admission guards run before any quantity is drawn.
    fn admit<C>(
        &self,
        _chain: &C,
        _ctx: &SimContext<'_>,
        _selection: &Self::Selection,
    ) -> Result<(), SkipReason>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
    {
        Ok(())
    }

    /// Draw quantities and build the message.
    fn draft<C, R>(
        &self,
        rng: &mut R,
        chain: &C,
        ctx: &SimContext<'_>,
        selection: &Self::Selection,
    ) -> Result<Draft, Halt>
    where
        C: AccountKeeper + StakingKeeper + ?Sized,
        R: Rng + ?Sized;
}

/// Run `strategy` once against `chain`.
pub fn simulate<S, C, R>(
    strategy: &S,
    rng: &mut R,
    chain: &mut C,
    ctx: &SimContext<'_>,
) -> OperationOutcome
where
    S: OperationStrategy + ?Sized,
    C: SimApp + ?Sized,
    R: Rng + ?Sized,
{
    let kind = strategy.kind();
    match execute(strategy, rng, chain, ctx) {
        Ok(msg) => {
            trace!(operation = %kind, msg_type = msg.msg_type(), "operation delivered");
            OperationOutcome::Success {
                msg,
                future_operations: Vec::new(),
            }
        }
        Err(Halt::Skip(reason)) => {
            debug!(operation = %kind, %reason, "operation skipped");
            OperationOutcome::NoOp
        }
        Err(Halt::Fail(error)) => {
            warn!(operation = %kind, %error, "operation failed");
            OperationOutcome::Error(error)
        }
    }
}

fn execute<S, C, R>(
    strategy: &S,
    rng: &mut R,
    chain: &mut C,
    ctx: &SimContext<'_>,
) -> Result<StakingMsg, Halt>
where
    S: OperationStrategy + ?Sized,
    C: SimApp + ?Sized,
    R: Rng + ?Sized,
{
    let view: &C = chain;
    let selection = strategy.select(rng, view, ctx)?;
    let signer = resolve_signer(ctx.accounts, strategy.signer(&selection))?;
    strategy.admit(view, ctx, &selection)?;
    let draft = strategy.draft(rng, view, ctx, &selection)?;

    let account = view
        .account(&signer.address)
        .ok_or(OperationError::MissingLedgerAccount(signer.address))?;
    let spendable = view.spendable_coins(&signer.address, ctx.header.time_ms);
    let fees = random_fees_after(rng, &spendable, draft.reserved.as_ref())?;

    let tx = gen_tx(
        vec![draft.msg.clone()],
        Fee {
            amount: fees,
            gas: ctx.config.gas,
        },
        ctx.config.memo.clone(),
        &ctx.header.chain_id,
        account.account_number,
        account.sequence,
        &signer.priv_key,
    )
    .map_err(OperationError::from)?;

    let result = chain.deliver(&tx);
    if !result.is_ok() {
        return Err(OperationError::Delivery { log: result.log }.into());
    }
    Ok(draft.msg)
}

/// Keypair registered for `address`; absence is a registry inconsistency.
pub fn resolve_signer<'a>(
    accounts: &'a [SimAccount],
    address: AccountAddress,
) -> Result<&'a SimAccount, OperationError> {
    find_account(accounts, &address).ok_or(OperationError::UnknownSimAccount(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ValidatorAddress;
    use crate::msgs::MsgDelegate;

    #[test]
    fn records_distinguish_noop_and_success() {
        let noop = OperationOutcome::NoOp.record();
        assert_eq!(noop.name, "no-operation");
        assert_eq!(noop.route, "staking");
        assert!(!noop.ok);
        assert!(noop.msg.is_none());

        let msg = StakingMsg::Delegate(MsgDelegate {
            delegator_address: AccountAddress::new([1; 20]),
            validator_address: ValidatorAddress::new([2; 20]),
            amount: Coin::new("stake", 3),
        });
        let success = OperationOutcome::Success {
            msg,
            future_operations: Vec::new(),
        };
        let record = success.record();
        assert!(record.ok);
        assert_eq!(record.name, "delegate");
        let body = record.msg.unwrap();
        assert_eq!(body["type"], "delegate");
        assert_eq!(body["amount"]["amount"], 3);
    }

    #[test]
    fn error_record_carries_cause() {
        let outcome = OperationOutcome::Error(OperationError::Delivery {
            log: "insufficient funds".to_string(),
        });
        assert!(outcome.is_error());
        assert_eq!(outcome.record().comment, "insufficient funds");
        assert!(matches!(
            outcome.into_result(),
            Err(OperationError::Delivery { .. })
        ));
    }

    #[test]
    fn unresolved_signer_is_an_error() {
        let missing = AccountAddress::new([7; 20]);
        assert!(matches!(
            resolve_signer(&[], missing),
            Err(OperationError::UnknownSimAccount(address)) if address == missing
        ));
    }
}
