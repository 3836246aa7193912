//! In-memory staking and bank state machine for exercising the generators.
//!
//! [`InMemoryChain`] implements every capability the generators consume and
//! applies delivered transactions atomically, so whole simulation runs can be
//! driven without a real node.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::account::SimAccount;
use crate::address::{AccountAddress, ValidatorAddress};
use crate::coins::{Coin, Coins};
use crate::keeper::{AccountInfo, AccountKeeper, StakingKeeper, TxDeliverer};
use crate::msgs::{
    MsgBeginRedelegate, MsgCreateValidator, MsgDelegate, MsgEditValidator, MsgUndelegate,
    StakingMsg,
};
use crate::operation::BlockHeader;
use crate::staking::{
    Commission, CommissionRates, Delegation, Description, StakingParams, Validator,
};
use crate::tx::{DeliverResult, SimTx};

const CODE_INJECTED: u32 = 1;
const CODE_UNAUTHORIZED: u32 = 4;
const CODE_INSUFFICIENT_FUNDS: u32 = 5;
const CODE_INVALID_SEQUENCE: u32 = 32;
const CODE_STAKING: u32 = 100;

/// Bank record of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAccount {
    /// Account number.
    pub account_number: u64,
    /// Next expected sequence.
    pub sequence: u64,
    /// Total coins held.
    pub coins: Coins,
    /// Coins held but not spendable.
    pub locked: Coins,
}

impl LedgerAccount {
    fn spendable(&self) -> Coins {
        Coins::new(self.coins.as_slice().iter().map(|coin| {
            let locked = self.locked.amount_of(&coin.denom);
            Coin::new(coin.denom.clone(), coin.amount.saturating_sub(locked))
        }))
    }
}

/// A pending unbonding that pays out at `completion_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbondingEntry {
    /// Maturity time.
    pub completion_ms: i64,
    /// Tokens paid out at maturity.
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LedgerState {
    accounts: BTreeMap<AccountAddress, LedgerAccount>,
    validators: BTreeMap<ValidatorAddress, Validator>,
    delegations: BTreeMap<(AccountAddress, ValidatorAddress), Decimal>,
    unbondings: BTreeMap<(AccountAddress, ValidatorAddress), Vec<UnbondingEntry>>,
    redelegations: BTreeMap<(AccountAddress, ValidatorAddress, ValidatorAddress), Vec<i64>>,
    fees_collected: Coins,
    next_account_number: u64,
}

/// Reference chain state with a simple transaction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryChain {
    header: BlockHeader,
    params: StakingParams,
    state: LedgerState,
    fail_next: Option<String>,
    delivered: Vec<SimTx>,
}

struct Rejection {
    code: u32,
    log: String,
}

impl Rejection {
    fn staking(log: impl Into<String>) -> Self {
        Self {
            code: CODE_STAKING,
            log: log.into(),
        }
    }
}

impl InMemoryChain {
    /// Empty chain at height 1.
    pub fn new(chain_id: impl Into<String>, params: StakingParams) -> Self {
        Self {
            header: BlockHeader {
                chain_id: chain_id.into(),
                height: 1,
                time_ms: 0,
            },
            params,
            state: LedgerState::default(),
            fail_next: None,
            delivered: Vec::new(),
        }
    }

    /// Chain where every simulation account holds `initial` bond-denom tokens.
    pub fn genesis(chain_id: impl Into<String>, accounts: &[SimAccount], initial: u64) -> Self {
        let mut chain = Self::new(chain_id, StakingParams::default());
        let denom = chain.params.bond_denom.clone();
        for account in accounts {
            chain.fund(account.address, Coin::new(denom.clone(), initial).into());
        }
        chain
    }

    /// Current block header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Staking parameters.
    pub fn staking_params(&self) -> &StakingParams {
        &self.params
    }

    /// Move to the next block `interval_ms` later and pay out matured entries.
    pub fn advance_block(&mut self, interval_ms: i64) {
        self.header.height += 1;
        self.header.time_ms = self.header.time_ms.saturating_add(interval_ms);
        let now = self.header.time_ms;
        let denom = self.params.bond_denom.clone();

        let mut payouts: Vec<(AccountAddress, u64)> = Vec::new();
        for ((delegator, _), entries) in self.state.unbondings.iter_mut() {
            entries.retain(|entry| {
                if entry.completion_ms <= now {
                    payouts.push((*delegator, entry.amount));
                    false
                } else {
                    true
                }
            });
        }
        self.state.unbondings.retain(|_, entries| !entries.is_empty());
        for (delegator, amount) in payouts {
            self.fund(delegator, Coin::new(denom.clone(), amount).into());
        }

        for entries in self.state.redelegations.values_mut() {
            entries.retain(|completion| *completion > now);
        }
        self.state.redelegations.retain(|_, entries| !entries.is_empty());
    }

    /// Credit `coins`, creating the account if needed.
    pub fn fund(&mut self, address: AccountAddress, coins: Coins) {
        let next_number = &mut self.state.next_account_number;
        let account = self
            .state
            .accounts
            .entry(address)
            .or_insert_with(|| {
                let account_number = *next_number;
                *next_number += 1;
                LedgerAccount {
                    account_number,
                    sequence: 0,
                    coins: Coins::empty(),
                    locked: Coins::empty(),
                }
            });
        account.coins = account.coins.add(&coins);
    }

    /// Mark part of an account's coins as not spendable.
    pub fn lock(&mut self, address: &AccountAddress, coins: Coins) {
        if let Some(account) = self.state.accounts.get_mut(address) {
            account.locked = account.locked.add(&coins);
        }
    }

    /// Ledger record of `address`.
    pub fn ledger_account(&self, address: &AccountAddress) -> Option<&LedgerAccount> {
        self.state.accounts.get(address)
    }

    /// Register a validator directly, bypassing the transaction pipeline.
    pub fn insert_validator(&mut self, validator: Validator) {
        self.state.validators.insert(validator.operator, validator);
    }

    /// Record a delegation directly; the validator's share total is not adjusted.
    pub fn insert_delegation(
        &mut self,
        delegator: AccountAddress,
        validator: ValidatorAddress,
        shares: Decimal,
    ) {
        self.state.delegations.insert((delegator, validator), shares);
    }

    /// Bond `self_bond` tokens from `operator` into a fresh validator it operates.
    ///
    /// An account that cannot afford the bond is left alone.
    pub fn bootstrap_validator(
        &mut self,
        operator: &SimAccount,
        self_bond: u64,
        rates: CommissionRates,
    ) {
        let address = operator.address;
        let denom = self.params.bond_denom.clone();
        let bond: Coins = Coin::new(denom, self_bond).into();
        let Some(remaining) = self
            .state
            .accounts
            .get(&address)
            .and_then(|account| account.coins.safe_sub(&bond))
        else {
            return;
        };
        if let Some(account) = self.state.accounts.get_mut(&address) {
            account.coins = remaining;
        }
        let shares = Decimal::from(self_bond);
        self.insert_validator(Validator {
            operator: address.into(),
            consensus_pubkey: operator.pub_key.to_bytes(),
            tokens: self_bond,
            delegator_shares: shares,
            description: Description::new("genesis", "", "", "", ""),
            commission: Commission::new(rates, self.header.time_ms),
            min_self_delegation: 1,
        });
        self.insert_delegation(address, address.into(), shares);
    }

    /// Add pending unbonding entries for `(delegator, validator)`.
    pub fn add_unbonding_entries(
        &mut self,
        delegator: AccountAddress,
        validator: ValidatorAddress,
        count: usize,
    ) {
        let completion_ms = self.header.time_ms + self.params.unbonding_time_ms;
        let entries = self.state.unbondings.entry((delegator, validator)).or_default();
        entries.extend((0..count).map(|_| UnbondingEntry {
            completion_ms,
            amount: 0,
        }));
    }

    /// Add pending redelegation entries for `(delegator, src, dst)`.
    pub fn add_redelegation_entries(
        &mut self,
        delegator: AccountAddress,
        src: ValidatorAddress,
        dst: ValidatorAddress,
        count: usize,
    ) {
        let completion_ms = self.header.time_ms + self.params.unbonding_time_ms;
        let entries = self
            .state
            .redelegations
            .entry((delegator, src, dst))
            .or_default();
        entries.extend((0..count).map(|_| completion_ms));
    }

    /// Make the next delivery fail with `log`.
    pub fn fail_next_delivery(&mut self, log: impl Into<String>) {
        self.fail_next = Some(log.into());
    }

    /// Transactions executed so far.
    pub fn delivered(&self) -> &[SimTx] {
        &self.delivered
    }

    /// Every delegation currently held.
    pub fn delegations(&self) -> Vec<Delegation> {
        self.state
            .delegations
            .iter()
            .map(|((delegator, validator), shares)| Delegation {
                delegator: *delegator,
                validator: *validator,
                shares: *shares,
            })
            .collect()
    }

    /// Bond-denom tokens across balances, validators, pending unbondings and collected fees.
    pub fn total_bond_supply(&self) -> u128 {
        let denom = &self.params.bond_denom;
        let balances: u128 = self
            .state
            .accounts
            .values()
            .map(|account| u128::from(account.coins.amount_of(denom)))
            .sum();
        let bonded: u128 = self
            .state
            .validators
            .values()
            .map(|validator| u128::from(validator.tokens))
            .sum();
        let unbonding: u128 = self
            .state
            .unbondings
            .values()
            .flatten()
            .map(|entry| u128::from(entry.amount))
            .sum();
        balances + bonded + unbonding + u128::from(self.state.fees_collected.amount_of(denom))
    }

    fn check_and_apply(&mut self, tx: &SimTx) -> Result<(), Rejection> {
        if let Some(log) = self.fail_next.take() {
            return Err(Rejection {
                code: CODE_INJECTED,
                log,
            });
        }
        tx.verify_signature().map_err(|err| Rejection {
            code: CODE_UNAUTHORIZED,
            log: format!("unauthorized: {err}"),
        })?;
        if tx.chain_id != self.header.chain_id {
            return Err(Rejection {
                code: CODE_UNAUTHORIZED,
                log: format!("wrong chain id {}", tx.chain_id),
            });
        }

        let signer = AccountAddress::from_public_key(&tx.pub_key);
        if tx.msgs.iter().any(|msg| msg.signer() != signer) {
            return Err(Rejection {
                code: CODE_UNAUTHORIZED,
                log: format!("tx not signed by message signer {signer}"),
            });
        }

        let mut next = self.state.clone();
        let account = next.accounts.get_mut(&signer).ok_or_else(|| Rejection {
            code: CODE_UNAUTHORIZED,
            log: format!("account {signer} does not exist"),
        })?;
        if account.account_number != tx.account_number || account.sequence != tx.sequence {
            return Err(Rejection {
                code: CODE_INVALID_SEQUENCE,
                log: format!(
                    "invalid account number/sequence: expected {}/{}, got {}/{}",
                    account.account_number, account.sequence, tx.account_number, tx.sequence
                ),
            });
        }
        if !account.spendable().covers(&tx.fee.amount) {
            return Err(Rejection {
                code: CODE_INSUFFICIENT_FUNDS,
                log: format!("insufficient funds to pay fees {}", tx.fee.amount),
            });
        }
        account.coins = account.coins.safe_sub(&tx.fee.amount).unwrap_or_default();
        account.sequence += 1;
        next.fees_collected = next.fees_collected.add(&tx.fee.amount);

        for msg in &tx.msgs {
            msg.validate_basic()
                .map_err(|err| Rejection::staking(err.to_string()))?;
            self.apply_msg(&mut next, msg)?;
        }

        self.state = next;
        Ok(())
    }

    fn apply_msg(&self, state: &mut LedgerState, msg: &StakingMsg) -> Result<(), Rejection> {
        match msg {
            StakingMsg::CreateValidator(msg) => self.apply_create_validator(state, msg),
            StakingMsg::EditValidator(msg) => self.apply_edit_validator(state, msg),
            StakingMsg::Delegate(msg) => self.apply_delegate(state, msg),
            StakingMsg::Undelegate(msg) => self.apply_undelegate(state, msg),
            StakingMsg::BeginRedelegate(msg) => self.apply_redelegate(state, msg),
        }
    }

    fn check_denom(&self, coin: &Coin) -> Result<(), Rejection> {
        if coin.denom != self.params.bond_denom {
            return Err(Rejection::staking(format!(
                "invalid coin denomination: got {}, expected {}",
                coin.denom, self.params.bond_denom
            )));
        }
        Ok(())
    }

    fn apply_create_validator(
        &self,
        state: &mut LedgerState,
        msg: &MsgCreateValidator,
    ) -> Result<(), Rejection> {
        if state.validators.contains_key(&msg.validator_address) {
            return Err(Rejection::staking("validator already exist for this operator address"));
        }
        self.check_denom(&msg.value)?;
        spend(state, &msg.delegator_address, &msg.value)?;
        let shares = Decimal::from(msg.value.amount);
        state.validators.insert(
            msg.validator_address,
            Validator {
                operator: msg.validator_address,
                consensus_pubkey: msg.pubkey,
                tokens: msg.value.amount,
                delegator_shares: shares,
                description: msg.description.clone(),
                commission: Commission::new(msg.commission, self.header.time_ms),
                min_self_delegation: msg.min_self_delegation,
            },
        );
        state
            .delegations
            .insert((msg.delegator_address, msg.validator_address), shares);
        Ok(())
    }

    fn apply_edit_validator(
        &self,
        state: &mut LedgerState,
        msg: &MsgEditValidator,
    ) -> Result<(), Rejection> {
        let validator = state
            .validators
            .get_mut(&msg.validator_address)
            .ok_or_else(|| Rejection::staking("validator does not exist"))?;
        if let Some(rate) = msg.commission_rate {
            validator
                .commission
                .validate_new_rate(rate, self.header.time_ms)
                .map_err(|err| Rejection::staking(err.to_string()))?;
            validator.commission.rates.rate = rate;
            validator.commission.update_time_ms = self.header.time_ms;
        }
        if let Some(min_self_delegation) = msg.min_self_delegation {
            validator.min_self_delegation = min_self_delegation;
        }
        validator.description = msg.description.clone();
        Ok(())
    }

    fn apply_delegate(&self, state: &mut LedgerState, msg: &MsgDelegate) -> Result<(), Rejection> {
        self.check_denom(&msg.amount)?;
        spend(state, &msg.delegator_address, &msg.amount)?;
        bond(state, msg.delegator_address, msg.validator_address, msg.amount.amount)
    }

    fn apply_undelegate(
        &self,
        state: &mut LedgerState,
        msg: &MsgUndelegate,
    ) -> Result<(), Rejection> {
        self.check_denom(&msg.amount)?;
        let key = (msg.delegator_address, msg.validator_address);
        if state.unbondings.get(&key).map_or(0, Vec::len) >= usize::from(self.params.max_entries) {
            return Err(Rejection::staking("too many unbonding delegation entries"));
        }
        let amount = unbond(state, msg.delegator_address, msg.validator_address, msg.amount.amount)?;
        state.unbondings.entry(key).or_default().push(UnbondingEntry {
            completion_ms: self.header.time_ms + self.params.unbonding_time_ms,
            amount,
        });
        Ok(())
    }

    fn apply_redelegate(
        &self,
        state: &mut LedgerState,
        msg: &MsgBeginRedelegate,
    ) -> Result<(), Rejection> {
        self.check_denom(&msg.amount)?;
        let delegator = msg.delegator_address;
        let (src, dst) = (msg.validator_src_address, msg.validator_dst_address);
        if receiving(state, &delegator, &src) {
            return Err(Rejection::staking("redelegation to this validator already in progress"));
        }
        let key = (delegator, src, dst);
        if state.redelegations.get(&key).map_or(0, Vec::len) >= usize::from(self.params.max_entries) {
            return Err(Rejection::staking("too many redelegation entries"));
        }
        let amount = unbond(state, delegator, src, msg.amount.amount)?;
        if amount == 0 {
            return Err(Rejection::staking("redelegation amount truncates to zero tokens"));
        }
        bond(state, delegator, dst, amount)?;
        state
            .redelegations
            .entry(key)
            .or_default()
            .push(self.header.time_ms + self.params.unbonding_time_ms);
        Ok(())
    }
}

fn spend(state: &mut LedgerState, address: &AccountAddress, coin: &Coin) -> Result<(), Rejection> {
    let account = state.accounts.get_mut(address).ok_or_else(|| Rejection {
        code: CODE_INSUFFICIENT_FUNDS,
        log: format!("account {address} does not exist"),
    })?;
    let amount: Coins = coin.clone().into();
    if !account.spendable().covers(&amount) {
        return Err(Rejection {
            code: CODE_INSUFFICIENT_FUNDS,
            log: format!("insufficient account funds; {} < {coin}", account.spendable()),
        });
    }
    account.coins = account.coins.safe_sub(&amount).unwrap_or_default();
    Ok(())
}

fn bond(
    state: &mut LedgerState,
    delegator: AccountAddress,
    operator: ValidatorAddress,
    amount: u64,
) -> Result<(), Rejection> {
    let validator = state
        .validators
        .get_mut(&operator)
        .ok_or_else(|| Rejection::staking("validator does not exist"))?;
    if validator.invalid_ex_rate() {
        return Err(Rejection::staking("cannot delegate to validators with invalid exchange rate"));
    }
    let shares = if validator.tokens == 0 {
        Decimal::from(amount)
    } else {
        validator
            .shares_from_tokens(amount)
            .map_err(|err| Rejection::staking(err.to_string()))?
    };
    if shares.is_zero() {
        return Err(Rejection::staking("delegation amount converts to zero shares"));
    }
    validator.tokens = validator
        .tokens
        .checked_add(amount)
        .ok_or_else(|| Rejection::staking("validator token overflow"))?;
    validator.delegator_shares += shares;
    *state.delegations.entry((delegator, operator)).or_insert(Decimal::ZERO) += shares;
    Ok(())
}

/// Remove `amount` tokens worth of shares; returns the whole tokens released.
fn unbond(
    state: &mut LedgerState,
    delegator: AccountAddress,
    operator: ValidatorAddress,
    amount: u64,
) -> Result<u64, Rejection> {
    let key = (delegator, operator);
    let held = *state
        .delegations
        .get(&key)
        .ok_or_else(|| Rejection::staking("no delegation for (address, validator) tuple"))?;
    let validator = state
        .validators
        .get_mut(&operator)
        .ok_or_else(|| Rejection::staking("validator does not exist"))?;
    let held_tokens = validator
        .truncated_tokens_from_shares(held)
        .map_err(|err| Rejection::staking(err.to_string()))?;
    let shares = if amount == held_tokens {
        held
    } else {
        validator
            .shares_from_tokens(amount)
            .map_err(|err| Rejection::staking(err.to_string()))?
    };
    if shares.is_zero() || shares > held {
        return Err(Rejection::staking("invalid shares amount"));
    }
    let released = validator
        .truncated_tokens_from_shares(shares)
        .map_err(|err| Rejection::staking(err.to_string()))?
        .min(validator.tokens);
    validator.tokens -= released;
    validator.delegator_shares -= shares;
    let remaining = held - shares;
    if remaining.is_zero() {
        state.delegations.remove(&key);
    } else {
        state.delegations.insert(key, remaining);
    }
    Ok(released)
}

fn receiving(state: &LedgerState, delegator: &AccountAddress, operator: &ValidatorAddress) -> bool {
    state
        .redelegations
        .iter()
        .any(|((del, _, dst), entries)| del == delegator && dst == operator && !entries.is_empty())
}

impl AccountKeeper for InMemoryChain {
    fn account(&self, address: &AccountAddress) -> Option<AccountInfo> {
        self.state.accounts.get(address).map(|account| AccountInfo {
            account_number: account.account_number,
            sequence: account.sequence,
        })
    }

    fn balance(&self, address: &AccountAddress, denom: &str) -> u64 {
        self.state
            .accounts
            .get(address)
            .map_or(0, |account| account.coins.amount_of(denom))
    }

    fn spendable_coins(&self, address: &AccountAddress, _time_ms: i64) -> Coins {
        self.state
            .accounts
            .get(address)
            .map(LedgerAccount::spendable)
            .unwrap_or_default()
    }
}

impl StakingKeeper for InMemoryChain {
    fn params(&self) -> StakingParams {
        self.params.clone()
    }

    fn validator(&self, operator: &ValidatorAddress) -> Option<Validator> {
        self.state.validators.get(operator).cloned()
    }

    fn validators(&self) -> Vec<Validator> {
        self.state.validators.values().cloned().collect()
    }

    fn validator_delegations(&self, operator: &ValidatorAddress) -> Vec<Delegation> {
        self.state
            .delegations
            .iter()
            .filter(|((_, validator), _)| validator == operator)
            .map(|((delegator, validator), shares)| Delegation {
                delegator: *delegator,
                validator: *validator,
                shares: *shares,
            })
            .collect()
    }

    fn has_max_unbonding_entries(
        &self,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
    ) -> bool {
        self.state
            .unbondings
            .get(&(*delegator, *validator))
            .map_or(0, Vec::len)
            >= usize::from(self.params.max_entries)
    }

    fn has_max_redelegation_entries(
        &self,
        delegator: &AccountAddress,
        src: &ValidatorAddress,
        dst: &ValidatorAddress,
    ) -> bool {
        self.state
            .redelegations
            .get(&(*delegator, *src, *dst))
            .map_or(0, Vec::len)
            >= usize::from(self.params.max_entries)
    }

    fn has_receiving_redelegation(
        &self,
        delegator: &AccountAddress,
        validator: &ValidatorAddress,
    ) -> bool {
        receiving(&self.state, delegator, validator)
    }
}

impl TxDeliverer for InMemoryChain {
    fn deliver(&mut self, tx: &SimTx) -> DeliverResult {
        match self.check_and_apply(tx) {
            Ok(()) => {
                self.delivered.push(tx.clone());
                DeliverResult::ok()
            }
            Err(rejection) => DeliverResult::fail(rejection.code, rejection.log),
        }
    }
}
