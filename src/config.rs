//! Generator and simulation-run configuration.

use serde::{Deserialize, Serialize};

use crate::tx::DEFAULT_GEN_TX_GAS;

/// Knobs shared by every operation generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Length of each random description field.
    pub description_len: usize,
    /// Minimum self-delegation attached to new validators.
    pub min_self_delegation: u64,
    /// Upper bound, in percent, for a new validator's max commission rate.
    pub max_commission_percent: u32,
    /// Gas limit attached to generated transactions.
    pub gas: u64,
    /// Memo attached to generated transactions.
    pub memo: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            description_len: 10,
            min_self_delegation: 1,
            max_commission_percent: 100,
            gas: DEFAULT_GEN_TX_GAS,
            memo: String::new(),
        }
    }
}

impl GeneratorConfig {
    /// Set description field length.
    pub fn with_description_len(mut self, description_len: usize) -> Self {
        self.description_len = description_len;
        self
    }

    /// Set minimum self-delegation.
    pub fn with_min_self_delegation(mut self, min_self_delegation: u64) -> Self {
        self.min_self_delegation = min_self_delegation;
        self
    }

    /// Set max-commission upper bound in percent.
    pub fn with_max_commission_percent(mut self, percent: u32) -> Self {
        self.max_commission_percent = percent;
        self
    }

    /// Set gas limit.
    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    /// Set memo.
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }
}

/// Shape of a seeded simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Seed of the shared random stream.
    pub seed: u64,
    /// Blocks to simulate.
    pub blocks: u64,
    /// Operations attempted per block.
    pub ops_per_block: usize,
    /// Simulation accounts created at genesis.
    pub accounts: usize,
    /// Bond-denom balance of every genesis account.
    pub initial_balance: u64,
    /// Validators bootstrapped at genesis, operated by the first accounts.
    pub genesis_validators: usize,
    /// Block time advance in milliseconds.
    pub block_interval_ms: i64,
    /// Chain id.
    pub chain_id: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            blocks: 100,
            ops_per_block: 10,
            accounts: 10,
            initial_balance: 100_000_000,
            genesis_validators: 3,
            block_interval_ms: 60 * 60 * 1000,
            chain_id: "staking-sim".to_string(),
        }
    }
}

impl SimulationConfig {
    /// Set seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set block count.
    pub fn with_blocks(mut self, blocks: u64) -> Self {
        self.blocks = blocks;
        self
    }

    /// Set operations per block.
    pub fn with_ops_per_block(mut self, ops_per_block: usize) -> Self {
        self.ops_per_block = ops_per_block;
        self
    }

    /// Set account count.
    pub fn with_accounts(mut self, accounts: usize) -> Self {
        self.accounts = accounts;
        self
    }

    /// Set initial balance.
    pub fn with_initial_balance(mut self, initial_balance: u64) -> Self {
        self.initial_balance = initial_balance;
        self
    }

    /// Set genesis validator count.
    pub fn with_genesis_validators(mut self, genesis_validators: usize) -> Self {
        self.genesis_validators = genesis_validators;
        self
    }

    /// Set block interval.
    pub fn with_block_interval_ms(mut self, block_interval_ms: i64) -> Self {
        self.block_interval_ms = block_interval_ms;
        self
    }
}
