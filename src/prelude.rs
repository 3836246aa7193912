//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust,ignore
//! use staking_sim_ops::prelude::*;
//! ```

pub use proptest::prelude::*;

pub use crate::account::{SimAccount, random_accounts};
pub use crate::config::{GeneratorConfig, SimulationConfig};
pub use crate::generators::commission::{arb_commission_rates, arb_description, rate_up_to};
pub use crate::generators::stake::{arb_broken_stake, arb_exchange_rate, arb_validator_stake};
pub use crate::keeper::{AccountKeeper, SimApp, StakingKeeper, TxDeliverer};
pub use crate::law::invariants::{
    assert_conserved, assert_delegations_positive, assert_delegator_shares_match,
};
pub use crate::law::outcomes::{
    assert_commission_within, assert_distinct_redelegation, assert_principal_positive,
    assert_principal_within,
};
pub use crate::operation::{OperationError, OperationKind, OperationOutcome, SimContext};
pub use crate::operations::{
    simulate_msg_begin_redelegate, simulate_msg_create_validator, simulate_msg_delegate,
    simulate_msg_edit_validator, simulate_msg_undelegate,
};
pub use crate::random::sim_rng;

#[cfg(feature = "testing")]
pub use crate::generators::genesis::{Genesis, arb_genesis};
#[cfg(feature = "testing")]
pub use crate::testing::InMemoryChain;
