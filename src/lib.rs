//! # staking-sim-ops
//!
//! `staking-sim-ops` generates randomized, state-consistent staking transactions for
//! property-based chain simulation. It is organized around:
//! - `operations`: the five generators (create-validator, edit-validator, delegate,
//!   undelegate, begin-redelegate) behind one shared pipeline in `operation`
//! - `keeper`: the read/deliver capabilities a chain must provide
//! - `random`: bounded random draws over a seedable stream
//! - `generators` and `law`: proptest strategies and assertions over staking state
//! - `testing`: an in-memory reference chain and seeded runner (feature `testing`)
//!
//! Every generator returns an [`operation::OperationOutcome`]: `NoOp` when no legal
//! action exists, `Success` with the delivered message, or `Error` for registry
//! inconsistencies and delivery failures.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod account;
pub mod address;
pub mod coins;
pub mod config;
pub mod generators;
pub mod keeper;
pub mod law;
pub mod msgs;
pub mod operation;
pub mod operations;
pub mod prelude;
pub mod random;
pub mod report;
pub mod staking;
pub mod tx;

#[cfg(feature = "testing")]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod runner;
#[cfg(feature = "testing")]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod testing;

/// Re-export `proptest` for convenience.
pub use proptest;
