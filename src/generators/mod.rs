//! Proptest strategies for staking snapshots.

pub mod commission;
pub mod stake;

#[cfg(feature = "testing")]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod genesis;
