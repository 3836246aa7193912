//! Law/invariant assertion helpers.

pub mod invariants;
pub mod outcomes;
