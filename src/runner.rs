//! Seeded multi-block simulation over [`InMemoryChain`].

use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::account::{SimAccount, random_accounts};
use crate::config::{GeneratorConfig, SimulationConfig};
use crate::operation::{OperationKind, SimContext};
use crate::random::{SimRng, random_dec_amount, sim_rng};
use crate::report::SimulationReport;
use crate::staking::CommissionRates;
use crate::testing::InMemoryChain;

/// Final state of a run alongside its report.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    /// Outcome tallies.
    pub report: SimulationReport,
    /// Simulation-account registry.
    pub accounts: Vec<SimAccount>,
    /// Chain state after the last simulated block.
    pub chain: InMemoryChain,
}

fn genesis_rates(rng: &mut SimRng) -> CommissionRates {
    let max_rate = Decimal::new(rng.gen_range(0..=100), 2);
    CommissionRates::new(
        random_dec_amount(rng, max_rate),
        max_rate,
        random_dec_amount(rng, max_rate),
    )
}

/// Build the genesis registry and chain for `config` from `rng`.
pub fn genesis(config: &SimulationConfig, rng: &mut SimRng) -> (Vec<SimAccount>, InMemoryChain) {
    let accounts = random_accounts(rng, config.accounts);
    let mut chain = InMemoryChain::genesis(&config.chain_id, &accounts, config.initial_balance);
    let self_bond = (config.initial_balance / 10).max(1);
    for operator in accounts.iter().take(config.genesis_validators) {
        let rates = genesis_rates(rng);
        chain.bootstrap_validator(operator, self_bond, rates);
    }
    (accounts, chain)
}

/// Run `config.blocks` blocks, each attempting `config.ops_per_block`
/// uniformly chosen operations, until done or `interrupted` is set.
///
/// One random stream seeded from `config.seed` drives genesis, operation
/// choice and every generator, so a seed reproduces the run exactly.
pub fn run_simulation(
    config: &SimulationConfig,
    generator: &GeneratorConfig,
    interrupted: &AtomicBool,
) -> SimulationRun {
    let mut rng = sim_rng(config.seed);
    let (accounts, mut chain) = genesis(config, &mut rng);
    let mut report = SimulationReport::new(config.seed);
    info!(
        seed = config.seed,
        accounts = accounts.len(),
        blocks = config.blocks,
        "starting staking simulation"
    );

    'blocks: for _ in 0..config.blocks {
        let header = chain.header().clone();
        for _ in 0..config.ops_per_block {
            if interrupted.load(Ordering::SeqCst) {
                report.interrupted = true;
                break 'blocks;
            }
            let kind = OperationKind::ALL[rng.gen_range(0..OperationKind::ALL.len())];
            let ctx = SimContext::new(&accounts, &header, generator);
            let outcome = kind.simulate(&mut rng, &mut chain, &ctx);
            report.record(header.height, kind, &outcome);
        }
        report.blocks += 1;
        debug!(height = header.height, "block finished");
        chain.advance_block(config.block_interval_ms);
    }

    let totals = report.totals();
    info!(
        blocks = report.blocks,
        success = totals.success,
        noop = totals.noop,
        error = totals.error,
        interrupted = report.interrupted,
        "staking simulation finished"
    );
    SimulationRun {
        report,
        accounts,
        chain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::StakingKeeper;

    #[test]
    fn genesis_bootstraps_requested_validators() {
        let config = SimulationConfig::default().with_accounts(4).with_genesis_validators(2);
        let (accounts, chain) = genesis(&config, &mut sim_rng(config.seed));
        assert_eq!(accounts.len(), 4);
        assert_eq!(chain.validators().len(), 2);
    }

    #[test]
    fn interrupted_run_stops_immediately() {
        let config = SimulationConfig::default().with_blocks(5);
        let stop = AtomicBool::new(true);
        let run = run_simulation(&config, &GeneratorConfig::default(), &stop);
        assert!(run.report.interrupted);
        assert_eq!(run.report.blocks, 0);
        assert_eq!(run.report.totals().total(), 0);
    }

    #[test]
    fn same_seed_reproduces_report() {
        let config = SimulationConfig::default().with_blocks(5).with_ops_per_block(5);
        let stop = AtomicBool::new(false);
        let first = run_simulation(&config, &GeneratorConfig::default(), &stop);
        let second = run_simulation(&config, &GeneratorConfig::default(), &stop);
        assert_eq!(first.report, second.report);
        assert_eq!(first.chain, second.chain);
    }
}
