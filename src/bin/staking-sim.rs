use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use staking_sim_ops::config::{GeneratorConfig, SimulationConfig};
use staking_sim_ops::report::{ReportFormat, render_report};
use staking_sim_ops::runner::run_simulation;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Parser)]
#[command(name = "staking-sim")]
#[command(about = "Seeded random staking operations against an in-memory chain")]
struct Cli {
    /// Seed of the shared random stream.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Blocks to simulate.
    #[arg(long, default_value_t = 100)]
    blocks: u64,
    /// Operations attempted per block.
    #[arg(long, default_value_t = 10)]
    ops_per_block: usize,
    /// Simulation accounts created at genesis.
    #[arg(long, default_value_t = 10)]
    accounts: usize,
    /// Bond-denom balance of every genesis account.
    #[arg(long, default_value_t = 100_000_000)]
    initial_balance: u64,
    /// Validators bootstrapped at genesis.
    #[arg(long, default_value_t = 3)]
    genesis_validators: usize,
    /// Block time advance in milliseconds.
    #[arg(long, default_value_t = 3_600_000)]
    block_interval_ms: i64,
    /// Length of random description fields.
    #[arg(long, default_value_t = 10)]
    description_len: usize,
    /// Output format.
    #[arg(long, value_enum, default_value = "md")]
    format: OutputFormat,
    /// Exit non-zero when any operation failed.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Markdown
    Md,
    /// JSON
    Json,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
    })
    .context("installing interrupt handler")?;

    let config = SimulationConfig::default()
        .with_seed(cli.seed)
        .with_blocks(cli.blocks)
        .with_ops_per_block(cli.ops_per_block)
        .with_accounts(cli.accounts)
        .with_initial_balance(cli.initial_balance)
        .with_genesis_validators(cli.genesis_validators)
        .with_block_interval_ms(cli.block_interval_ms);
    let generator = GeneratorConfig::default().with_description_len(cli.description_len);

    let run = run_simulation(&config, &generator, &INTERRUPTED);
    let format = match cli.format {
        OutputFormat::Md => ReportFormat::Markdown,
        OutputFormat::Json => ReportFormat::Json,
    };
    println!("{}", render_report(&run.report, format)?);

    if cli.strict && !run.report.is_clean() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
