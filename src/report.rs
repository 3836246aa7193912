//! Outcome tallies for a simulation run, rendered as Markdown or JSON.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::operation::{OperationKind, OperationOutcome};

/// Supported output formats for run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown summary.
    Markdown,
    /// JSON summary with every recorded failure inline.
    Json,
}

/// Outcome counts of one operation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindTally {
    /// No legal operation existed.
    pub noop: u64,
    /// Message delivered.
    pub success: u64,
    /// Unexpected failure.
    pub error: u64,
}

impl KindTally {
    /// Calls recorded.
    pub fn total(&self) -> u64 {
        self.noop + self.success + self.error
    }
}

/// One failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Block the failure happened in.
    pub block_height: u64,
    /// Operation kind.
    pub kind: OperationKind,
    /// Failure message.
    pub message: String,
}

/// Aggregated results of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Seed of the run.
    pub seed: u64,
    /// Blocks simulated.
    pub blocks: u64,
    /// True when the run stopped before its last block.
    pub interrupted: bool,
    /// Counts per operation kind.
    pub kinds: BTreeMap<OperationKind, KindTally>,
    /// Every failure, in order.
    pub failures: Vec<FailureReport>,
}

impl SimulationReport {
    /// Empty report for a run with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Count one outcome.
    pub fn record(&mut self, block_height: u64, kind: OperationKind, outcome: &OperationOutcome) {
        let tally = self.kinds.entry(kind).or_default();
        match outcome {
            OperationOutcome::NoOp => tally.noop += 1,
            OperationOutcome::Success { .. } => tally.success += 1,
            OperationOutcome::Error(error) => {
                tally.error += 1;
                self.failures.push(FailureReport {
                    block_height,
                    kind,
                    message: error.to_string(),
                });
            }
        }
    }

    /// Counts summed over every kind.
    pub fn totals(&self) -> KindTally {
        self.kinds
            .values()
            .fold(KindTally::default(), |acc, tally| KindTally {
                noop: acc.noop + tally.noop,
                success: acc.success + tally.success,
                error: acc.error + tally.error,
            })
    }

    /// True when no operation failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Render the report in the requested format.
pub fn render_report(
    report: &SimulationReport,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "seed": report.seed,
            "blocks": report.blocks,
            "interrupted": report.interrupted,
            "totals": report.totals(),
            "kinds": report.kinds,
            "failures": report.failures,
        })),
        ReportFormat::Markdown => {
            let mut out = format!("# Staking Simulation (seed {})\n\n", report.seed);
            out.push_str(&format!(
                "- blocks: {}\n- interrupted: {}\n\n",
                report.blocks, report.interrupted
            ));

            out.push_str("## Outcomes\n\n| operation | no-op | success | error |\n|---|---:|---:|---:|\n");
            for (kind, tally) in &report.kinds {
                out.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    kind, tally.noop, tally.success, tally.error
                ));
            }
            let totals = report.totals();
            out.push_str(&format!(
                "| **total** | {} | {} | {} |\n",
                totals.noop, totals.success, totals.error
            ));

            if !report.failures.is_empty() {
                out.push_str("\n## Failures\n\n");
                for failure in &report.failures {
                    out.push_str(&format!(
                        "- block {} `{}`: {}\n",
                        failure.block_height, failure.kind, failure.message
                    ));
                }
            }
            Ok(out)
        }
    }
}
