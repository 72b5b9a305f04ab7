//! Command payloads and their renderings.
//!
//! Every report serializes to plain nested arrays (JSON output) and renders
//! to Markdown tables (`--format md`) or a single line (`--format summary`).

use bw_common::format_observations;
use bw_config::{ConfigSnapshot, ModelSpec};
use schemars::JsonSchema;
use serde::Serialize;
use std::fmt::Write;

use crate::estimator::HmmEstimator;
use crate::logspace;
use crate::sample::SampledSequence;
use crate::trace::TrainingOutcome;

/// Output schema version for report payloads.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Tolerance for the monotone-likelihood flag in reports.
pub const MONOTONE_TOLERANCE: f64 = 1e-9;

/// Where the model came from.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ModelProvenance {
    pub name: Option<String>,
    pub source: String,
    pub path: Option<String>,
    /// SHA-256 of the model's canonical JSON.
    pub hash: String,
}

impl From<&ConfigSnapshot> for ModelProvenance {
    fn from(snapshot: &ConfigSnapshot) -> Self {
        ModelProvenance {
            name: snapshot.model_name.clone(),
            source: snapshot.model_source.clone(),
            path: snapshot.model_path.clone(),
            hash: snapshot.model_hash.clone(),
        }
    }
}

/// A, B and π with their labels.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ParameterTables {
    pub states: Vec<String>,
    pub symbols: Vec<String>,
    pub transition: Vec<Vec<f64>>,
    pub emission: Vec<Vec<f64>>,
    pub initial: Vec<f64>,
}

impl ParameterTables {
    pub fn new(spec: &ModelSpec, hmm: &HmmEstimator) -> Self {
        ParameterTables {
            states: (0..hmm.n_states()).map(|i| spec.state_label(i)).collect(),
            symbols: (0..hmm.n_symbols()).map(|k| spec.symbol_label(k)).collect(),
            transition: hmm.transition().to_rows(),
            emission: hmm.emission().to_rows(),
            initial: hmm.initial().to_vec(),
        }
    }
}

/// One row of the convergence trace.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct IterationRow {
    /// 1-based iteration number.
    pub iteration: usize,
    pub log_likelihood: f64,
    pub negative_log_likelihood: f64,
    /// `exp(log_likelihood)`.
    pub probability: f64,
    /// `1 - probability^(1/T)`.
    pub probability_complement: f64,
}

/// Evolution of one transition entry across iterations.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Trajectory {
    pub from: String,
    pub to: String,
    pub values: Vec<f64>,
}

/// One arrow of the transition diagram.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TransitionEdge {
    pub from: String,
    pub to: String,
    /// Final A entry rounded to two decimals.
    pub probability: f64,
}

/// Payload of `bw-core train`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TrainReport {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: String,
    pub model: ModelProvenance,
    pub sequence: Vec<usize>,
    pub iterations: usize,
    pub initial_parameters: ParameterTables,
    pub trained_parameters: ParameterTables,
    pub log_likelihoods: Vec<f64>,
    pub trace: Vec<IterationRow>,
    pub transition_history: Vec<Vec<Vec<f64>>>,
    pub trajectories: Vec<Trajectory>,
    pub diagram: Vec<TransitionEdge>,
    /// True when no iteration lowered the log-likelihood.
    pub monotone: bool,
    /// ln P(O | trained λ) computed in the log domain; `None` when the
    /// sequence is impossible under the trained model.
    pub trained_log_likelihood: Option<f64>,
}

/// Inputs for building a [`TrainReport`].
pub struct TrainContext<'a> {
    pub run_id: &'a str,
    pub spec: &'a ModelSpec,
    pub snapshot: &'a ConfigSnapshot,
    pub observations: &'a [usize],
    pub initial: &'a HmmEstimator,
    pub trained: &'a HmmEstimator,
    pub outcome: &'a TrainingOutcome,
}

impl TrainReport {
    pub fn build(ctx: &TrainContext<'_>) -> Self {
        let spec = ctx.spec;
        let outcome = ctx.outcome;
        let t_len = ctx.observations.len();

        let nll = outcome.negative_log_likelihoods();
        let probs = outcome.probabilities();
        let complement = outcome.probability_complement(t_len);
        let trace = outcome
            .log_likelihoods
            .iter()
            .enumerate()
            .map(|(k, &ll)| IterationRow {
                iteration: k + 1,
                log_likelihood: ll,
                negative_log_likelihood: nll[k],
                probability: probs[k],
                probability_complement: complement[k],
            })
            .collect();

        let n = ctx.trained.n_states();
        let mut trajectories = Vec::with_capacity(n * n);
        let mut diagram = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                trajectories.push(Trajectory {
                    from: spec.state_label(i),
                    to: spec.state_label(j),
                    values: outcome.transition_trajectory(i, j),
                });
                diagram.push(TransitionEdge {
                    from: spec.state_label(i),
                    to: spec.state_label(j),
                    probability: round2(ctx.trained.transition()[(i, j)]),
                });
            }
        }

        let trained_log_likelihood = logspace::log_likelihood(ctx.trained, ctx.observations)
            .ok()
            .filter(|ll| ll.is_finite());

        TrainReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            run_id: ctx.run_id.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            model: ModelProvenance::from(ctx.snapshot),
            sequence: ctx.observations.to_vec(),
            iterations: outcome.iterations(),
            initial_parameters: ParameterTables::new(spec, ctx.initial),
            trained_parameters: ParameterTables::new(spec, ctx.trained),
            log_likelihoods: outcome.log_likelihoods.clone(),
            trace,
            transition_history: outcome
                .transition_history
                .iter()
                .map(|a| a.to_rows())
                .collect(),
            trajectories,
            diagram,
            monotone: outcome.is_monotone(MONOTONE_TOLERANCE),
            trained_log_likelihood,
        }
    }

    pub fn render_md(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# bw-core train\n");
        let _ = writeln!(
            out,
            "Model: {} ({})  ",
            self.model.name.as_deref().unwrap_or("unnamed"),
            self.model.source
        );
        let _ = writeln!(out, "Sequence: {}  ", format_observations(&self.sequence));
        let _ = writeln!(out, "Iterations: {}\n", self.iterations);

        let _ = writeln!(out, "## Initial Parameters\n");
        write_parameters(&mut out, &self.initial_parameters);

        let _ = writeln!(out, "## Updated Parameters\n");
        write_parameters(&mut out, &self.trained_parameters);

        if !self.trace.is_empty() {
            let _ = writeln!(out, "## Convergence\n");
            let _ = writeln!(out, "| Iteration | Log-likelihood | NLL | P(O) | 1 - P^(1/T) |");
            let _ = writeln!(out, "|-----------|----------------|-----|------|-------------|");
            for row in &self.trace {
                let _ = writeln!(
                    out,
                    "| {} | {:.6} | {:.6} | {:.6e} | {:.6} |",
                    row.iteration,
                    row.log_likelihood,
                    row.negative_log_likelihood,
                    row.probability,
                    row.probability_complement
                );
            }
            let _ = writeln!(out);

            let _ = writeln!(out, "## Transition Trajectories\n");
            let _ = writeln!(out, "| Transition | First | Last |");
            let _ = writeln!(out, "|------------|-------|------|");
            for traj in &self.trajectories {
                let first = traj.values.first().copied().unwrap_or(f64::NAN);
                let last = traj.values.last().copied().unwrap_or(f64::NAN);
                let _ = writeln!(
                    out,
                    "| {} → {} | {:.4} | {:.4} |",
                    traj.from, traj.to, first, last
                );
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "## Transition Diagram\n");
        for edge in &self.diagram {
            let _ = writeln!(out, "- {} → {}: {:.2}", edge.from, edge.to, edge.probability);
        }
        let _ = writeln!(out);

        if !self.monotone {
            let _ = writeln!(out, "Warning: log-likelihood decreased during training.\n");
        }
        out
    }

    pub fn render_summary(&self) -> String {
        let first = self.log_likelihoods.first();
        let last = self.log_likelihoods.last();
        match (first, last) {
            (Some(first), Some(last)) => format!(
                "[{}] train: T={} iterations={} log-likelihood {:.6} -> {:.6}{}",
                self.run_id,
                self.sequence.len(),
                self.iterations,
                first,
                last,
                if self.monotone { "" } else { " (non-monotone)" }
            ),
            _ => format!(
                "[{}] train: T={} iterations=0 (parameters unchanged)",
                self.run_id,
                self.sequence.len()
            ),
        }
    }
}

/// Which lattice a [`LatticeReport`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LatticeKind {
    Forward,
    Backward,
}

impl std::fmt::Display for LatticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LatticeKind::Forward => write!(f, "forward"),
            LatticeKind::Backward => write!(f, "backward"),
        }
    }
}

/// Payload of `bw-core forward` and `bw-core backward`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LatticeReport {
    pub schema_version: String,
    pub kind: LatticeKind,
    pub sequence: Vec<usize>,
    pub states: Vec<String>,
    /// T×N table, raw probabilities.
    pub table: Vec<Vec<f64>>,
    /// P(O | λ) from the forward lattice.
    pub probability: f64,
}

impl LatticeReport {
    pub fn new(
        kind: LatticeKind,
        spec: &ModelSpec,
        hmm: &HmmEstimator,
        observations: &[usize],
        table: Vec<Vec<f64>>,
        probability: f64,
    ) -> Self {
        LatticeReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            kind,
            sequence: observations.to_vec(),
            states: (0..hmm.n_states()).map(|i| spec.state_label(i)).collect(),
            table,
            probability,
        }
    }

    pub fn render_md(&self) -> String {
        let mut out = String::new();
        let symbol = match self.kind {
            LatticeKind::Forward => "α",
            LatticeKind::Backward => "β",
        };
        let _ = writeln!(out, "# bw-core {}\n", self.kind);
        let _ = writeln!(out, "Sequence: {}  ", format_observations(&self.sequence));
        let _ = writeln!(out, "P(O): {:.6e}\n", self.probability);

        let mut header = vec!["t".to_string(), "O[t]".to_string()];
        header.extend(self.states.iter().map(|s| format!("{}({})", symbol, s)));
        let rows = self
            .table
            .iter()
            .enumerate()
            .map(|(t, row)| {
                let mut cells = vec![t.to_string(), self.sequence[t].to_string()];
                cells.extend(row.iter().map(|v| format!("{:.6e}", v)));
                cells
            })
            .collect::<Vec<_>>();
        write_table(&mut out, &header, &rows);
        out
    }

    pub fn render_summary(&self) -> String {
        format!(
            "{}: T={} N={} P(O)={:.6e}",
            self.kind,
            self.sequence.len(),
            self.states.len(),
            self.probability
        )
    }
}

/// Payload of `bw-core sample`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SampleReport {
    pub schema_version: String,
    pub seed: u64,
    pub length: usize,
    pub states: Vec<usize>,
    pub observations: Vec<usize>,
    /// Observations in `--sequence` form.
    pub sequence: String,
}

impl From<&SampledSequence> for SampleReport {
    fn from(sampled: &SampledSequence) -> Self {
        SampleReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            seed: sampled.seed,
            length: sampled.observations.len(),
            states: sampled.states.clone(),
            observations: sampled.observations.clone(),
            sequence: format_observations(&sampled.observations),
        }
    }
}

impl SampleReport {
    pub fn render_md(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# bw-core sample\n");
        let _ = writeln!(out, "Seed: {}  ", self.seed);
        let _ = writeln!(out, "Length: {}\n", self.length);
        let _ = writeln!(out, "Observations: `{}`  ", self.sequence);
        let _ = writeln!(out, "Hidden states: `{}`", format_observations(&self.states));
        out
    }
}

/// Round to two decimals for diagram labels.
///
/// Decides on the exact binary value, ties to even: 0.125 gives 0.12 and
/// 0.135 (stored just above the tie) gives 0.14.
pub fn round2(value: f64) -> f64 {
    let low = (value * 100.0).floor();
    // Sign of value·100 − (low + ½) with a single rounding.
    let above_half = value.mul_add(100.0, -(low + 0.5));
    let cents = if above_half > 0.0 || (above_half == 0.0 && low % 2.0 != 0.0) {
        low + 1.0
    } else {
        low
    };
    cents / 100.0
}

fn write_parameters(out: &mut String, tables: &ParameterTables) {
    let mut header = vec!["A".to_string()];
    header.extend(tables.states.iter().cloned());
    let rows = tables
        .states
        .iter()
        .zip(&tables.transition)
        .map(|(label, row)| labeled_row(label, row))
        .collect::<Vec<_>>();
    write_table(out, &header, &rows);

    let mut header = vec!["B".to_string()];
    header.extend(tables.symbols.iter().cloned());
    let rows = tables
        .states
        .iter()
        .zip(&tables.emission)
        .map(|(label, row)| labeled_row(label, row))
        .collect::<Vec<_>>();
    write_table(out, &header, &rows);

    let mut header = vec!["π".to_string()];
    header.extend(tables.states.iter().cloned());
    write_table(out, &header, &[labeled_row("", &tables.initial)]);
}

fn labeled_row(label: &str, values: &[f64]) -> Vec<String> {
    let mut cells = vec![label.to_string()];
    cells.extend(values.iter().map(|v| format!("{:.4}", v)));
    cells
}

fn write_table(out: &mut String, header: &[String], rows: &[Vec<String>]) {
    let _ = writeln!(out, "| {} |", header.join(" | "));
    let _ = writeln!(
        out,
        "|{}|",
        header.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    );
    for row in rows {
        let _ = writeln!(out, "| {} |", row.join(" | "));
    }
    let _ = writeln!(out);
}
