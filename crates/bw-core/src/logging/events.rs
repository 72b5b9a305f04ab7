//! Event names and stages attached to every log line.
//!
//! Each line carries the invocation's run_id and the stage that produced it,
//! so JSONL logs from several runs can be interleaved and still grouped.

use serde::{Deserialize, Serialize};

/// Stages of one bw-core invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and argument handling.
    Init,
    /// Model resolution and parsing.
    Load,
    /// Standalone forward/backward passes.
    Lattice,
    /// EM iterations.
    Train,
    /// Rendering command output.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Lattice => "lattice",
            Stage::Train => "train",
            Stage::Report => "report",
        })
    }
}

/// Values of the `event` field.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const MODEL_LOADED: &str = "model.loaded";
    pub const MODEL_DEFAULT_USED: &str = "model.default_used";
    pub const MODEL_ERROR: &str = "model.error";

    pub const TRAIN_STARTED: &str = "train.started";
    pub const TRAIN_ITERATION: &str = "train.iteration";
    pub const TRAIN_FINISHED: &str = "train.finished";
    pub const TRAIN_NOT_MONOTONE: &str = "train.not_monotone";

    /// Raw P(O | λ) is 0 while the log-domain value is finite.
    pub const PROBABILITY_UNDERFLOW: &str = "probability.underflow";

    pub const REPORT_WRITTEN: &str = "report.written";
}

/// Correlation context shared by every event of one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }
}
