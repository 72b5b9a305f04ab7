//! hmm-bw - Baum–Welch estimation for discrete hidden Markov models
//!
//! The main entry point for bw-core, handling:
//! - Model resolution (file, preset, environment)
//! - Training with a full convergence trace
//! - Forward/backward lattices and synthetic sequences
//! - Model validation and schema export

use bw_common::{format_error_human, parse_observations, OutputFormat, StructuredError};
use bw_config::{list_presets, load_model, LoadOptions, PresetName, ResolvedModel};
use bw_core::estimator::HmmEstimator;
use bw_core::exit_codes::ExitCode;
use bw_core::logging::{
    cli_level, event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, Stage,
};
use bw_core::log_event;
use bw_core::report::{LatticeKind, LatticeReport, SampleReport, TrainContext, TrainReport};
use bw_core::{logspace, sample_sequence, schema};
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Iteration budget when neither the command line nor the model sets one.
const DEFAULT_ITERATIONS: usize = 30;

/// hmm-bw - Estimate HMM parameters from an observation sequence
#[derive(Parser)]
#[command(name = "bw-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run Baum–Welch on an observation sequence
    Train(TrainArgs),

    /// Print the forward lattice α
    Forward(LatticeArgs),

    /// Print the backward lattice β
    Backward(LatticeArgs),

    /// Draw a synthetic sequence from the model
    Sample(SampleArgs),

    /// List built-in models
    Presets,

    /// Resolve and validate the model without training
    Check(CheckArgs),

    /// Print JSON Schemas for model files and outputs
    Schema(SchemaArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Model file (JSON, or TOML by extension)
    #[arg(long, short = 'm')]
    model: Option<PathBuf>,

    /// Built-in model (weather, coin, casino)
    #[arg(long, conflicts_with = "model")]
    preset: Option<PresetName>,

    /// Accept model files whose rows do not sum to one
    #[arg(long)]
    no_validate: bool,
}

impl ModelArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            model_path: self.model.clone(),
            preset: self.preset,
            skip_validation: self.no_validate,
        }
    }
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Comma-separated symbol indices, e.g. 0,1,1,0,1
    #[arg(long, short = 's')]
    sequence: String,

    /// Number of EM iterations (default: model's own, else 30)
    #[arg(long, short = 'n')]
    iterations: Option<usize>,

    /// Also write the JSON report to this file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LatticeArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Comma-separated symbol indices
    #[arg(long, short = 's')]
    sequence: String,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Number of symbols to draw
    #[arg(long, short = 'l', default_value_t = 20)]
    length: usize,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type to print (see --list)
    name: Option<String>,

    /// List available schema types
    #[arg(long, conflicts_with = "name")]
    list: bool,

    /// Print every schema
    #[arg(long, conflicts_with_all = ["name", "list"])]
    all: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            let _ = err.print();
            std::process::exit(ExitCode::ArgsError.as_i32());
        }
    };

    init_logging(&LogConfig::from_env(
        cli_level(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    ));

    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "bw-core started",
        version = env!("CARGO_PKG_VERSION")
    );

    let result = match &cli.command {
        Commands::Train(args) => run_train(&cli.global, &ctx, args),
        Commands::Forward(args) => run_lattice(&cli.global, &ctx, args, LatticeKind::Forward),
        Commands::Backward(args) => run_lattice(&cli.global, &ctx, args, LatticeKind::Backward),
        Commands::Sample(args) => run_sample(&cli.global, &ctx, args),
        Commands::Presets => run_presets(&cli.global),
        Commands::Check(args) => run_check(&cli.global, &ctx, args),
        Commands::Schema(args) => run_schema(&cli.global, args),
        Commands::Version => {
            print_version(&cli.global);
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => output_error(&cli.global, &ctx, &err),
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Report,
        "bw-core finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn resolve_model(ctx: &LogContext, args: &ModelArgs) -> bw_common::Result<ResolvedModel> {
    let resolved = load_model(&args.load_options()).map_err(|err| {
        log_event!(ctx, WARN, event_names::MODEL_ERROR, Stage::Load, err.to_string());
        bw_common::Error::from(err)
    })?;

    let event = if resolved.path.is_some() || args.preset.is_some() {
        event_names::MODEL_LOADED
    } else {
        event_names::MODEL_DEFAULT_USED
    };
    log_event!(
        ctx,
        INFO,
        event,
        Stage::Load,
        "model resolved",
        source = resolved.source.to_string(),
        model_hash = resolved.snapshot.short_id(),
        states = resolved.spec.n_states(),
        symbols = resolved.spec.n_symbols()
    );
    Ok(resolved)
}

fn parse_sequence(hmm: &HmmEstimator, raw: &str) -> bw_common::Result<Vec<usize>> {
    let observations = parse_observations(raw)?;
    hmm.check_observations(&observations)?;
    Ok(observations)
}

/// Warn when raw P(O | λ) is 0 but the log-domain likelihood is finite.
///
/// Returns the raw probability.
fn check_underflow(
    ctx: &LogContext,
    hmm: &HmmEstimator,
    observations: &[usize],
    stage: Stage,
) -> bw_common::Result<f64> {
    let probability = hmm.sequence_probability(observations)?;
    if probability == 0.0 {
        let ll = logspace::log_likelihood(hmm, observations)?;
        if ll.is_finite() {
            log_event!(
                ctx,
                WARN,
                event_names::PROBABILITY_UNDERFLOW,
                stage,
                "raw sequence probability underflowed to 0",
                sequence_length = observations.len(),
                log_likelihood = ll
            );
        }
    }
    Ok(probability)
}

fn run_train(global: &GlobalOpts, ctx: &LogContext, args: &TrainArgs) -> bw_common::Result<()> {
    let resolved = resolve_model(ctx, &args.model)?;
    let initial = HmmEstimator::from_spec(&resolved.spec)?;
    let observations = parse_sequence(&initial, &args.sequence)?;
    let iterations = args
        .iterations
        .or(resolved.spec.iterations)
        .unwrap_or(DEFAULT_ITERATIONS);

    log_event!(
        ctx,
        INFO,
        event_names::TRAIN_STARTED,
        Stage::Train,
        "training started",
        sequence_length = observations.len(),
        iterations = iterations
    );
    check_underflow(ctx, &initial, &observations, Stage::Train)?;

    let mut trained = initial.clone();
    let outcome = trained.train(&observations, iterations)?;
    if let Some(iteration) = outcome.log_likelihoods.iter().position(|ll| ll.is_nan()) {
        return Err(bw_common::Error::NumericalInstability(format!(
            "log-likelihood is NaN at iteration {}; the model parameters overflow",
            iteration + 1
        )));
    }

    for (iteration, ll) in outcome.log_likelihoods.iter().enumerate() {
        log_event!(
            ctx,
            DEBUG,
            event_names::TRAIN_ITERATION,
            Stage::Train,
            "iteration complete",
            iteration = iteration + 1,
            log_likelihood = *ll
        );
    }

    let report = TrainReport::build(&TrainContext {
        run_id: &ctx.run_id,
        spec: &resolved.spec,
        snapshot: &resolved.snapshot,
        observations: &observations,
        initial: &initial,
        trained: &trained,
        outcome: &outcome,
    });

    if !report.monotone {
        log_event!(
            ctx,
            WARN,
            event_names::TRAIN_NOT_MONOTONE,
            Stage::Train,
            "log-likelihood decreased between iterations"
        );
    }
    log_event!(
        ctx,
        INFO,
        event_names::TRAIN_FINISHED,
        Stage::Train,
        "training finished",
        iterations = outcome.iterations(),
        final_log_likelihood = outcome.final_log_likelihood().unwrap_or(f64::NAN)
    );

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        log_event!(
            ctx,
            INFO,
            event_names::REPORT_WRITTEN,
            Stage::Report,
            "report written",
            path = path.display().to_string()
        );
    }

    emit(global, &report, || report.render_md(), || report.render_summary())
}

fn run_lattice(
    global: &GlobalOpts,
    ctx: &LogContext,
    args: &LatticeArgs,
    kind: LatticeKind,
) -> bw_common::Result<()> {
    let resolved = resolve_model(ctx, &args.model)?;
    let hmm = HmmEstimator::from_spec(&resolved.spec)?;
    let observations = parse_sequence(&hmm, &args.sequence)?;

    let table = match kind {
        LatticeKind::Forward => hmm.forward(&observations)?,
        LatticeKind::Backward => hmm.backward(&observations)?,
    };
    let probability = check_underflow(ctx, &hmm, &observations, Stage::Lattice)?;

    let report = LatticeReport::new(
        kind,
        &resolved.spec,
        &hmm,
        &observations,
        table.to_rows(),
        probability,
    );
    emit(global, &report, || report.render_md(), || report.render_summary())
}

fn run_sample(global: &GlobalOpts, ctx: &LogContext, args: &SampleArgs) -> bw_common::Result<()> {
    let resolved = resolve_model(ctx, &args.model)?;
    let hmm = HmmEstimator::from_spec(&resolved.spec)?;
    let sampled = sample_sequence(&hmm, args.length, args.seed)?;
    let report = SampleReport::from(&sampled);
    emit(global, &report, || report.render_md(), || report.sequence.clone())
}

fn run_presets(global: &GlobalOpts) -> bw_common::Result<()> {
    let presets = list_presets();
    let response = serde_json::json!({
        "schema_version": bw_core::report::REPORT_SCHEMA_VERSION,
        "presets": presets,
    });
    emit(
        global,
        &response,
        || {
            let mut out = String::from("# bw-core presets\n\n");
            out.push_str("| Name | States | Symbols | Iterations | Description |\n");
            out.push_str("|------|--------|---------|------------|-------------|\n");
            for p in &presets {
                out.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    p.name,
                    p.states.join(", "),
                    p.symbols.join(", "),
                    p.iterations.map(|n| n.to_string()).unwrap_or_default(),
                    p.description
                ));
            }
            out
        },
        || {
            presets
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        },
    )
}

fn run_check(global: &GlobalOpts, ctx: &LogContext, args: &CheckArgs) -> bw_common::Result<()> {
    let resolved = resolve_model(ctx, &args.model)?;
    HmmEstimator::from_spec(&resolved.spec)?;

    let response = serde_json::json!({
        "schema_version": bw_core::report::REPORT_SCHEMA_VERSION,
        "status": "ok",
        "snapshot": resolved.snapshot,
    });
    let snapshot = &resolved.snapshot;
    emit(
        global,
        &response,
        || {
            format!(
                "# bw-core check\n\n✓ model: ok\n  Source: {}\n  Path: {}\n  States: {}  Symbols: {}\n  Hash: {}\n",
                snapshot.model_source,
                snapshot.model_path.as_deref().unwrap_or("-"),
                snapshot.n_states,
                snapshot.n_symbols,
                snapshot.short_id()
            )
        },
        || format!("check: OK ({}, {})", snapshot.model_source, snapshot.short_id()),
    )
}

fn run_schema(global: &GlobalOpts, args: &SchemaArgs) -> bw_common::Result<()> {
    if args.list {
        for (name, description) in schema::available_schemas() {
            println!("{:<14} {}", name, description);
        }
        return Ok(());
    }
    if args.all {
        let all = schema::generate_all_schemas();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    let name = args.name.as_deref().unwrap_or("ModelSpec");
    let value = schema::generate_schema(name).ok_or_else(|| {
        bw_common::Error::InvalidArgument(format!(
            "unknown schema type '{}' (try --list)",
            name
        ))
    })?;
    match global.format {
        OutputFormat::Summary => println!("{}", serde_json::to_string(&value)?),
        _ => println!("{}", serde_json::to_string_pretty(&value)?),
    }
    Ok(())
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": bw_core::report::REPORT_SCHEMA_VERSION,
        "config_schema_version": bw_config::CONFIG_SCHEMA_VERSION,
        "bw_core_version": env!("CARGO_PKG_VERSION"),
    });

    match global.format {
        OutputFormat::Json => println!("{}", version_info),
        _ => {
            println!("bw-core {}", env!("CARGO_PKG_VERSION"));
            println!("model schema version: {}", bw_config::CONFIG_SCHEMA_VERSION);
        }
    }
}

/// Write a payload to stdout in the requested format.
fn emit<T: Serialize>(
    global: &GlobalOpts,
    payload: &T,
    markdown: impl FnOnce() -> String,
    summary: impl FnOnce() -> String,
) -> bw_common::Result<()> {
    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(payload)?),
        OutputFormat::Md => print!("{}", markdown()),
        OutputFormat::Summary => println!("{}", summary()),
    }
    Ok(())
}

fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &bw_common::Error) -> ExitCode {
    let exit_code = ExitCode::for_error(err);

    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(err)
                .with_context("exit_code", exit_code.code_name())
                .with_context("run_id", &ctx.run_id);
            eprintln!("{}", structured.to_json());
        }
        OutputFormat::Summary => {
            eprintln!("[{}] error {}: {}", ctx.run_id, err.code(), err);
        }
        OutputFormat::Md => {
            let use_color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, use_color));
        }
    }

    exit_code
}
