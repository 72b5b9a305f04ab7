//! Structured logging for bw-core.
//!
//! Two modes, both on stderr:
//! - Human-readable console output for interactive use
//! - JSON lines for scripted runs (`--log-format jsonl` or `BW_LOG_FORMAT=jsonl`)
//!
//! stdout is reserved for command payloads (JSON/Markdown output).
//!
//! ```ignore
//! use bw_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! let ctx = LogContext::new(generate_run_id());
//! bw_core::log_event!(ctx, INFO, event_names::TRAIN_STARTED, Stage::Train, "starting");
//! ```

pub mod config;
pub mod events;

pub use config::{cli_level, LogConfig, LogFormat, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
pub use events::{event_names, LogContext, Stage};

use std::io::IsTerminal;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the logging subsystem.
///
/// Call once at startup. Only `config.level` decides what is emitted;
/// environment variables are already folded into it. A second call is
/// ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = config.filter();

    let result = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}

/// Structured event logging with a [`LogContext`].
///
/// ```ignore
/// log_event!(ctx, INFO, "train.finished", Stage::Train, "done", iterations = 30);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();

        assert!(id1.starts_with("run-"));
        assert_ne!(id1, id2);
        // run-<12 hex chars>
        assert_eq!(id1.len(), 16);
        assert!(id1[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        let config = LogConfig {
            level: tracing_subscriber::filter::LevelFilter::WARN,
            ..LogConfig::default()
        };
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn test_log_event_macro_compiles_for_all_levels() {
        let ctx = LogContext::new("run-test");
        crate::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "info");
        crate::log_event!(ctx, DEBUG, event_names::TRAIN_ITERATION, Stage::Train, "debug", iteration = 3);
        crate::log_event!(ctx, WARN, event_names::TRAIN_NOT_MONOTONE, Stage::Train, "warn");
        crate::log_event!(ctx, ERROR, event_names::MODEL_ERROR, Stage::Load, "error");
    }
}
