//! Where the log level and format for one invocation come from.
//!
//! Precedence, lowest first: built-in default (`info`, human), `RUST_LOG`,
//! `BW_LOG` / `BW_LOG_FORMAT`, then `-v`/`-q`/`--log-format`.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Log level override.
pub const ENV_LOG_LEVEL: &str = "BW_LOG";
/// Log format override (`human` or `jsonl`).
pub const ENV_LOG_FORMAT: &str = "BW_LOG_FORMAT";

/// How events are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format '{}' (human, jsonl)", other)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        })
    }
}

/// Level requested on the command line, if any.
///
/// `-q` wins over any number of `-v`.
pub fn cli_level(verbose: u8, quiet: bool) -> Option<LevelFilter> {
    match (quiet, verbose) {
        (true, _) => Some(LevelFilter::ERROR),
        (false, 0) => None,
        (false, 1) => Some(LevelFilter::DEBUG),
        (false, _) => Some(LevelFilter::TRACE),
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Maximum level emitted by bw-core.
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and the CLI flags.
    pub fn from_env(cli_level: Option<LevelFilter>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Resolve with an explicit variable lookup.
    ///
    /// Unparsable values are ignored and leave the lower-precedence setting.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli_level: Option<LevelFilter>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let env_level = lookup(ENV_LOG_LEVEL)
            .and_then(|val| val.trim().parse::<LevelFilter>().ok())
            .or_else(|| {
                // The most verbose level any RUST_LOG directive enables.
                lookup("RUST_LOG")
                    .and_then(|val| EnvFilter::try_new(val).ok())
                    .and_then(|filter| filter.max_level_hint())
            });
        let env_format = lookup(ENV_LOG_FORMAT).and_then(|val| val.parse::<LogFormat>().ok());

        let defaults = LogConfig::default();
        LogConfig {
            format: cli_format.or(env_format).unwrap_or(defaults.format),
            level: cli_level.or(env_level).unwrap_or(defaults.level),
        }
    }

    /// Filter that applies `level` to bw-core's own targets only.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::new(format!("bw_core={}", self.level))
    }
}
