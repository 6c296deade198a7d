// * Telemetry - Structured logging for every pipeline stage
// * JSON lines by default, pretty output for interactive runs

use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{}', expected json or pretty", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

/// Initializes tracing with an explicit format and fallback level.
/// `RUST_LOG` still takes precedence over `level`.
///
/// # Example
/// ```ignore
/// use notesift::ops::{telemetry, LogFormat};
///
/// telemetry::init_tracing_with(LogFormat::Json, "info");
/// tracing::info!(path = "notes.jsonl", "Normalizing notes");
/// ```
pub fn init_tracing_with(format: LogFormat, level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(env_filter);
    // * try_init so a second call (tests, embedding) is a no-op instead of a panic
    let _ = match format {
        LogFormat::Json => registry.with(tracing_fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_fmt::layer().pretty()).try_init(),
    };
}

/// Logs the elapsed wall time of a stage when dropped
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        tracing::info!(stage = stage, "Stage started");
        Self {
            stage,
            started: Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        tracing::info!(
            stage = self.stage,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Stage finished"
        );
    }
}
