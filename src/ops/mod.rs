// * Operations: logging setup shared by every stage binary entrypoint

pub mod telemetry;

pub use telemetry::{init_tracing_with, LogFormat, StageTimer};
