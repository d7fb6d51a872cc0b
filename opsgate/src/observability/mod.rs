//! Observability utilities.

mod telemetry;

pub use telemetry::{init_tracing, LogFormat, SpanTimer, DEFAULT_FILTER};
