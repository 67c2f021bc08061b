//! Logging and OpenTelemetry setup.
//!
//! Spans are exported via OTLP/gRPC to a collector only when
//! `OTLP_ENABLE_TELEMETRY=true`; structured JSON logs are always written to stderr.
//!
//! # Telemetry invariants
//!
//! - **No key material, plaintext, tags or blobs** may appear in any span
//!   attribute or log field. Lengths and error codes only.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`). Sink loggers
//!   additionally honour `LOG_SINK_THRESHOLD` (default: `information`).

pub mod init;
pub mod sink;

pub use init::{init_telemetry, shutdown_telemetry};
pub use sink::{LogSink, UnknownSeverity, Severity, SinkLogger, SinkProvider, TracingSink};
