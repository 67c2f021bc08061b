//! Configuration loading and validation for the `sealer` binary.
//!
//! All values are read from environment variables at startup. The codec itself
//! takes no configuration; these settings only drive logging and telemetry.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::telemetry::Severity;

/// Validated runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service name reported to the telemetry collector.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`). `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Export spans over OTLP/gRPC when `true`.
    #[serde(default)]
    pub otlp_enable_telemetry: bool,

    /// OTLP collector endpoint, e.g. `http://otel-collector:4317`.
    /// **Required** when telemetry is enabled.
    #[serde(default)]
    pub otlp_collector_address: Option<String>,

    /// Lowest [`Severity`] the CLI's sink logger forwards (e.g. `"warning"`).
    #[serde(default = "default_log_sink_threshold")]
    pub log_sink_threshold: String,
}

fn default_service_name() -> String {
    "sealer".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_sink_threshold() -> String {
    "information".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            otlp_enable_telemetry: false,
            otlp_collector_address: None,
            log_sink_threshold: default_log_sink_threshold(),
        }
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The collector endpoint, if telemetry export is enabled.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        if self.otlp_enable_telemetry {
            self.otlp_collector_address.as_deref()
        } else {
            None
        }
    }

    /// The parsed sink threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if `LOG_SINK_THRESHOLD` is not a severity name.
    pub fn sink_threshold(&self) -> Result<Severity> {
        self.log_sink_threshold
            .parse()
            .context("LOG_SINK_THRESHOLD is not a valid severity")
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            anyhow::bail!("SERVICE_NAME must not be empty");
        }
        self.sink_threshold()?;
        if self.otlp_enable_telemetry {
            let addr = self
                .otlp_collector_address
                .as_deref()
                .map(str::trim)
                .unwrap_or_default();
            if addr.is_empty() {
                anyhow::bail!(
                    "OTLP_COLLECTOR_ADDRESS is required when OTLP_ENABLE_TELEMETRY is true"
                );
            }
            if !(addr.starts_with("http://") || addr.starts_with("https://")) {
                anyhow::bail!("OTLP_COLLECTOR_ADDRESS must be an http:// or https:// URL");
            }
        }
        Ok(())
    }
}
