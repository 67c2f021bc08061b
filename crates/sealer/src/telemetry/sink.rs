//! Severity-based log sink adapter.
//!
//! Callers that think in terms of `(severity, message)` pairs log through a
//! [`SinkLogger`], which gates on [`LogSink::is_enabled`], appends any attached
//! error to the message, and hands the result to its sink. [`TracingSink`] is
//! the production sink; it forwards every message to `tracing` under a
//! per-category field. [`SinkProvider`] hands out one logger per category.

use std::{collections::HashMap, str::FromStr, sync::Arc};

use arc_swap::ArcSwap;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn, Level};

/// Ordered log severities, lowest first. [`Severity::None`] disables output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    None,
}

impl Severity {
    /// The `tracing` level a message of this severity is written at.
    ///
    /// `tracing` has no level above `ERROR`, so [`Severity::Critical`] shares it
    /// (and is marked with a `critical = true` field by [`TracingSink`]).
    pub fn level(self) -> Option<Level> {
        match self {
            Severity::Trace => Some(Level::TRACE),
            Severity::Debug => Some(Level::DEBUG),
            Severity::Information => Some(Level::INFO),
            Severity::Warning => Some(Level::WARN),
            Severity::Error | Severity::Critical => Some(Level::ERROR),
            Severity::None => None,
        }
    }
}

/// Returned when parsing an unknown severity name, e.g. from
/// `LOG_SINK_THRESHOLD`.
#[derive(Debug, Error)]
#[error("unknown severity: {0}")]
pub struct UnknownSeverity(String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "information" | "info" => Ok(Severity::Information),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" | "fatal" => Ok(Severity::Critical),
            "none" => Ok(Severity::None),
            _ => Err(UnknownSeverity(s.to_owned())),
        }
    }
}

/// External log sink: accepts a severity and a fully formatted message.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    /// Whether messages at `severity` would be recorded.
    fn is_enabled(&self, severity: Severity) -> bool;

    /// Record one formatted message.
    fn write(&self, severity: Severity, message: &str);
}

/// Guard for a logical logging scope. Scopes carry no state; dropping the
/// guard ends the scope.
#[derive(Debug, Default)]
pub struct Scope {
    _private: (),
}

/// Formats messages and forwards them to a [`LogSink`].
#[derive(Debug)]
pub struct SinkLogger<S> {
    sink: S,
    threshold: Severity,
}

impl<S: LogSink> SinkLogger<S> {
    /// Wrap `sink` with no threshold of its own; the sink alone decides.
    pub fn new(sink: S) -> Self {
        Self::with_threshold(sink, Severity::Trace)
    }

    /// Wrap `sink`, dropping anything below `threshold` before the sink is asked.
    pub fn with_threshold(sink: S, threshold: Severity) -> Self {
        Self { sink, threshold }
    }

    /// `false` for [`Severity::None`] and for severities below the threshold,
    /// otherwise whatever the sink reports.
    pub fn is_enabled(&self, severity: Severity) -> bool {
        severity != Severity::None
            && severity >= self.threshold
            && self.sink.is_enabled(severity)
    }

    /// Begin a logical scope. Scopes are accepted and ignored.
    pub fn begin_scope(&self, _name: &str) -> Scope {
        Scope::default()
    }

    /// Log `message`, with `error` appended after a space when present.
    ///
    /// Disabled severities and blank messages are dropped.
    pub fn log(&self, severity: Severity, message: &str, error: Option<&dyn std::error::Error>) {
        if !self.is_enabled(severity) {
            return;
        }
        let formatted = match error {
            Some(e) => format!("{message} {e}"),
            None => message.to_owned(),
        };
        let formatted = formatted.trim();
        if formatted.is_empty() {
            return;
        }
        self.sink.write(severity, formatted);
    }

    /// The wrapped sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// [`LogSink`] that writes through the global `tracing` dispatcher.
#[derive(Debug, Clone)]
pub struct TracingSink {
    category: String,
}

impl TracingSink {
    /// Sink that tags every event with `category`.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
        }
    }

    /// Category recorded on every event.
    pub fn category(&self) -> &str {
        &self.category
    }
}

impl LogSink for TracingSink {
    fn is_enabled(&self, severity: Severity) -> bool {
        match severity.level() {
            Some(Level::TRACE) => tracing::enabled!(Level::TRACE),
            Some(Level::DEBUG) => tracing::enabled!(Level::DEBUG),
            Some(Level::INFO) => tracing::enabled!(Level::INFO),
            Some(Level::WARN) => tracing::enabled!(Level::WARN),
            Some(_) => tracing::enabled!(Level::ERROR),
            None => false,
        }
    }

    fn write(&self, severity: Severity, message: &str) {
        let category = self.category.as_str();
        match severity {
            Severity::Trace => trace!(category, "{message}"),
            Severity::Debug => debug!(category, "{message}"),
            Severity::Information => info!(category, "{message}"),
            Severity::Warning => warn!(category, "{message}"),
            Severity::Error => error!(category, "{message}"),
            Severity::Critical => error!(category, critical = true, "{message}"),
            Severity::None => {}
        }
    }
}

/// Hands out one [`SinkLogger`] per category, creating it on first use.
///
/// Backed by [`ArcSwap`] so lookups of existing categories never block.
#[derive(Clone, Debug)]
pub struct SinkProvider {
    inner: Arc<ArcSwap<HashMap<String, Arc<SinkLogger<TracingSink>>>>>,
    threshold: Severity,
}

impl SinkProvider {
    /// Create a new, empty [`SinkProvider`] whose loggers forward every
    /// severity the subscriber enables.
    pub fn new() -> Self {
        Self::with_threshold(Severity::Trace)
    }

    /// Create a new, empty [`SinkProvider`] whose loggers drop anything below
    /// `threshold`.
    pub fn with_threshold(threshold: Severity) -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(HashMap::new()))),
            threshold,
        }
    }

    /// Minimum severity forwarded by loggers from this provider.
    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// Return the logger for `category`, creating it if needed.
    pub fn logger(&self, category: &str) -> Arc<SinkLogger<TracingSink>> {
        if let Some(existing) = self.inner.load().get(category) {
            return Arc::clone(existing);
        }

        let created = Arc::new(SinkLogger::with_threshold(
            TracingSink::new(category),
            self.threshold,
        ));
        let mut chosen = Arc::clone(&created);
        self.inner.rcu(|current| {
            let mut map = HashMap::clone(current);
            let entry = map
                .entry(category.to_owned())
                .or_insert_with(|| Arc::clone(&created));
            chosen = Arc::clone(entry);
            map
        });
        chosen
    }

    /// Number of categories with a cached logger.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// `true` if no logger has been created since the last [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Drop every cached logger.
    pub fn clear(&self) {
        self.inner.store(Arc::new(HashMap::new()));
    }
}

impl Default for SinkProvider {
    fn default() -> Self {
        Self::new()
    }
}
