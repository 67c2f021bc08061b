//! `sealer` command-line entry point.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Config`] from environment variables.
//! 3. Initialise telemetry (JSON logs on stderr, optional OTLP export).
//! 4. Run `seal` or `unseal`, printing the result on stdout.
//!
//! Failures print an [`ErrorResponse`] as JSON on stderr and exit with
//! [`SealError::exit_code`] (or `1` for anything else).

use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::protocol::ErrorResponse;
use sealer::config::Config;
use sealer::telemetry::{self, Severity, SinkLogger, SinkProvider, TracingSink};
use sealer::{SealError, SecretKey};
use tracing::{info, warn};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "sealer", version, about = "Seal and unseal strings (AES-CBC + HMAC-SHA256)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt a string and print `{"blob": ..., "key": ...}` as JSON.
    Seal {
        /// Base64 key to reuse. A fresh 256-bit key is generated when omitted.
        #[arg(long, env = "SEALER_KEY", hide_env_values = true)]
        key: Option<String>,
        /// Plaintext to seal. Read from stdin when omitted (one trailing newline is dropped).
        plaintext: Option<String>,
    },
    /// Decrypt and verify a blob, printing the plaintext.
    Unseal {
        /// Base64 key returned by `seal`.
        #[arg(long, env = "SEALER_KEY", hide_env_values = true)]
        key: String,
        /// Sealed blob. Read from stdin when omitted.
        blob: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Telemetry is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e:#}");
            return ExitCode::from(1);
        }
    };

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init_telemetry(&cfg) {
        eprintln!("ERROR: telemetry initialisation failed: {e:#}");
        return ExitCode::from(1);
    }
    let threshold = match cfg.sink_threshold() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("ERROR: configuration invalid: {e:#}");
            return ExitCode::from(1);
        }
    };
    let log = SinkProvider::with_threshold(threshold).logger(&cfg.service_name);

    // -----------------------------------------------------------------------
    // 3. Command
    // -----------------------------------------------------------------------
    let code = match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&log, &e),
    };

    shutdown_off_runtime(telemetry::shutdown_telemetry).await;
    code
}

/// Run `shutdown` on the blocking pool, since the batch exporter flushes
/// synchronously. A panic inside it is logged, not propagated. Returns
/// whether it completed.
async fn shutdown_off_runtime<F>(shutdown: F) -> bool
where
    F: FnOnce() + Send + 'static,
{
    match tokio::task::spawn_blocking(shutdown).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "telemetry shutdown task failed");
            false
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Seal { key, plaintext } => {
            let key = key.as_deref().map(SecretKey::from_base64).transpose()?;
            let plaintext = Zeroizing::new(match plaintext {
                Some(p) => p,
                None => strip_line_ending(read_stdin()?),
            });

            let sealed = sealer::seal(&plaintext, key.as_ref())?;
            info!(generated_key = key.is_none(), "string sealed");

            let mut out = io::stdout().lock();
            serde_json::to_writer(&mut out, &sealed).context("failed to write sealed output")?;
            writeln!(out).context("failed to write sealed output")?;
        }
        Command::Unseal { key, blob } => {
            let blob = match blob {
                Some(b) => b,
                None => read_stdin()?,
            };
            let plaintext = Zeroizing::new(sealer::unseal(&blob, &key)?);
            info!("string unsealed");

            let mut out = io::stdout().lock();
            writeln!(out, "{}", plaintext.as_str()).context("failed to write plaintext")?;
        }
    }
    Ok(())
}

/// Log the failure and print it as JSON on stderr. Unseal failures are
/// reported under one generic code whatever their cause.
fn report(log: &SinkLogger<TracingSink>, err: &anyhow::Error) -> ExitCode {
    let (response, code) = match err.downcast_ref::<SealError>() {
        Some(seal_err) => {
            let response = ErrorResponse::from(seal_err);
            log.log(
                Severity::Warning,
                &format!("command rejected: {}", response.code),
                None,
            );
            (response, seal_err.exit_code())
        }
        None => {
            let source: &(dyn std::error::Error + 'static) = err.as_ref();
            log.log(Severity::Error, "command failed:", Some(source));
            (ErrorResponse::new("internal_error", format!("{err:#}")), 1)
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{}: {}", response.code, response.message),
    }
    ExitCode::from(code)
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

/// Drop a single trailing `\n` or `\r\n`, as left by `echo` or a heredoc.
fn strip_line_ending(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}
