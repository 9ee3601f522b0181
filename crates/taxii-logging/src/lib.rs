// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging initialisation for the TAXII server
//!
//! Output goes to the console unless a log file is requested, either on the
//! command line or through the `logging` section of the server configuration.
//! `RUST_LOG` always takes precedence over the configured level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing::Level;

/// Output format for log messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable plaintext format
    #[default]
    Plaintext,
    /// Structured JSON format, one object per line
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Plaintext => write!(f, "plaintext"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Log level accepted on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliLogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CliLogLevel::Error => "error",
            CliLogLevel::Warn => "warn",
            CliLogLevel::Info => "info",
            CliLogLevel::Debug => "debug",
            CliLogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// Where log output goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogTarget {
    Console,
    File(PathBuf),
}

/// Logging flags shared by the server binary
///
/// Use with `#[command(flatten)]`.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliLoggingArgs {
    #[arg(long, value_enum, help = "Log verbosity level (default: info)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<CliLogLevel>,

    #[arg(long, value_enum, help = "Log output format (default: plaintext)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,

    #[arg(long, help = "Directory for the log file")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    #[arg(long, help = "Log file name; overrides the configured log file")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl CliLoggingArgs {
    /// Decide where to log
    ///
    /// Command line flags win over `configured`, the log file named by the
    /// server configuration. Without either, output goes to the console.
    pub fn target(&self, component: &str, configured: Option<&Path>) -> LogTarget {
        match (&self.log_dir, &self.log_file) {
            (_, Some(file)) if Path::new(file).is_absolute() => LogTarget::File(PathBuf::from(file)),
            (Some(dir), Some(file)) => LogTarget::File(Path::new(dir).join(file)),
            (None, Some(file)) => LogTarget::File(PathBuf::from(file)),
            (Some(dir), None) => {
                LogTarget::File(Path::new(dir).join(format!("{}.log", component)))
            }
            (None, None) => configured
                .map(|path| LogTarget::File(path.to_path_buf()))
                .unwrap_or(LogTarget::Console),
        }
    }

    /// Install the global subscriber for `component`
    pub fn init(&self, component: &str, configured: Option<&Path>) -> anyhow::Result<LogTarget> {
        let level = self.log_level.unwrap_or_default().into();
        let format = self.log_format.unwrap_or_default();
        let target = self.target(component, configured);

        match &target {
            LogTarget::Console => init(component, level, format)?,
            LogTarget::File(path) => init_to_file(component, level, format, path)?,
        }
        Ok(target)
    }
}

/// Initialise console logging
pub fn init(component: &str, default_level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, default_level, format, io::stdout)
}

/// Initialise logging appended to `log_path`, creating parent directories as needed
pub fn init_to_file(
    component: &str,
    default_level: Level,
    format: LogFormat,
    log_path: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;

    init_with_writer(component, default_level, format, log_file)
}

/// Initialise logging with a custom writer
pub fn init_with_writer<W>(
    component: &str,
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(component, default_level)));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).json();
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Filter directives used when `RUST_LOG` is not set
///
/// Crate targets use underscores, so `taxii-server` becomes `taxii_server`.
pub fn default_directives(component: &str, level: Level) -> String {
    format!("{},{}={}", level, component.replace('-', "_"), level)
}

/// Replace a secret with a fixed marker in log fields
pub fn redact(_value: impl fmt::Display) -> &'static str {
    "[REDACTED]"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_converts_to_tracing_level() {
        assert_eq!(Level::from(CliLogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(CliLogLevel::Trace), Level::TRACE);
        assert_eq!(Level::from(CliLogLevel::default()), Level::INFO);
        assert_eq!(CliLogLevel::Warn.to_string(), "warn");
    }

    #[test]
    fn console_without_any_file_setting() {
        let args = CliLoggingArgs::default();
        assert_eq!(args.target("taxii-server", None), LogTarget::Console);
    }

    #[test]
    fn configured_file_is_used_without_flags() {
        let args = CliLoggingArgs::default();
        assert_eq!(
            args.target("taxii-server", Some(Path::new("/opt/taxii/log/taxii.log"))),
            LogTarget::File(PathBuf::from("/opt/taxii/log/taxii.log"))
        );
    }

    #[test]
    fn flags_override_configured_file() {
        let configured = Some(Path::new("/opt/taxii/log/taxii.log"));

        let args = CliLoggingArgs {
            log_dir: Some("/var/log/taxii".into()),
            ..Default::default()
        };
        assert_eq!(
            args.target("taxii-server", configured),
            LogTarget::File(PathBuf::from("/var/log/taxii/taxii-server.log"))
        );

        let args = CliLoggingArgs {
            log_dir: Some("/var/log/taxii".into()),
            log_file: Some("server.log".into()),
            ..Default::default()
        };
        assert_eq!(
            args.target("taxii-server", configured),
            LogTarget::File(PathBuf::from("/var/log/taxii/server.log"))
        );

        let args = CliLoggingArgs {
            log_dir: Some("/var/log/taxii".into()),
            log_file: Some("/tmp/abs.log".into()),
            ..Default::default()
        };
        assert_eq!(
            args.target("taxii-server", configured),
            LogTarget::File(PathBuf::from("/tmp/abs.log"))
        );
    }

    #[test]
    fn default_directives_use_crate_target_names() {
        assert_eq!(
            default_directives("taxii-server", Level::DEBUG),
            "DEBUG,taxii_server=DEBUG"
        );
    }

    #[test]
    fn redact_hides_value() {
        assert_eq!(redact("api-key-123"), "[REDACTED]");
    }
}
