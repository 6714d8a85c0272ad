//! Tracing subscriber setup
//!
//! Events go to the console and, when a log directory is configured, to a
//! daily rolling file (`{directory}/{file_prefix}.YYYY-MM-DD.txt`). `RUST_LOG`
//! takes precedence over the configured filter.

use crate::config::LoggingSettings;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Extension of the rolling log files
pub const LOG_FILE_SUFFIX: &str = "txt";

/// Filter from `RUST_LOG`, falling back to `default_directive`
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Daily rolling appender writing `{prefix}.YYYY-MM-DD.txt` files under `directory`
pub fn file_appender(directory: &str, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(directory)
        .with_context(|| format!("failed to open log directory {directory}"))
}

/// Install the global subscriber
///
/// The returned guard flushes the file sink when dropped; keep it alive for
/// the lifetime of the process.
pub fn init(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let console = tracing_subscriber::fmt::layer().with_target(true);

    let (file, guard) = match &settings.directory {
        Some(directory) => {
            let appender = file_appender(directory, &settings.file_prefix)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(&settings.filter))
        .with(console)
        .with(file)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_files_carry_txt_extension() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let directory = dir.path().to_str().unwrap();
        let mut appender = file_appender(directory, "log-").unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("log-"));
        assert!(names[0].ends_with(".txt"), "unexpected file name {}", names[0]);
    }

    #[test]
    fn test_env_filter_accepts_configured_directive() {
        let filter = env_filter("articles=debug,info");
        assert!(!filter.to_string().is_empty());
    }
}
