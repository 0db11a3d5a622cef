//! Logging setup: stderr output filtered by `RUST_LOG`, plus a per-run debug
//! log file under `logs/`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Directory the per-run log files are written to.
pub const LOG_DIR: &str = "logs";

/// Build the log file path for a run started at `now`.
pub fn log_file_path(dir: &Path, now: chrono::DateTime<chrono::Local>) -> PathBuf {
    dir.join(now.format("llmanonymizer_%H_%M_%d_%m_%Y.log").to_string())
}

/// Initialize the global subscriber. Returns the path of the log file.
pub fn init(debug: bool) -> anyhow::Result<PathBuf> {
    let dir = Path::new(LOG_DIR);
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let path = log_file_path(dir, chrono::Local::now());
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;

    let default_filter = if debug {
        "llm_anonymizer=debug,tower_http=debug"
    } else {
        "llm_anonymizer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| default_filter.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG),
        )
        .init();

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name_format() {
        let at = chrono::Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        let path = log_file_path(Path::new("logs"), at);
        assert_eq!(path, Path::new("logs").join("llmanonymizer_09_05_07_03_2024.log"));
    }
}
