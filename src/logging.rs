//! Process-wide log setup for the binaries.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{Level, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs a subscriber that writes to stderr and appends plain text to
/// `log_dir/log_file`. `RUST_LOG` overrides `default_level`.
///
/// Returns the path of the log file. Fails if a global subscriber is already
/// installed.
pub fn setup_logging(
    log_dir: impl AsRef<Path>,
    log_file: &str,
    default_level: Level,
) -> io::Result<PathBuf> {
    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(io::Error::other)?;

    info!("Logging to {}", path.display());
    Ok(path)
}

/// `log_dir/<experiment>_<unix seconds>`, the per-run metrics directory.
pub fn experiment_dir(log_dir: impl AsRef<Path>, experiment: &str) -> PathBuf {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    log_dir.as_ref().join(format!("{experiment}_{seconds}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_dir_is_timestamped() {
        let dir = experiment_dir("logs", "policy_iter");
        assert_eq!(dir.parent(), Some(Path::new("logs")));
        let name = dir
            .file_name()
            .and_then(|name| name.to_str())
            .expect("utf-8 name");
        let seconds = name.strip_prefix("policy_iter_").expect("experiment prefix");
        assert!(seconds.parse::<u64>().expect("numeric suffix") > 0);
    }
}
