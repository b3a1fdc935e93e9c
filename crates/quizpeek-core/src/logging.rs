use crate::config::LoggingConfig;
use crate::errors::CoreError;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Roll the log file once it grows past this size.
pub const MAX_LOG_BYTES: u64 = 1024 * 1024;
/// Rolled copies kept: `quizpeek.log.1` (newest) through `quizpeek.log.5`.
pub const LOG_BACKUPS: usize = 5;

/// Pick the filter: `--verbose` forces debug, then `RUST_LOG`, then the
/// configured level.
pub fn env_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// Shift `path` to `path.1`, `path.1` to `path.2`, ... when `path` is larger
/// than `max_bytes`. The oldest backup beyond `backups` is deleted.
/// Returns whether a roll happened.
pub fn rotate_if_needed(path: &Path, max_bytes: u64, backups: usize) -> Result<bool, CoreError> {
    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return Ok(false),
    };
    if size <= max_bytes || backups == 0 {
        return Ok(false);
    }

    let oldest = backup_path(path, backups);
    if oldest.exists() {
        std::fs::remove_file(&oldest)
            .map_err(|e| CoreError::Io(format!("removing old log {}: {e}", oldest.display())))?;
    }
    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            std::fs::rename(&from, backup_path(path, n + 1))
                .map_err(|e| CoreError::Io(format!("rolling log {}: {e}", from.display())))?;
        }
    }
    std::fs::rename(path, backup_path(path, 1))
        .map_err(|e| CoreError::Io(format!("rolling log {}: {e}", path.display())))?;
    Ok(true)
}

/// Install the process-wide subscriber. Call once at startup; later calls
/// leave the first subscriber in place. Nothing needs tearing down.
///
/// With `log_file` set, events are appended to that file without colour,
/// after rolling it if it has outgrown `MAX_LOG_BYTES`.
pub fn init(config: &LoggingConfig, verbose: bool, log_file: Option<&Path>) -> Result<(), CoreError> {
    let filter = env_filter(config, verbose);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::Io(format!("creating log dir: {e}")))?;
            }
            rotate_if_needed(path, MAX_LOG_BYTES, LOG_BACKUPS)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CoreError::Io(format!("opening log file: {e}")))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("quizpeek.log");
        let config = LoggingConfig::default();
        init(&config, false, Some(&path)).unwrap();
        init(&config, true, None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_bad_level_falls_back() {
        let config = LoggingConfig {
            level: "not a level[".to_string(),
            file: false,
        };
        // Only checks that an unparseable level doesn't panic.
        let _ = env_filter(&config, false);
    }

    #[test]
    fn test_verbose_forces_debug() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            file: false,
        };
        assert_eq!(env_filter(&config, true).to_string(), "debug");
    }

    #[test]
    fn test_small_log_not_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizpeek.log");
        std::fs::write(&path, "short").unwrap();
        assert!(!rotate_if_needed(&path, 1024, 5).unwrap());
        assert!(!rotate_if_needed(&dir.path().join("missing.log"), 1024, 5).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_rotation_shifts_and_caps_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizpeek.log");
        for n in 1..=3 {
            std::fs::write(backup_path(&path, n), format!("backup {n}")).unwrap();
        }

        std::fs::write(&path, "x".repeat(20)).unwrap();
        assert!(rotate_if_needed(&path, 10, 3).unwrap());

        assert!(!path.exists());
        assert_eq!(std::fs::read_to_string(backup_path(&path, 1)).unwrap(), "x".repeat(20));
        assert_eq!(std::fs::read_to_string(backup_path(&path, 2)).unwrap(), "backup 1");
        assert_eq!(std::fs::read_to_string(backup_path(&path, 3)).unwrap(), "backup 2");
        assert!(!backup_path(&path, 4).exists());
    }

    #[test]
    fn test_init_rolls_oversized_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizpeek.log");
        std::fs::write(&path, vec![b'a'; MAX_LOG_BYTES as usize + 1]).unwrap();

        init(&LoggingConfig::default(), false, Some(&path)).unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() < MAX_LOG_BYTES);
        assert_eq!(
            std::fs::metadata(backup_path(&path, 1)).unwrap().len(),
            MAX_LOG_BYTES + 1
        );
    }
}
