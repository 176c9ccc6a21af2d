//! File-backed `log::Log` implementation (§6, §7, SPEC_FULL §9 ambient stack).
//!
//! Grounded on `original_source/OCLSP.py`'s `log_to_file`/`log_exception`
//! (append-mode, `[HH:MM:SS.mmm]`-prefixed lines, one lock shared by both
//! files) and on the teacher's use of the `log` facade throughout
//! (`log::info!`/`log::warn!`/`log::error!` with `target:` tags) — the
//! teacher itself wires `log` to `env_logger`, but `env_logger` only ever
//! writes one stream and can't split by level into two files the way §6
//! requires, so this is a small custom `Log` backend instead (see
//! DESIGN.md for the substitution rationale).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

use crate::env::Env;

const INFO_LOG_FILE: &str = "oclsp_proxy.log";
const ERROR_LOG_FILE: &str = "oclsp_proxy_error.log";

struct FileLogger {
    info_path: Option<PathBuf>,
    error_path: Option<PathBuf>,
    /// Serializes writes to both files per §5 ("log files are serialized
    /// by a dedicated mutex to keep interleaved writes readable").
    lock: Mutex<()>,
}

impl FileLogger {
    fn write_line(&self, path: &PathBuf, line: &str) {
        let _guard = self.lock.lock().unwrap();
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        let millis = now.as_millis() % 1000;
        let secs = now.as_secs();
        let (h, m, s) = ((secs / 3600) % 24, (secs / 60) % 60, secs % 60);
        let line = format!(
            "[{h:02}:{m:02}:{s:02}.{millis:03}] [{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );

        if let Some(path) = &self.info_path {
            self.write_line(path, &line);
        }
        if record.level() <= log::Level::Warn {
            if let Some(path) = &self.error_path {
                self.write_line(path, &line);
            }
        }
    }

    fn flush(&self) {}
}

/// Installs the file logger if `OCLSP_LOG` is enabled and the data-storage
/// directory is known; otherwise leaves the `log` crate's default no-op
/// logger in place (every `log::info!`/etc. call site stays, costing
/// nothing at runtime). Idempotent-by-construction: `main` calls this
/// exactly once before spawning any pump.
pub fn init(env: &Env) {
    if !env.log_enabled {
        return;
    }
    let Some(dir) = env.data_storage_dir().map(|d| d.join("OCLSP")) else {
        return;
    };

    let logger = FileLogger {
        info_path: Some(dir.join(INFO_LOG_FILE)),
        error_path: Some(dir.join(ERROR_LOG_FILE)),
        lock: Mutex::new(()),
    };

    let max_level = if env.trace_enabled {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };

    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_line_appends_without_truncating() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.log");
        let logger = FileLogger {
            info_path: Some(path.clone()),
            error_path: None,
            lock: Mutex::new(()),
        };
        logger.write_line(&path, "first\n");
        logger.write_line(&path, "second\n");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
