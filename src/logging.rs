//! File-backed `log` sink.
//!
//! Output goes to a file so log lines never break the terminal UI. When the
//! file cannot be opened logging is silently disabled.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

struct FileLogger {
    level: LevelFilter,
    file: Mutex<File>,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Parse a level name, falling back to `info`
pub fn parse_level(name: Option<&str>) -> LevelFilter {
    name.and_then(|name| LevelFilter::from_str(name.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the file logger. Returns whether logging is active.
pub fn init(path: &Path, level: LevelFilter) -> bool {
    if level == LevelFilter::Off {
        return false;
    }
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) else {
        return false;
    };
    let _ = writeln!(
        file,
        "{}\nrightmenu session started at {} (level={level})",
        "=".repeat(60),
        chrono::Local::now().to_rfc3339()
    );

    let logger = FileLogger {
        level,
        file: Mutex::new(file),
    };
    if log::set_boxed_logger(Box::new(logger)).is_err() {
        return false;
    }
    log::set_max_level(level);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(parse_level(Some(" WARN ")), LevelFilter::Warn);
        assert_eq!(parse_level(Some("chatty")), LevelFilter::Info);
        assert_eq!(parse_level(None), LevelFilter::Info);
    }

    #[test]
    fn test_off_level_installs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("off.log");
        assert!(!init(&path, LevelFilter::Off));
        assert!(!path.exists());
    }
}
