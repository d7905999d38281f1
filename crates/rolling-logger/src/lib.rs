//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to a size-rotated set of log
//! files and keeps the most recent lines in a circular buffer, so the
//! application can show them without touching the disk.
//!
//! `log` records are forwarded to the subscriber, so crates that log through
//! the `log` facade end up in the same files.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 3;
const DEFAULT_BUFFER_LINES: usize = 500;

static RECENT: OnceLock<Arc<Mutex<LineBuffer>>> = OnceLock::new();

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Directory holding the log files
    pub log_dir: PathBuf,
    /// File stem, `<app_name>.log`
    pub app_name: String,
    /// Rotate once the current file would grow past this size
    pub max_bytes: u64,
    /// Number of files kept, including the current one
    pub max_files: usize,
    /// Lines kept in memory for `recent_lines`
    pub buffer_lines: usize,
}

impl LoggerConfig {
    pub fn new(log_dir: PathBuf, app_name: &str) -> Self {
        Self {
            log_dir,
            app_name: app_name.to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

/// Fixed-capacity buffer of the last written lines
#[derive(Debug)]
struct LineBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    partial: String,
}

impl LineBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            partial: String::new(),
        }
    }

    fn push_bytes(&mut self, buf: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            if self.lines.len() == self.capacity {
                self.lines.pop_front();
            }
            self.lines.push_back(line.trim_end().to_string());
        }
    }

    fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

/// Size-rotated log file writer
///
/// `<app>.log` is always the file being written; on rotation it becomes
/// `<app>.1.log`, the previous `.1` becomes `.2`, and the oldest is dropped.
struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
    recent: Arc<Mutex<LineBuffer>>,
}

impl RollingFile {
    fn open(config: &LoggerConfig, recent: Arc<Mutex<LineBuffer>>) -> io::Result<Self> {
        fs::create_dir_all(&config.log_dir)?;
        let path = file_path(&config.log_dir, &config.app_name, 0);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir: config.log_dir.clone(),
            app_name: config.app_name.clone(),
            max_bytes: config.max_bytes,
            max_files: config.max_files.max(1),
            file,
            written,
            recent,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let oldest = file_path(&self.dir, &self.app_name, self.max_files - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.max_files - 1).rev() {
            let from = file_path(&self.dir, &self.app_name, index);
            if from.exists() {
                fs::rename(&from, file_path(&self.dir, &self.app_name, index + 1))?;
            }
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(file_path(&self.dir, &self.app_name, 0))?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;

        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.push_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn file_path(dir: &Path, app_name: &str, index: usize) -> PathBuf {
    if index == 0 {
        dir.join(format!("{}.log", app_name))
    } else {
        dir.join(format!("{}.{}.log", app_name, index))
    }
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initialize the global logger with default rotation settings
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    init_logger_with(LoggerConfig::new(log_dir, app_name))
}

/// Initialize the global logger
///
/// Fails if a global subscriber was already installed.
pub fn init_logger_with(config: LoggerConfig) -> Result<(), String> {
    let recent = RECENT
        .get_or_init(|| Arc::new(Mutex::new(LineBuffer::new(config.buffer_lines))))
        .clone();

    let file = RollingFile::open(&config, recent)
        .map_err(|e| format!("Failed to open log file in {}: {}", config.log_dir.display(), e))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_target(true)
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    tracing::info!(dir = %config.log_dir.display(), "logger initialized");
    Ok(())
}

/// The most recent log lines, oldest first
pub fn recent_lines() -> Vec<String> {
    match RECENT.get() {
        Some(recent) => recent.lock().unwrap_or_else(|e| e.into_inner()).snapshot(),
        None => Vec::new(),
    }
}

fn ensure_initialized() -> Result<(), String> {
    if RECENT.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
    Ok(())
}

pub fn info(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    log::info!(target: "app", "{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    log::warn!(target: "app", "{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    log::error!(target: "app", "{}", msg);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path, max_bytes: u64, max_files: usize) -> LoggerConfig {
        LoggerConfig {
            log_dir: dir.to_path_buf(),
            app_name: "test".to_string(),
            max_bytes,
            max_files,
            buffer_lines: 4,
        }
    }

    #[test]
    fn test_line_buffer_keeps_last_lines() {
        let mut buffer = LineBuffer::new(2);
        buffer.push_bytes(b"one\ntwo\nthr");
        buffer.push_bytes(b"ee\n");

        assert_eq!(buffer.snapshot(), vec!["two".to_string(), "three".to_string()]);
    }

    #[test]
    fn test_line_buffer_zero_capacity() {
        let mut buffer = LineBuffer::new(0);
        buffer.push_bytes(b"ignored\n");
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_rotation_keeps_max_files() {
        let dir = tempfile::tempdir().unwrap();
        let recent = Arc::new(Mutex::new(LineBuffer::new(4)));
        let mut file = RollingFile::open(&test_config(dir.path(), 10, 3), recent.clone()).unwrap();

        for i in 0..5 {
            file.write_all(format!("line {}\n", i).as_bytes()).unwrap();
        }
        file.flush().unwrap();

        assert!(file_path(dir.path(), "test", 0).exists());
        assert!(file_path(dir.path(), "test", 1).exists());
        assert!(file_path(dir.path(), "test", 2).exists());
        assert!(!file_path(dir.path(), "test", 3).exists());

        let current = fs::read_to_string(file_path(dir.path(), "test", 0)).unwrap();
        assert_eq!(current, "line 4\n");
        let previous = fs::read_to_string(file_path(dir.path(), "test", 1)).unwrap();
        assert_eq!(previous, "line 3\n");

        let lines = recent.lock().unwrap().snapshot();
        assert_eq!(lines, vec!["line 1", "line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 1024, 2);
        let recent = Arc::new(Mutex::new(LineBuffer::new(4)));

        {
            let mut file = RollingFile::open(&config, recent.clone()).unwrap();
            file.write_all(b"first\n").unwrap();
        }
        let mut file = RollingFile::open(&config, recent).unwrap();
        file.write_all(b"second\n").unwrap();
        file.flush().unwrap();

        let content = fs::read_to_string(file_path(dir.path(), "test", 0)).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
