use chrono::{DateTime, Utc};
use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
};
use tracing_subscriber::fmt::MakeWriter;

const MAX_ENTRIES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Bounded in-memory activity log shared between the app and the tracing
/// subscriber
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl ActivityLog {
    pub fn push(&self, level: LogLevel, message: impl Into<String>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.push_back(LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        });
        while entries.len() > MAX_ENTRIES {
            entries.pop_front();
        }
    }

    /// Oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// One line of `fmt` output without time or target, e.g. ` WARN message`
    fn push_formatted(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let (level, message) = match line.split_once(' ') {
            Some(("ERROR", rest)) => (LogLevel::Error, rest),
            Some(("WARN", rest)) => (LogLevel::Warning, rest),
            Some(("INFO" | "DEBUG" | "TRACE", rest)) => (LogLevel::Info, rest),
            _ => (LogLevel::Info, line),
        };
        self.push(level, message.trim());
    }
}

/// Buffers one event and hands it to the log when dropped
pub struct ActivityWriter {
    log: ActivityLog,
    buffer: Vec<u8>,
}

impl io::Write for ActivityWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ActivityWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buffer);
        for line in text.lines() {
            self.log.push_formatted(line);
        }
    }
}

impl<'a> MakeWriter<'a> for ActivityLog {
    type Writer = ActivityWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ActivityWriter {
            log: self.clone(),
            buffer: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_formatted_lines_keep_level() {
        let log = ActivityLog::default();
        {
            let mut writer = log.make_writer();
            writer.write_all(b" WARN Refresh after batch failed\n").unwrap();
        }
        {
            let mut writer = log.make_writer();
            writer.write_all(b"ERROR boom\n").unwrap();
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Warning);
        assert_eq!(entries[0].message, "Refresh after batch failed");
        assert_eq!(entries[1].level, LogLevel::Error);
    }

    #[test]
    fn test_log_is_bounded() {
        let log = ActivityLog::default();
        for i in 0..(MAX_ENTRIES + 5) {
            log.push(LogLevel::Info, format!("entry {}", i));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(entries[0].message, "entry 5");
    }
}
