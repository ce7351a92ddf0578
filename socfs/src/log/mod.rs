//! 日志输出
//!
//! 各库 crate 只依赖 `log` 门面，这里提供进程唯一的 [`log::Log`] 实现，
//! 把记录格式化后写到 stderr。
//!
//! 输出格式：
//!
//! ```text
//! <color_code>[LEVEL] [timestamp] [target] message<reset>
//! ```
//!
//! 只有 stderr 是终端时才输出颜色控制码。

use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// 日志级别标签
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "[ERR]",
        Level::Warn => "[WARN]",
        Level::Info => "[INFO]",
        Level::Debug => "[DEBUG]",
        Level::Trace => "[TRACE]",
    }
}

/// ANSI 颜色控制码
fn color_code(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m",
        Level::Warn => "\x1b[93m",
        Level::Info => "\x1b[37m",
        Level::Debug => "\x1b[32m",
        Level::Trace => "\x1b[90m",
    }
}

const RESET_COLOR: &str = "\x1b[0m";

/// 格式化一条日志记录（不含换行）
pub fn format_record(record: &Record<'_>, time: DateTime<Local>, color: bool) -> String {
    let (start, end) = if color {
        (color_code(record.level()), RESET_COLOR)
    } else {
        ("", "")
    };
    format!(
        "{start}{} [{}] [{}] {}{end}",
        level_tag(record.level()),
        time.format("%Y-%m-%d %H:%M:%S%.3f"),
        record.target(),
        record.args(),
    )
}

/// stderr 日志器
struct StderrLogger {
    level: LevelFilter,
    color: bool,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record, Local::now(), self.color);
        // stderr 写失败时无处可报
        let _ = writeln!(io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// 初始化日志系统
///
/// 必须在第一条日志之前调用，且只能调用一次。
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let color = io::stderr().is_terminal();
    log::set_boxed_logger(Box::new(StderrLogger { level, color }))?;
    log::set_max_level(level);
    Ok(())
}
