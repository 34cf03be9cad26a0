use log::{Level, LevelFilter, Log, Metadata, Record};

/// Verbosity scale accepted on the command line and in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Nothing = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
    All = 5,
}

impl LogLevel {
    /// Create a LogLevel from an integer; out of range values clamp
    pub fn from_i32(level: i32) -> Self {
        match level {
            i32::MIN..=0 => LogLevel::Nothing,
            1 => LogLevel::Error,
            2 => LogLevel::Warning,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::All,
        }
    }

    /// Parse a level name or number (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i32>() {
            return Some(Self::from_i32(n));
        }
        match s.to_lowercase().as_str() {
            "nothing" | "off" | "none" => Some(LogLevel::Nothing),
            "error" => Some(LogLevel::Error),
            "warning" | "warn" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "all" | "trace" => Some(LogLevel::All),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }

    fn label(level: Level) -> &'static str {
        match level {
            Level::Error => "Error",
            Level::Warn => "Warning",
            Level::Info => "Info",
            Level::Debug => "Debug",
            Level::Trace => "Trace",
        }
    }
}

/// `log` backend printing `[Level] message` lines to stderr
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    pub fn new(level: LogLevel) -> Self {
        StderrLogger {
            level: level.to_filter(),
        }
    }

    pub fn format(record: &Record) -> String {
        format!("[{}] {}", LogLevel::label(record.level()), record.args())
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", Self::format(record));
        }
    }

    fn flush(&self) {}
}

/// Install the stderr logger as the global `log` backend.
///
/// Only the first call takes effect.
pub fn init(level: LogLevel) {
    let logger = Box::new(StderrLogger::new(level));
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level.to_filter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_i32() {
        assert_eq!(LogLevel::from_i32(-3), LogLevel::Nothing);
        assert_eq!(LogLevel::from_i32(0), LogLevel::Nothing);
        assert_eq!(LogLevel::from_i32(2), LogLevel::Warning);
        assert_eq!(LogLevel::from_i32(5), LogLevel::All);
        assert_eq!(LogLevel::from_i32(99), LogLevel::All);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("3"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn test_filter_mapping() {
        assert_eq!(LogLevel::Nothing.to_filter(), LevelFilter::Off);
        assert_eq!(LogLevel::All.to_filter(), LevelFilter::Trace);
        assert!(LogLevel::Debug > LogLevel::Info);
    }

    #[test]
    fn test_logger_respects_level() {
        let logger = StderrLogger::new(LogLevel::Warning);
        let warn = Metadata::builder().level(Level::Warn).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn test_format() {
        let line = StderrLogger::format(
            &Record::builder()
                .args(format_args!("Duplicate registration for '{}'", "ui/door01"))
                .level(Level::Warn)
                .build(),
        );
        assert_eq!(line, "[Warning] Duplicate registration for 'ui/door01'");
    }
}
