//! Process wide diagnostic loggers.
//!
//! Loggers are identified by a dotted category name, e.g. `cmk.livestatus`,
//! and form a tree where `cmk` is the parent of `cmk.livestatus` and the
//! unnamed root logger is the parent of `cmk`. A logger without an explicit
//! level inherits the level of its closest ancestor which has one.
//!
//! Looking up the same category twice always returns the same shared handle,
//! loggers are never removed once created.

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::config;

/// The category used by all status table columns.
pub const LIVESTATUS_CATEGORY: &str = "cmk.livestatus";

const INHERIT: u8 = u8::MAX;

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// Syslog style severity, lower values are more severe.
pub enum LogLevel {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Informational = 6,
    Debug = 7,
}

impl LogLevel {
    fn from_repr(value: u8) -> Option<Self> {
        let level = match value {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Informational,
            7 => Self::Debug,
            _ => return None,
        };
        Some(level)
    }

    /// The lowercase syslog name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Informational => "informational",
            Self::Debug => "debug",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unknown log level '{0}'")]
/// The given string is not a known log level.
pub struct ParseLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "emergency" => Self::Emergency,
            "alert" => Self::Alert,
            "critical" => Self::Critical,
            "error" => Self::Error,
            "warning" | "warn" => Self::Warning,
            "notice" => Self::Notice,
            "informational" | "info" => Self::Informational,
            "debug" => Self::Debug,
            _ => return Err(ParseLevelError(s.to_string())),
        };
        Ok(level)
    }
}

/// A named diagnostic handle.
///
/// Messages are forwarded to [tracing] with the logger category attached as
/// the `category` field, after being checked against the effective level.
pub struct Logger {
    name: Box<str>,
    parent: Option<Arc<Logger>>,
    level: AtomicU8,
}

impl Debug for Logger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Logger(category={:?}, level={})", self.name, self.level())
    }
}

impl Logger {
    /// Returns the shared logger for the given category, creating it and
    /// any missing ancestors on first use.
    pub fn get(category: &str) -> Arc<Logger> {
        if let Some(logger) = registry().read().get(category) {
            return logger.clone();
        }

        let parent = match category.rfind('.') {
            Some(pos) => Some(Self::get(&category[..pos])),
            None if category.is_empty() => None,
            None => Some(Self::get("")),
        };

        let level = if parent.is_none() {
            config::get_root_log_level() as u8
        } else {
            INHERIT
        };

        let mut lock = registry().write();
        lock.entry(Box::from(category))
            .or_insert_with(|| {
                Arc::new(Logger {
                    name: Box::from(category),
                    parent,
                    level: AtomicU8::new(level),
                })
            })
            .clone()
    }

    /// Returns the unnamed root logger.
    pub fn root() -> Arc<Logger> {
        Self::get("")
    }

    #[inline]
    /// The category of the logger.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    #[inline]
    pub fn parent(&self) -> Option<&Arc<Logger>> {
        self.parent.as_ref()
    }

    /// Returns the effective level of the logger.
    pub fn level(&self) -> LogLevel {
        let mut current = self;
        loop {
            if let Some(level) = LogLevel::from_repr(current.level.load(Ordering::Relaxed)) {
                return level;
            }
            match current.parent.as_deref() {
                Some(parent) => current = parent,
                None => return LogLevel::Notice,
            }
        }
    }

    /// Sets the level of this logger, `None` makes it inherit from its parent again.
    ///
    /// The root logger cannot inherit, passing `None` resets it to the configured level.
    pub fn set_level(&self, level: Option<LogLevel>) {
        let value = match (level, &self.parent) {
            (Some(level), _) => level as u8,
            (None, Some(_)) => INHERIT,
            (None, None) => config::get_root_log_level() as u8,
        };
        self.level.store(value, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_loggable(&self, level: LogLevel) -> bool {
        level <= self.level()
    }

    /// Emits the message if the level passes the effective level of the logger.
    pub fn log(&self, level: LogLevel, message: impl Display) {
        if !self.is_loggable(level) {
            return;
        }

        let category = self.name();
        match level {
            LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical | LogLevel::Error => {
                error!(category, severity = %level, "{message}")
            },
            LogLevel::Warning => warn!(category, severity = %level, "{message}"),
            LogLevel::Notice | LogLevel::Informational => {
                info!(category, severity = %level, "{message}")
            },
            LogLevel::Debug => debug!(category, severity = %level, "{message}"),
        }
    }

    pub fn error(&self, message: impl Display) {
        self.log(LogLevel::Error, message)
    }

    pub fn warning(&self, message: impl Display) {
        self.log(LogLevel::Warning, message)
    }

    pub fn notice(&self, message: impl Display) {
        self.log(LogLevel::Notice, message)
    }

    pub fn informational(&self, message: impl Display) {
        self.log(LogLevel::Informational, message)
    }

    pub fn debug(&self, message: impl Display) {
        self.log(LogLevel::Debug, message)
    }
}

fn registry() -> &'static RwLock<ahash::HashMap<Box<str>, Arc<Logger>>> {
    static LOGGERS: OnceLock<RwLock<ahash::HashMap<Box<str>, Arc<Logger>>>> = OnceLock::new();
    LOGGERS.get_or_init(|| RwLock::new(ahash::HashMap::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_category_is_shared() {
        let first = Logger::get(LIVESTATUS_CATEGORY);
        let second = Logger::get(LIVESTATUS_CATEGORY);
        assert!(Arc::ptr_eq(&first, &second), "Loggers should be the same handle");
        assert_eq!(first.name(), "cmk.livestatus");
    }

    #[test]
    fn test_parents_follow_dotted_path() {
        let logger = Logger::get("lvs.tests.parents.leaf");
        let parent = logger.parent().expect("Logger should have a parent");
        assert_eq!(parent.name(), "lvs.tests.parents");

        let mut current = logger.clone();
        while let Some(parent) = current.parent().cloned() {
            current = parent;
        }
        assert!(Arc::ptr_eq(&current, &Logger::root()), "Chain should end at the root");
    }

    #[test]
    fn test_level_inheritance() {
        let parent = Logger::get("lvs.tests.inherit");
        let child = Logger::get("lvs.tests.inherit.child");

        parent.set_level(Some(LogLevel::Debug));
        assert_eq!(child.level(), LogLevel::Debug);
        assert!(child.is_loggable(LogLevel::Debug));

        child.set_level(Some(LogLevel::Error));
        assert_eq!(child.level(), LogLevel::Error);
        assert!(!child.is_loggable(LogLevel::Warning));
        assert!(child.is_loggable(LogLevel::Critical));

        child.set_level(None);
        assert_eq!(child.level(), LogLevel::Debug);
    }

    #[rstest::rstest]
    #[case("debug", Ok(LogLevel::Debug))]
    #[case("INFO", Ok(LogLevel::Informational))]
    #[case(" warning ", Ok(LogLevel::Warning))]
    #[case("emergency", Ok(LogLevel::Emergency))]
    #[case("loud", Err(ParseLevelError("loud".to_string())))]
    fn test_parse_level(#[case] input: &str, #[case] expected: Result<LogLevel, ParseLevelError>) {
        assert_eq!(input.parse::<LogLevel>(), expected);
    }
}
