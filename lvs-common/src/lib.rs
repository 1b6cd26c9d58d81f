pub mod config;
pub mod logger;

pub use self::logger::{LogLevel, Logger, ParseLevelError, LIVESTATUS_CATEGORY};
