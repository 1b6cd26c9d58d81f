use std::sync::OnceLock;

use crate::logger::LogLevel;

const DEFAULT_MAX_ENTRIES: usize = 400;
const DEFAULT_MAX_ENTRIES_LIMIT: usize = 10_000;

/// Returns the default maximum number of entries an RRD column emits
/// when the query does not provide one.
///
/// Can be overridden with `LVS_RRD_MAX_ENTRIES`, invalid or zero values
/// and values above [get_max_entries_limit] fall back to the default of `400`.
pub fn get_default_max_entries() -> usize {
    static VALUE: OnceLock<usize> = OnceLock::new();
    *VALUE.get_or_init(|| {
        std::env::var("LVS_RRD_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0 && *v <= get_max_entries_limit())
            .unwrap_or_else(|| DEFAULT_MAX_ENTRIES.min(get_max_entries_limit()))
    })
}

/// Returns the largest number of entries a query may request from an RRD column.
///
/// Can be overridden with `LVS_RRD_MAX_ENTRIES_LIMIT`, defaults to `10000`.
pub fn get_max_entries_limit() -> usize {
    static VALUE: OnceLock<usize> = OnceLock::new();
    *VALUE.get_or_init(|| {
        std::env::var("LVS_RRD_MAX_ENTRIES_LIMIT")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_ENTRIES_LIMIT)
    })
}

/// Returns the level the root logger starts with.
///
/// Set with `LVS_LOG_CATEGORY_LEVEL` using the syslog names, e.g. `debug`
/// or `warning`. Defaults to `notice`.
pub fn get_root_log_level() -> LogLevel {
    static VALUE: OnceLock<LogLevel> = OnceLock::new();
    *VALUE.get_or_init(|| {
        std::env::var("LVS_LOG_CATEGORY_LEVEL")
            .ok()
            .and_then(|v| v.parse::<LogLevel>().ok())
            .unwrap_or(LogLevel::Notice)
    })
}
