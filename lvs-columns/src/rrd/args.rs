use std::str::FromStr;

use crate::error::ConstructionError;
use crate::monitoring::FetchWindow;
use crate::rrd::rpn::RpnExpression;

#[derive(Debug, Clone, PartialEq)]
/// The parsed argument string of an RRD column reference.
///
/// The expected format is `RPN:START_TIME:END_TIME:RESOLUTION[:MAX_ENTRIES]`,
/// for example `fs_used,1024,/:1426411073:1426416473:5`.
pub struct RrdColumnArgs {
    pub rpn: RpnExpression,
    pub start_time: i64,
    pub end_time: i64,
    pub resolution: i64,
    pub max_entries: usize,
}

impl RrdColumnArgs {
    /// Parses the arguments given for a column created from the dynamic
    /// column `column_name`, which is used to report malformed arguments.
    pub fn parse(arguments: &str, column_name: &str) -> Result<Self, ConstructionError> {
        let invalid = |reason: String| ConstructionError::invalid_arguments(column_name, reason);

        let mut parts = arguments.split(':');

        let rpn = match parts.next().map(str::trim) {
            Some(rpn) if !rpn.is_empty() => rpn,
            _ => return Err(invalid("missing RPN expression for RRD".to_string())),
        };
        let rpn = RpnExpression::parse(rpn)
            .map_err(|e| invalid(format!("invalid RPN expression '{rpn}': {e}")))?;

        let start_time: i64 = required(parts.next(), "start time").map_err(invalid)?;
        let end_time: i64 = required(parts.next(), "end time").map_err(invalid)?;
        let resolution: i64 = required(parts.next(), "resolution").map_err(invalid)?;
        let max_entries: usize = match parts.next() {
            None => lvs_common::config::get_default_max_entries(),
            some => required(some, "max entries").map_err(invalid)?,
        };

        if parts.next().is_some() {
            return Err(invalid("too many arguments".to_string()));
        }
        if end_time < start_time {
            return Err(invalid("end time before start time".to_string()));
        }
        if end_time.checked_sub(start_time).is_none() {
            return Err(invalid("time range too large".to_string()));
        }
        if resolution <= 0 {
            return Err(invalid("resolution must be positive".to_string()));
        }
        if max_entries == 0 {
            return Err(invalid("max entries must be positive".to_string()));
        }
        let limit = lvs_common::config::get_max_entries_limit();
        if max_entries > limit {
            return Err(invalid(format!("max entries must not exceed {limit}")));
        }

        Ok(Self {
            rpn,
            start_time,
            end_time,
            resolution,
            max_entries,
        })
    }

    /// Returns the window to fetch, with the resolution coarsened so the
    /// series holds at most `max_entries` values.
    pub fn fetch_window(&self) -> FetchWindow {
        let span = self.end_time.saturating_sub(self.start_time).max(0);
        let entries = i64::try_from(self.max_entries).unwrap_or(i64::MAX).max(1);
        let min_resolution = span / entries + i64::from(span % entries != 0);

        FetchWindow {
            start: self.start_time,
            end: self.end_time,
            resolution: self.resolution.max(min_resolution),
        }
    }
}

fn required<T: FromStr>(raw: Option<&str>, field: &str) -> Result<T, String> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(format!("missing {field}")),
    };
    raw.parse().map_err(|_| format!("invalid {field} '{raw}'"))
}
