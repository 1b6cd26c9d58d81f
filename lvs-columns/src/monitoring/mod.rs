//! The monitoring core contract consumed by columns.
//!
//! The core owns the monitoring objects and their performance data, columns
//! only ever borrow it through a shared [Core] handle injected by the engine.

mod memory;

use std::fmt::{Display, Formatter};
use std::io;

pub use self::memory::{MemoryCore, SERVICE_HOST_OFFSET};
use crate::offsets::Address;

#[derive(Debug, thiserror::Error)]
/// An error raised by the core while serving column data.
pub enum CoreError {
    #[error("unknown monitoring object at {0}")]
    UnknownObject(Address),
    #[error("metric store unavailable: {0}")]
    Unavailable(String),
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// Identifies the object a set of metrics is recorded for.
pub struct MetricLocation {
    host_name: String,
    service_description: Option<String>,
}

impl MetricLocation {
    pub fn host(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            service_description: None,
        }
    }

    pub fn service(host_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            service_description: Some(description.into()),
        }
    }

    #[inline]
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    #[inline]
    pub fn service_description(&self) -> Option<&str> {
        self.service_description.as_deref()
    }
}

impl Display for MetricLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.service_description {
            Some(service) => write!(f, "{};{}", self.host_name, service),
            None => f.write_str(&self.host_name),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
/// How primary data points are merged into a coarser step.
pub enum ConsolidationFunction {
    #[default]
    Average,
    Min,
    Max,
    Last,
}

impl ConsolidationFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "AVERAGE",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Last => "LAST",
        }
    }

    /// Merges the known values, returning `None` if there are none.
    pub fn consolidate(&self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let mut count = 0usize;
        let mut acc = 0.0;
        for value in values {
            acc = match (self, count) {
                (_, 0) => value,
                (Self::Average, _) => acc + value,
                (Self::Min, _) => acc.min(value),
                (Self::Max, _) => acc.max(value),
                (Self::Last, _) => value,
            };
            count += 1;
        }

        match (self, count) {
            (_, 0) => None,
            (Self::Average, n) => Some(acc / n as f64),
            _ => Some(acc),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
/// The time range and step requested from the core, timestamps are UNIX seconds.
pub struct FetchWindow {
    pub start: i64,
    pub end: i64,
    pub resolution: i64,
}

#[derive(Debug, Default, Clone, PartialEq)]
/// A series of consolidated values covering `start..end` in `step` increments.
pub struct TimeSeries {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub values: Vec<Option<f64>>,
}

/// The monitoring core as seen by columns.
pub trait Core: Send + Sync {
    /// Returns the name of the host object at the given address.
    fn host_name(&self, object: Address) -> Option<String>;

    /// Returns the host name and description of the service object at the given address.
    fn service_identity(&self, object: Address) -> Option<(String, String)>;

    /// Fetches the consolidated series of `metric` recorded for `location`.
    ///
    /// Returns `Ok(None)` if no such metric is recorded.
    fn fetch_series(
        &self,
        location: &MetricLocation,
        metric: &str,
        consolidation: ConsolidationFunction,
        window: &FetchWindow,
    ) -> Result<Option<TimeSeries>, CoreError>;
}

/// The kind of monitoring object a table row refers to.
pub trait RowKind: Send + Sync + 'static {
    /// A short name used in diagnostics.
    const NAME: &'static str;

    /// Identifies the object at `object` for metric and file lookups.
    fn locate(core: &dyn Core, object: Address) -> Option<MetricLocation>;
}

#[derive(Debug, Copy, Clone)]
/// Rows that are host objects.
pub struct HostRow;

impl RowKind for HostRow {
    const NAME: &'static str = "host";

    fn locate(core: &dyn Core, object: Address) -> Option<MetricLocation> {
        core.host_name(object).map(MetricLocation::host)
    }
}

#[derive(Debug, Copy, Clone)]
/// Rows that are service objects.
pub struct ServiceRow;

impl RowKind for ServiceRow {
    const NAME: &'static str = "service";

    fn locate(core: &dyn Core, object: Address) -> Option<MetricLocation> {
        core.service_identity(object)
            .map(|(host, service)| MetricLocation::service(host, service))
    }
}
