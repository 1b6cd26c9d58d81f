use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use lvs_columns::monitoring::{
    HostRow,
    MemoryCore,
    MetricLocation,
    RowKind,
    ServiceRow,
    SERVICE_HOST_OFFSET,
};
use lvs_columns::rrd::{ArchiveOptions, HostRrdColumn, ServiceRrdColumn};
use lvs_columns::{Address, ColumnOffsets, DynamicColumns, DynamicFileColumn, DynamicRrdColumn};
use serde_derive::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
/// The monitoring objects and metric history served by the tables.
pub struct Fixture {
    #[serde(default)]
    archive: ArchiveConfig,
    #[serde(default)]
    /// The directory holding one sub directory of files per host.
    ///
    /// Relative paths are resolved against the directory of the fixture.
    files_path: Option<PathBuf>,
    #[serde(default)]
    hosts: Vec<HostFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArchiveConfig {
    #[serde(default = "default_step")]
    step: i64,
    #[serde(default = "default_rows")]
    rows: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            step: default_step(),
            rows: default_rows(),
        }
    }
}

fn default_step() -> i64 {
    60
}

fn default_rows() -> usize {
    1440
}

/// Metric samples as `[timestamp, value]` pairs keyed by metric name.
type Metrics = BTreeMap<String, Vec<(i64, f64)>>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HostFixture {
    name: String,
    #[serde(default)]
    metrics: Metrics,
    #[serde(default)]
    services: Vec<ServiceFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceFixture {
    description: String,
    #[serde(default)]
    metrics: Metrics,
}

impl Fixture {
    /// Reads a JSON fixture from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)
            .with_context(|| format!("Read fixture {}", path.display()))?;
        let mut fixture: Self = serde_json::from_slice(&content)
            .with_context(|| format!("Parse fixture {}", path.display()))?;

        if let Some(files_path) = fixture.files_path.as_mut() {
            if files_path.is_relative() {
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                *files_path = base.join(&*files_path);
            }
        }

        Ok(fixture)
    }

    /// Creates the core holding the fixture's objects and the tables exposing them.
    pub fn build(self) -> Result<Tables> {
        let options = ArchiveOptions::builder()
            .step(self.archive.step)
            .rows(self.archive.rows)
            .build();
        let mut core = MemoryCore::new(options);

        let mut samples = 0usize;
        for host in &self.hosts {
            let address = core.add_host(host.name.as_str());
            samples += record(&core, &MetricLocation::host(host.name.as_str()), &host.metrics);

            for service in &host.services {
                core.add_service(address, service.description.as_str())
                    .with_context(|| format!("Add service {};{}", host.name, service.description))?;
                let location = MetricLocation::service(host.name.as_str(), service.description.as_str());
                samples += record(&core, &location, &service.metrics);
            }
        }

        info!(
            hosts = core.hosts().len(),
            services = core.services().len(),
            samples,
            "Loaded fixture",
        );

        let core = Arc::new(core);
        let host_pointer = ColumnOffsets::hops(SERVICE_HOST_OFFSET, 0, 0);

        let mut hosts = DynamicColumns::new();
        hosts.register(Arc::new(DynamicRrdColumn::<HostRrdColumn>::new(
            "rrddata",
            "RRD metrics data of this object",
            core.clone(),
            ColumnOffsets::default(),
        )))?;

        let mut services = DynamicColumns::new();
        services.register(Arc::new(DynamicRrdColumn::<ServiceRrdColumn>::new(
            "rrddata",
            "RRD metrics data of this object",
            core.clone(),
            ColumnOffsets::default(),
        )))?;
        services.register(Arc::new(DynamicRrdColumn::<HostRrdColumn>::new(
            "host_rrddata",
            "RRD metrics data of the host of this service",
            core.clone(),
            host_pointer,
        )))?;

        if let Some(files_path) = self.files_path {
            hosts.register(Arc::new(DynamicFileColumn::<HostRow>::new(
                "files",
                "Files stored for this host",
                core.clone(),
                files_path.clone(),
                ColumnOffsets::default(),
            )))?;
            services.register(Arc::new(DynamicFileColumn::<HostRow>::new(
                "host_files",
                "Files stored for the host of this service",
                core.clone(),
                files_path,
                host_pointer,
            )))?;
        }

        Ok(Tables {
            core,
            hosts,
            services,
        })
    }
}

fn record(core: &MemoryCore, location: &MetricLocation, metrics: &Metrics) -> usize {
    let mut count = 0;
    for (metric, points) in metrics {
        for &(timestamp, value) in points {
            core.record(location, metric, timestamp, value);
            count += 1;
        }
    }
    count
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum Table {
    Hosts,
    Services,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hosts => "hosts",
            Self::Services => "services",
        }
    }
}

/// The host and service tables backed by a single core.
pub struct Tables {
    core: Arc<MemoryCore>,
    hosts: DynamicColumns,
    services: DynamicColumns,
}

impl Tables {
    #[inline]
    pub fn core(&self) -> &MemoryCore {
        &self.core
    }

    pub fn columns(&self, table: Table) -> &DynamicColumns {
        match table {
            Table::Hosts => &self.hosts,
            Table::Services => &self.services,
        }
    }

    /// The root objects of the table rows in insertion order.
    pub fn rows(&self, table: Table) -> &[Address] {
        match table {
            Table::Hosts => self.core.hosts(),
            Table::Services => self.core.services(),
        }
    }

    /// A printable key of the row at `object`, e.g. `web01;CPU load`.
    pub fn row_key(&self, table: Table, object: Address) -> String {
        let location = match table {
            Table::Hosts => HostRow::locate(self.core.as_ref(), object),
            Table::Services => ServiceRow::locate(self.core.as_ref(), object),
        };
        location.map_or_else(|| object.to_string(), |location| location.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "archive": {"step": 60, "rows": 10},
        "files_path": "files",
        "hosts": [
            {
                "name": "web01",
                "metrics": {"load1": [[0, 0.5], [60, 1.5]]},
                "services": [
                    {"description": "CPU load", "metrics": {"util": [[0, 10.0]]}}
                ]
            },
            {"name": "db01"}
        ]
    }"#;

    #[test]
    fn test_load_and_build() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, FIXTURE).unwrap();

        let fixture = Fixture::load(&path).unwrap();
        assert_eq!(fixture.files_path.as_deref(), Some(dir.path().join("files").as_path()));

        let tables = fixture.build().unwrap();
        assert_eq!(tables.rows(Table::Hosts).len(), 2);
        assert_eq!(tables.rows(Table::Services).len(), 1);
        assert_eq!(tables.columns(Table::Hosts).names(), vec!["files", "rrddata"]);
        assert_eq!(
            tables.columns(Table::Services).names(),
            vec!["host_files", "host_rrddata", "rrddata"],
        );

        let service = tables.rows(Table::Services)[0];
        assert_eq!(tables.row_key(Table::Services, service), "web01;CPU load");
        assert_eq!(tables.row_key(Table::Hosts, service), service.to_string());
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, r#"{"hostz": []}"#).unwrap();

        let err = Fixture::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("Parse fixture"), "{err}");
    }

    #[test]
    fn test_defaults_without_files() {
        let fixture: Fixture = serde_json::from_str(r#"{"hosts": [{"name": "web01"}]}"#).unwrap();
        assert_eq!(fixture.archive.step, 60);
        assert_eq!(fixture.archive.rows, 1440);

        let tables = fixture.build().unwrap();
        assert_eq!(tables.columns(Table::Hosts).names(), vec!["rrddata"]);
        assert_eq!(tables.core().hosts().len(), 1);
    }
}
