use std::fmt::{Debug, Formatter};

use parking_lot::RwLock;
use tracing::trace;

use super::{ConsolidationFunction, Core, CoreError, FetchWindow, MetricLocation, TimeSeries};
use crate::offsets::{Address, ObjectMemory};
use crate::rrd::{ArchiveOptions, RoundRobinArchive};

/// The displacement within a service object holding the pointer to its host.
pub const SERVICE_HOST_OFFSET: i32 = 8;

const FIRST_OBJECT: u64 = 0x1000;
const OBJECT_SIZE: u64 = 0x100;

#[derive(Debug, Clone)]
enum MonitoringObject {
    Host { name: String },
    Service { host: Address, description: String },
}

/// A self-contained core keeping its objects and metric archives in memory.
///
/// Objects are laid out in their own address space so offset chains can be
/// resolved against it; a service object stores the address of its host at
/// [SERVICE_HOST_OFFSET].
pub struct MemoryCore {
    archive_options: ArchiveOptions,
    objects: ahash::HashMap<Address, MonitoringObject>,
    pointers: ahash::HashMap<Address, Address>,
    hosts: Vec<Address>,
    services: Vec<Address>,
    metrics: RwLock<ahash::HashMap<(MetricLocation, String), RoundRobinArchive>>,
    next_address: u64,
}

impl Debug for MemoryCore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MemoryCore(hosts={}, services={}, metrics={})",
            self.hosts.len(),
            self.services.len(),
            self.metrics.read().len(),
        )
    }
}

impl Default for MemoryCore {
    fn default() -> Self {
        Self::new(ArchiveOptions::default())
    }
}

impl MemoryCore {
    /// Creates an empty core, metrics are archived using the given options.
    pub fn new(archive_options: ArchiveOptions) -> Self {
        Self {
            archive_options,
            objects: ahash::HashMap::default(),
            pointers: ahash::HashMap::default(),
            hosts: Vec::new(),
            services: Vec::new(),
            metrics: RwLock::new(ahash::HashMap::default()),
            next_address: FIRST_OBJECT,
        }
    }

    fn allocate(&mut self, object: MonitoringObject) -> Address {
        let address = Address(self.next_address);
        self.next_address += OBJECT_SIZE;
        self.objects.insert(address, object);
        address
    }

    /// Adds a host object and returns its address.
    pub fn add_host(&mut self, name: impl Into<String>) -> Address {
        let address = self.allocate(MonitoringObject::Host { name: name.into() });
        self.hosts.push(address);
        address
    }

    /// Adds a service object belonging to the host at `host`.
    pub fn add_service(
        &mut self,
        host: Address,
        description: impl Into<String>,
    ) -> Result<Address, CoreError> {
        if !matches!(self.objects.get(&host), Some(MonitoringObject::Host { .. })) {
            return Err(CoreError::UnknownObject(host));
        }

        let address = self.allocate(MonitoringObject::Service {
            host,
            description: description.into(),
        });
        let slot = address
            .offset(SERVICE_HOST_OFFSET)
            .ok_or(CoreError::UnknownObject(address))?;
        self.pointers.insert(slot, host);
        self.services.push(address);
        Ok(address)
    }

    /// The addresses of all host objects in insertion order.
    pub fn hosts(&self) -> &[Address] {
        &self.hosts
    }

    /// The addresses of all service objects in insertion order.
    pub fn services(&self) -> &[Address] {
        &self.services
    }

    /// Records a metric value, creating the archive on first use.
    pub fn record(&self, location: &MetricLocation, metric: &str, timestamp: i64, value: f64) {
        trace!(location = %location, metric, timestamp, value, "Recording metric value");
        let mut lock = self.metrics.write();
        lock.entry((location.clone(), metric.to_string()))
            .or_insert_with(|| RoundRobinArchive::new(self.archive_options))
            .update(timestamp, value);
    }
}

impl ObjectMemory for MemoryCore {
    fn load_address(&self, at: Address) -> Option<Address> {
        self.pointers.get(&at).copied()
    }
}

impl Core for MemoryCore {
    fn host_name(&self, object: Address) -> Option<String> {
        match self.objects.get(&object)? {
            MonitoringObject::Host { name } => Some(name.clone()),
            MonitoringObject::Service { .. } => None,
        }
    }

    fn service_identity(&self, object: Address) -> Option<(String, String)> {
        match self.objects.get(&object)? {
            MonitoringObject::Service { host, description } => {
                Some((self.host_name(*host)?, description.clone()))
            },
            MonitoringObject::Host { .. } => None,
        }
    }

    fn fetch_series(
        &self,
        location: &MetricLocation,
        metric: &str,
        consolidation: ConsolidationFunction,
        window: &FetchWindow,
    ) -> Result<Option<TimeSeries>, CoreError> {
        let lock = self.metrics.read();
        let series = lock
            .get(&(location.clone(), metric.to_string()))
            .map(|archive| archive.fetch(consolidation, window));
        Ok(series)
    }
}
