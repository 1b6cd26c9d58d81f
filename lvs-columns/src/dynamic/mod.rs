//! Dynamic columns.
//!
//! A dynamic column is registered once per table and binds a fresh [Column]
//! for every reference of the form `<dynamic>:<name>:<arguments>` in a query.
//! The definition itself never renders nor filters, it only carries the
//! identity and field location shared by the columns it creates.

mod file;
mod rrd;

use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use lvs_common::{Logger, LIVESTATUS_CATEGORY};

pub use self::file::{DynamicFileColumn, FileColumn};
pub use self::rrd::DynamicRrdColumn;
use crate::column::Column;
use crate::error::{ColumnError, ColumnKindLabel};
use crate::filter::{Filter, RelationalOperator};
use crate::offsets::ColumnOffsets;

/// The description given to every column bound by a dynamic column.
pub const DYNAMIC_COLUMN_DESCRIPTION: &str = "dynamic column";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
/// The kind of data a dynamic column binds its columns to.
pub enum BackingKind {
    /// Metric history from the round-robin store.
    Rrd,
    /// Per host files below a base directory.
    File,
}

impl Display for BackingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rrd => f.write_str("RRD"),
            Self::File => f.write_str("file"),
        }
    }
}

#[derive(Clone)]
/// The immutable identity shared by all dynamic column kinds.
pub struct DynamicColumnDef {
    name: String,
    description: String,
    offsets: ColumnOffsets,
    logger: Arc<Logger>,
}

impl Debug for DynamicColumnDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicColumnDef")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("offsets", &self.offsets)
            .finish_non_exhaustive()
    }
}

impl DynamicColumnDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        offsets: ColumnOffsets,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            offsets,
            logger: Logger::get(LIVESTATUS_CATEGORY),
        }
    }

    /// Creates a definition from the three hop offsets, the leaf offset is zero.
    pub fn with_offsets(
        name: impl Into<String>,
        description: impl Into<String>,
        indirect_offset: i32,
        extra_offset: i32,
        extra_extra_offset: i32,
    ) -> Self {
        Self::new(
            name,
            description,
            ColumnOffsets::hops(indirect_offset, extra_offset, extra_extra_offset),
        )
    }

    #[inline]
    pub fn name(&self) -> String {
        self.name.clone()
    }

    #[inline]
    pub(crate) fn name_str(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn offsets(&self) -> &ColumnOffsets {
        &self.offsets
    }

    #[inline]
    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

/// A factory binding query-time columns, one implementation per [BackingKind].
pub trait DynamicColumn: Send + Sync {
    fn definition(&self) -> &DynamicColumnDef;

    fn kind(&self) -> BackingKind;

    /// The name the dynamic column is registered under.
    fn name(&self) -> String {
        self.definition().name()
    }

    fn description(&self) -> &str {
        self.definition().description()
    }

    fn offsets(&self) -> &ColumnOffsets {
        self.definition().offsets()
    }

    fn logger(&self) -> &Arc<Logger> {
        self.definition().logger()
    }

    /// Binds a new column called `name` to the data selected by `arguments`.
    ///
    /// Every call returns a new, independently owned column.
    fn create_column(&self, name: &str, arguments: &str) -> Result<Box<dyn Column>, ColumnError>;

    /// Creates a predicate on the unbound column.
    ///
    /// Kinds which cannot filter fail with [ColumnError::UnsupportedOperation].
    fn create_filter(
        &self,
        _operator: RelationalOperator,
        _value: &str,
    ) -> Result<Box<dyn Filter>, ColumnError> {
        Err(ColumnError::UnsupportedOperation {
            kind: ColumnKindLabel::Dynamic(self.kind()),
            column: self.name(),
        })
    }
}

impl Debug for dyn DynamicColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicColumn")
            .field("kind", &self.kind())
            .field("definition", self.definition())
            .finish()
    }
}
