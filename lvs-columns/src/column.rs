use std::fmt::{Debug, Display, Formatter};

use serde_json::Value;

use crate::error::ColumnError;
use crate::filter::{Filter, RelationalOperator};
use crate::offsets::{Address, ColumnOffsets, ObjectMemory};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
/// The value type a column produces, as reported by the `columns` table.
pub enum ColumnType {
    Int,
    Double,
    String,
    List,
    Time,
    Dict,
    Blob,
    Null,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Double => "float",
            Self::String => "string",
            Self::List => "list",
            Self::Time => "time",
            Self::Dict => "dict",
            Self::Blob => "blob",
            Self::Null => "null",
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone)]
/// A single table row handed to columns during projection.
///
/// The row is the root object of the table being iterated, columns walk their
/// [ColumnOffsets] through the given memory to reach the data they read.
pub struct Row<'a> {
    root: Address,
    memory: &'a dyn ObjectMemory,
}

impl Debug for Row<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row(root={})", self.root)
    }
}

impl<'a> Row<'a> {
    pub fn new(root: Address, memory: &'a dyn ObjectMemory) -> Self {
        Self { root, memory }
    }

    #[inline]
    pub fn root(&self) -> Address {
        self.root
    }

    /// Walks the offsets from the row root, returning the located object.
    pub fn locate(&self, offsets: &ColumnOffsets) -> Option<Address> {
        offsets.resolve(self.memory, self.root)
    }
}

/// A queryable field accessor on a status table.
pub trait Column: Send + Sync {
    /// The name the column is addressed by within the query.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn offsets(&self) -> &ColumnOffsets;

    fn column_type(&self) -> ColumnType;

    /// Projects the column value for the given row.
    fn output(&self, row: &Row<'_>) -> Result<Value, ColumnError>;

    /// Creates a predicate comparing the column value using `operator`.
    fn create_filter(
        &self,
        operator: RelationalOperator,
        value: &str,
    ) -> Result<Box<dyn Filter>, ColumnError>;
}

impl Debug for dyn Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name())
            .field("type", &self.column_type())
            .field("offsets", self.offsets())
            .finish()
    }
}
