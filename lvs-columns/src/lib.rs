//! Columns of the lvs status tables which are bound at query time.
//!
//! A table registers [DynamicColumn] definitions under a name, queries then
//! reference them as `<dynamic>:<name>:<arguments>` and receive a freshly
//! bound [Column] reading the data selected by the arguments.

mod column;
mod dynamic;
mod error;
mod filter;
pub mod monitoring;
mod offsets;
mod registry;
pub mod rrd;

pub use self::column::{Column, ColumnType, Row};
pub use self::dynamic::{
    BackingKind,
    DynamicColumn,
    DynamicColumnDef,
    DynamicFileColumn,
    DynamicRrdColumn,
    FileColumn,
    DYNAMIC_COLUMN_DESCRIPTION,
};
pub use self::error::{ColumnError, ColumnKindLabel, ConstructionError};
pub use self::filter::{Filter, ParseOperatorError, RelationalOperator};
pub use self::offsets::{Address, ColumnOffsets, ObjectMemory};
pub use self::registry::DynamicColumns;
