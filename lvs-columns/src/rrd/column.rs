use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use serde_json::Value;

use crate::column::{Column, ColumnType, Row};
use crate::dynamic::BackingKind;
use crate::error::{ColumnError, ColumnKindLabel, ConstructionError};
use crate::filter::{Filter, RelationalOperator};
use crate::monitoring::{HostRow, RowKind, ServiceRow};
use crate::offsets::ColumnOffsets;
use crate::rrd::{Renderer, RrdData, RrdDataMaker};

/// A column type which can be bound by an RRD backed dynamic column.
pub trait RrdLeafColumn: Column + Sized + 'static {
    /// Assembles the bound column from the parts built by the factory.
    fn from_parts(
        name: String,
        description: String,
        offsets: ColumnOffsets,
        renderer: Box<dyn Renderer<RrdData>>,
        data_maker: RrdDataMaker,
    ) -> Result<Self, ConstructionError>;
}

/// The metric history of host objects.
pub type HostRrdColumn = RrdColumn<HostRow>;
/// The metric history of service objects.
pub type ServiceRrdColumn = RrdColumn<ServiceRow>;

/// A column bound to a metric expression, reading objects of kind `R`.
pub struct RrdColumn<R> {
    name: String,
    description: String,
    offsets: ColumnOffsets,
    renderer: Box<dyn Renderer<RrdData>>,
    data_maker: RrdDataMaker,
    _row: PhantomData<fn() -> R>,
}

impl<R: RowKind> Debug for RrdColumn<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RrdColumn")
            .field("name", &self.name)
            .field("row", &R::NAME)
            .field("offsets", &self.offsets)
            .field("data_maker", &self.data_maker)
            .finish_non_exhaustive()
    }
}

impl<R: RowKind> RrdColumn<R> {
    pub fn new(
        name: String,
        description: String,
        offsets: ColumnOffsets,
        renderer: Box<dyn Renderer<RrdData>>,
        data_maker: RrdDataMaker,
    ) -> Self {
        Self {
            name,
            description,
            offsets,
            renderer,
            data_maker,
            _row: PhantomData,
        }
    }

    #[inline]
    pub fn data_maker(&self) -> &RrdDataMaker {
        &self.data_maker
    }

    #[inline]
    pub fn renderer(&self) -> &dyn Renderer<RrdData> {
        self.renderer.as_ref()
    }

    fn data(&self, row: &Row<'_>) -> Result<RrdData, ColumnError> {
        let Some(object) = row.locate(&self.offsets) else {
            return Ok(RrdData::default());
        };
        let Some(location) = self.data_maker.locate::<R>(object) else {
            return Ok(RrdData::default());
        };
        Ok(self.data_maker.make(&location)?)
    }
}

impl<R: RowKind> Column for RrdColumn<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn offsets(&self) -> &ColumnOffsets {
        &self.offsets
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::List
    }

    fn output(&self, row: &Row<'_>) -> Result<Value, ColumnError> {
        let data = self.data(row)?;
        Ok(self.renderer.render(&data))
    }

    fn create_filter(
        &self,
        _operator: RelationalOperator,
        _value: &str,
    ) -> Result<Box<dyn Filter>, ColumnError> {
        Err(ColumnError::UnsupportedOperation {
            kind: ColumnKindLabel::Bound(BackingKind::Rrd),
            column: self.name.clone(),
        })
    }
}

impl<R: RowKind> RrdLeafColumn for RrdColumn<R> {
    fn from_parts(
        name: String,
        description: String,
        offsets: ColumnOffsets,
        renderer: Box<dyn Renderer<RrdData>>,
        data_maker: RrdDataMaker,
    ) -> Result<Self, ConstructionError> {
        Ok(Self::new(name, description, offsets, renderer, data_maker))
    }
}
