use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use super::{BackingKind, DynamicColumn, DynamicColumnDef, DYNAMIC_COLUMN_DESCRIPTION};
use crate::column::Column;
use crate::error::{ColumnError, ColumnKindLabel};
use crate::filter::{Filter, RelationalOperator};
use crate::monitoring::Core;
use crate::offsets::ColumnOffsets;
use crate::rrd::{RrdColumnArgs, RrdDataMaker, RrdLeafColumn, RrdRenderer};

/// A dynamic column binding metric history columns of type `T`.
///
/// The argument string of each column reference selects the metric
/// expression and time range, see [RrdColumnArgs].
pub struct DynamicRrdColumn<T> {
    def: DynamicColumnDef,
    core: Arc<dyn Core>,
    _leaf: PhantomData<fn() -> T>,
}

impl<T> Debug for DynamicRrdColumn<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicRrdColumn")
            .field("def", &self.def)
            .field("leaf", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: RrdLeafColumn> DynamicRrdColumn<T> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        core: Arc<dyn Core>,
        offsets: ColumnOffsets,
    ) -> Self {
        Self {
            def: DynamicColumnDef::new(name, description, offsets),
            core,
            _leaf: PhantomData,
        }
    }

    /// Binds a new leaf column, see [DynamicColumn::create_column].
    pub fn create_leaf(&self, name: &str, arguments: &str) -> Result<T, ColumnError> {
        let args = RrdColumnArgs::parse(arguments, self.def.name_str())?;
        let data_maker = RrdDataMaker::new(self.core.clone(), args);

        let leaf = T::from_parts(
            name.to_string(),
            DYNAMIC_COLUMN_DESCRIPTION.to_string(),
            *self.def.offsets(),
            Box::new(RrdRenderer::new()),
            data_maker,
        )?;
        Ok(leaf)
    }
}

impl<T: RrdLeafColumn> DynamicColumn for DynamicRrdColumn<T> {
    fn definition(&self) -> &DynamicColumnDef {
        &self.def
    }

    fn kind(&self) -> BackingKind {
        BackingKind::Rrd
    }

    fn create_column(&self, name: &str, arguments: &str) -> Result<Box<dyn Column>, ColumnError> {
        self.def.logger().debug(format_args!(
            "binding column '{name}' of dynamic RRD column '{}' with arguments '{arguments}'",
            self.def.name_str(),
        ));
        Ok(Box::new(self.create_leaf(name, arguments)?))
    }

    fn create_filter(
        &self,
        _operator: RelationalOperator,
        _value: &str,
    ) -> Result<Box<dyn Filter>, ColumnError> {
        Err(ColumnError::UnsupportedOperation {
            kind: ColumnKindLabel::Dynamic(BackingKind::Rrd),
            column: self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::column::{ColumnType, Row};
    use crate::error::ConstructionError;
    use crate::monitoring::{MemoryCore, MetricLocation};
    use crate::rrd::{HostRrdColumn, Renderer, RrdData, ServiceRrdColumn};

    fn core() -> Arc<MemoryCore> {
        let mut core = MemoryCore::default();
        let host = core.add_host("web01");
        core.add_service(host, "CPU load").unwrap();
        core.record(&MetricLocation::service("web01", "CPU load"), "load1", 0, 1.25);
        Arc::new(core)
    }

    fn rrddata(core: Arc<MemoryCore>) -> DynamicRrdColumn<ServiceRrdColumn> {
        DynamicRrdColumn::new(
            "rrddata",
            "RRD metrics data of this object",
            core,
            ColumnOffsets::default(),
        )
    }

    #[rstest::rstest]
    fn test_create_filter_always_fails(
        #[values(
            RelationalOperator::Equal,
            RelationalOperator::NotEqual,
            RelationalOperator::Matches,
            RelationalOperator::DoesntMatchIcase,
            RelationalOperator::Less,
            RelationalOperator::GreaterOrEqual,
            RelationalOperator::Greater,
            RelationalOperator::LessOrEqual
        )]
        operator: RelationalOperator,
        #[values("", "0", "load1:0:60:60", "anything")] value: &str,
    ) {
        let column = rrddata(core());
        let err = column
            .create_filter(operator, value)
            .err()
            .expect("Filtering should fail");

        assert!(matches!(err, ColumnError::UnsupportedOperation { .. }));
        let message = err.to_string();
        assert!(message.contains("'rrddata'"), "Error should name the column: {message}");
        assert_eq!(message, "filtering on dynamic RRD column 'rrddata' not supported");
    }

    #[test]
    fn test_create_column_binds_leaf() {
        let core = core();
        let column = rrddata(core.clone());

        let bound = column.create_column("m1", "load1:0:60:60").unwrap();
        assert_eq!(bound.name(), "m1");
        assert_eq!(bound.description(), "dynamic column");
        assert_eq!(bound.offsets(), column.offsets());
        assert_eq!(bound.column_type(), ColumnType::List);

        let row = Row::new(core.services()[0], &*core);
        assert_eq!(bound.output(&row).unwrap(), json!([0, 60, 60, 1.25]));
    }

    #[test]
    fn test_create_column_keeps_offsets() {
        let offsets = ColumnOffsets::new(8, -4, 0, 12);
        let column: DynamicRrdColumn<HostRrdColumn> =
            DynamicRrdColumn::new("host_rrddata", "host metrics", core(), offsets);

        let bound = column.create_column("m1", "load1:0:60:60").unwrap();
        assert_eq!(*bound.offsets(), offsets);
    }

    #[test]
    fn test_create_column_returns_distinct_instances() {
        let column = rrddata(core());

        let first = column.create_leaf("m", "args,1,+:0:60:60").unwrap();
        let second = column.create_leaf("m", "args,1,+:0:60:60").unwrap();
        assert!(!std::ptr::eq(&first, &second));
        assert!(!std::ptr::eq(first.data_maker(), second.data_maker()));
        assert_eq!(first.data_maker().args(), second.data_maker().args());

        let first = column.create_column("m", "args,1,+:0:60:60").unwrap();
        let second = column.create_column("m", "args,1,+:0:60:60").unwrap();
        assert!(
            !std::ptr::addr_eq(&*first, &*second),
            "Each call should allocate its own column",
        );
    }

    #[rstest::rstest]
    #[case("", "missing RPN expression for RRD")]
    #[case("load1:0", "missing end time")]
    #[case("load1,*:0:60:60", "invalid RPN expression 'load1,*': not enough operands for '*'")]
    fn test_create_column_propagates_malformed_arguments(
        #[case] arguments: &str,
        #[case] reason: &str,
    ) {
        let column = rrddata(core());

        let err = match column.create_column("m1", arguments) {
            Err(ColumnError::Construction(err)) => err,
            other => panic!("Expected a construction failure, got: {:?}", other.err()),
        };
        // The dynamic column name is reported, not the alias.
        assert_eq!(
            err,
            ConstructionError::InvalidArguments {
                column: "rrddata".to_string(),
                reason: reason.to_string(),
            },
        );
    }

    #[test]
    fn test_create_column_rejects_overflowing_range() {
        let column = rrddata(core());

        let err = column
            .create_column("m", "load1:-9223372036854775808:9223372036854775807:60")
            .err()
            .expect("Binding should fail");
        assert_eq!(
            err.to_string(),
            "invalid arguments for column 'rrddata': time range too large",
        );
    }

    #[rstest::rstest]
    #[case("load1:0:60:9223372036854775807")]
    #[case("load1:0:60:600000000000")]
    #[case("load1:-9223372036854775807:0:1:10000")]
    fn test_output_with_extreme_arguments(#[case] arguments: &str) {
        let core = core();
        let column = rrddata(core.clone());

        let bound = column.create_column("m", arguments).unwrap();
        let row = Row::new(core.services()[0], &*core);
        let value = bound.output(&row).unwrap();

        let list = value.as_array().expect("Output should be a list");
        assert!(list.len() <= 3 + 10_000, "{arguments}: {} entries", list.len());
    }

    struct FailingLeaf {
        offsets: ColumnOffsets,
    }

    impl Column for FailingLeaf {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            DYNAMIC_COLUMN_DESCRIPTION
        }

        fn offsets(&self) -> &ColumnOffsets {
            &self.offsets
        }

        fn column_type(&self) -> ColumnType {
            ColumnType::Null
        }

        fn output(&self, _row: &Row<'_>) -> Result<Value, ColumnError> {
            Ok(Value::Null)
        }

        fn create_filter(
            &self,
            _operator: RelationalOperator,
            _value: &str,
        ) -> Result<Box<dyn Filter>, ColumnError> {
            Err(ColumnError::UnsupportedOperation {
                kind: ColumnKindLabel::Bound(BackingKind::Rrd),
                column: self.name().to_string(),
            })
        }
    }

    impl RrdLeafColumn for FailingLeaf {
        fn from_parts(
            _name: String,
            _description: String,
            _offsets: ColumnOffsets,
            renderer: Box<dyn Renderer<RrdData>>,
            _data_maker: RrdDataMaker,
        ) -> Result<Self, ConstructionError> {
            // The renderer handed over must be usable.
            assert_eq!(renderer.render(&RrdData::default()), json!([]));
            Err(ConstructionError::Rejected("renderer unavailable".to_string()))
        }
    }

    #[test]
    fn test_create_column_propagates_leaf_failure() {
        let column: DynamicRrdColumn<FailingLeaf> =
            DynamicRrdColumn::new("rrddata", "broken", core(), ColumnOffsets::default());

        let err = column
            .create_column("m1", "load1:0:60:60")
            .err()
            .expect("Binding should fail");
        assert!(
            matches!(&err, ColumnError::Construction(ConstructionError::Rejected(msg)) if msg == "renderer unavailable"),
            "Unexpected error: {err:?}",
        );
        assert_eq!(err.to_string(), "renderer unavailable");
    }

    #[test]
    fn test_concurrent_create_column() {
        let column = rrddata(core());
        let before = format!("{column:?}");

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let column = &column;
                    scope.spawn(move || {
                        (0..50)
                            .map(|j| {
                                let name = format!("m{i}_{j}");
                                let bound = column.create_column(&name, "load1:0:60:60").unwrap();
                                assert_eq!(bound.name(), name);
                                bound
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            for handle in handles {
                let bound = handle.join().expect("Worker should not panic");
                assert_eq!(bound.len(), 50);
            }
        });

        assert_eq!(format!("{column:?}"), before, "Definition should not change");
        assert_eq!(column.name(), "rrddata");
        assert_eq!(*column.offsets(), ColumnOffsets::default());
    }
}
