use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use lvs_common::{Logger, LIVESTATUS_CATEGORY};

use crate::monitoring::{Core, CoreError, MetricLocation, RowKind, TimeSeries};
use crate::offsets::Address;
use crate::rrd::RrdColumnArgs;

#[derive(Debug, Default, Clone, PartialEq)]
/// The evaluated metric expression for a single object.
pub struct RrdData {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub values: Vec<Option<f64>>,
}

impl RrdData {
    /// Data is empty when nothing could be fetched for the object.
    pub fn is_empty(&self) -> bool {
        self.step == 0
    }
}

/// Fetches and evaluates the metric expression of an RRD column.
pub struct RrdDataMaker {
    core: Arc<dyn Core>,
    args: RrdColumnArgs,
    logger: Arc<Logger>,
}

impl Debug for RrdDataMaker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RrdDataMaker")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl RrdDataMaker {
    pub fn new(core: Arc<dyn Core>, args: RrdColumnArgs) -> Self {
        Self {
            core,
            args,
            logger: Logger::get(LIVESTATUS_CATEGORY),
        }
    }

    #[inline]
    pub fn args(&self) -> &RrdColumnArgs {
        &self.args
    }

    /// Identifies the object at `object` as a row of kind `R`.
    pub fn locate<R: RowKind>(&self, object: Address) -> Option<MetricLocation> {
        R::locate(self.core.as_ref(), object)
    }

    /// Fetches every metric the expression reads and evaluates it per step.
    ///
    /// If any of the metrics is not recorded for the location the result is empty.
    pub fn make(&self, location: &MetricLocation) -> Result<RrdData, CoreError> {
        let window = self.args.fetch_window();

        let mut series: Vec<TimeSeries> = Vec::with_capacity(self.args.rpn.variables().len());
        for variable in self.args.rpn.variables() {
            let fetched = self.core.fetch_series(
                location,
                &variable.name,
                variable.consolidation,
                &window,
            )?;

            match fetched {
                Some(fetched) => series.push(fetched),
                None => {
                    self.logger.debug(format_args!(
                        "cannot find metric '{}' of {location}",
                        variable.name,
                    ));
                    return Ok(RrdData::default());
                },
            }
        }

        let (start, end, step, points) = match series.first() {
            Some(first) => (first.start, first.end, first.step, first.values.len()),
            None => {
                let span = window.end.saturating_sub(window.start).max(0);
                let points = span / window.resolution.max(1);
                let points = usize::try_from(points).unwrap_or(usize::MAX).min(self.args.max_entries);
                (window.start, window.end, window.resolution, points)
            },
        };
        if step <= 0 {
            return Ok(RrdData::default());
        }

        let values = (0..points)
            .map(|i| {
                self.args
                    .rpn
                    .evaluate(|var| series[var].values.get(i).copied().flatten())
            })
            .collect();

        Ok(RrdData {
            start,
            end,
            step,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::{HostRow, MemoryCore, ServiceRow};
    use crate::rrd::ArchiveOptions;

    fn core() -> (Arc<MemoryCore>, Address, Address) {
        let mut core = MemoryCore::new(ArchiveOptions::builder().step(60).rows(60).build());
        let host = core.add_host("web01");
        let service = core.add_service(host, "Interface 1").unwrap();

        let host_location = MetricLocation::host("web01");
        let service_location = MetricLocation::service("web01", "Interface 1");
        for (i, ts) in (0..4).map(|i| (i, i * 60)) {
            core.record(&host_location, "load1", ts, i as f64);
            core.record(&service_location, "in", ts, 100.0 * i as f64);
            core.record(&service_location, "out", ts, 50.0);
        }
        (Arc::new(core), host, service)
    }

    fn maker(core: Arc<MemoryCore>, arguments: &str) -> RrdDataMaker {
        RrdDataMaker::new(core, RrdColumnArgs::parse(arguments, "rrddata").unwrap())
    }

    #[test]
    fn test_make_single_metric() {
        let (core, host, _) = core();
        let maker = maker(core, "load1:0:240:60");

        let location = maker.locate::<HostRow>(host).expect("Host should be located");
        let data = maker.make(&location).unwrap();
        assert_eq!(
            data,
            RrdData {
                start: 0,
                end: 240,
                step: 60,
                values: vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)],
            },
        );
    }

    #[test]
    fn test_make_expression() {
        let (core, _, service) = core();
        let maker = maker(core, "in,out,+,8,*:0:240:120");

        let location = maker.locate::<ServiceRow>(service).unwrap();
        let data = maker.make(&location).unwrap();
        assert_eq!(data.step, 120);
        // avg(in) = 50 and 250 per point, out is constant 50.
        assert_eq!(data.values, vec![Some(800.0), Some(2400.0)]);
    }

    #[test]
    fn test_make_respects_max_entries() {
        let (core, host, _) = core();
        let maker = maker(core, "load1.max:0:240:60:1");

        let location = maker.locate::<HostRow>(host).unwrap();
        let data = maker.make(&location).unwrap();
        assert_eq!(data.step, 240);
        assert_eq!(data.values, vec![Some(3.0)]);
    }

    #[test]
    fn test_make_missing_metric_is_empty() {
        let (core, host, _) = core();
        let maker = maker(core, "load1,load15,+:0:240:60");

        let location = maker.locate::<HostRow>(host).unwrap();
        let data = maker.make(&location).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_make_constant_expression() {
        let (core, host, _) = core();
        let maker = maker(core, "42:0:180:60");

        let location = maker.locate::<HostRow>(host).unwrap();
        let data = maker.make(&location).unwrap();
        assert_eq!(data.values, vec![Some(42.0); 3]);
    }

    #[rstest::rstest]
    #[case("load1:0:60:9223372036854775807", vec![Some(1.5)])]
    #[case("load1:0:240:600000000000", vec![Some(1.5)])]
    #[case("load1:0:9223372036854775807:1:2", vec![Some(1.5), None])]
    #[case("7:-9223372036854775807:0:1:3", vec![Some(7.0); 2])]
    fn test_make_extreme_arguments(#[case] arguments: &str, #[case] expected: Vec<Option<f64>>) {
        let (core, host, _) = core();
        let maker = maker(core, arguments);

        let location = maker.locate::<HostRow>(host).unwrap();
        let data = maker.make(&location).unwrap();
        assert_eq!(data.values, expected);
    }

    #[test]
    fn test_locate_wrong_row_kind() {
        let (core, host, service) = core();
        let maker = maker(core, "load1:0:240:60");

        assert!(maker.locate::<ServiceRow>(host).is_none());
        assert!(maker.locate::<HostRow>(service).is_none());
    }
}
