//! A fixed size, in-memory round-robin archive.
//!
//! Each archive keeps one primary data point per `step` seconds for the last
//! `rows` steps, newer points overwrite the oldest slot. Consolidation to a
//! coarser resolution happens at fetch time.

use bon::Builder;

use crate::monitoring::{ConsolidationFunction, FetchWindow, TimeSeries};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Builder)]
/// Configures the shape of a [RoundRobinArchive].
pub struct ArchiveOptions {
    #[builder(default = 60)]
    /// The number of seconds covered by each primary data point.
    step: i64,
    #[builder(default = 1440)]
    /// The number of primary data points retained.
    ///
    /// The default keeps one day of minute values.
    rows: usize,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ArchiveOptions {
    #[inline]
    pub fn step(&self) -> i64 {
        self.step.max(1)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct RoundRobinArchive {
    options: ArchiveOptions,
    /// The primary bucket index and value held by each slot.
    slots: Box<[Option<(i64, f64)>]>,
    latest: Option<i64>,
}

impl RoundRobinArchive {
    pub fn new(options: ArchiveOptions) -> Self {
        Self {
            options,
            slots: vec![None; options.rows()].into_boxed_slice(),
            latest: None,
        }
    }

    #[inline]
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Records a value, replacing any value already recorded for the same step.
    ///
    /// Values older than the retained window are dropped.
    pub fn update(&mut self, timestamp: i64, value: f64) {
        let bucket = timestamp.div_euclid(self.options.step());
        let rows = i64::try_from(self.options.rows()).unwrap_or(i64::MAX);

        if let Some(latest) = self.latest {
            if bucket <= latest.saturating_sub(rows) {
                return;
            }
        }

        self.slots[bucket.rem_euclid(rows) as usize] = Some((bucket, value));
        self.latest = Some(self.latest.map_or(bucket, |latest| latest.max(bucket)));
    }

    fn primary(&self, bucket: i64) -> Option<f64> {
        let slot = bucket.rem_euclid(self.options.rows() as i64) as usize;
        match self.slots[slot] {
            Some((stored, value)) if stored == bucket => Some(value),
            _ => None,
        }
    }

    /// Returns the series covering the window, consolidated to the smallest
    /// multiple of the archive step that is at least the requested resolution.
    pub fn fetch(&self, consolidation: ConsolidationFunction, window: &FetchWindow) -> TimeSeries {
        let step = self.options.step();
        let resolution = window.resolution.max(step);
        let per_point = resolution / step + i64::from(resolution % step != 0);
        let out_step = per_point.saturating_mul(step);

        let start = window.start.div_euclid(out_step).saturating_mul(out_step);
        let mut end = window.end.div_euclid(out_step).saturating_mul(out_step);
        if end < window.end {
            end = end.saturating_add(out_step);
        }
        let end = end.max(start);

        // Only buckets in `retained` can hold a value.
        let retained = self.latest.map(|latest| {
            let rows = i64::try_from(self.options.rows()).unwrap_or(i64::MAX);
            (latest.saturating_sub(rows).saturating_add(1), latest)
        });

        let values = (start..end)
            .step_by(usize::try_from(out_step).unwrap_or(usize::MAX))
            .map(|point_start| {
                let (oldest, latest) = retained?;
                let first = point_start.div_euclid(step).max(oldest);
                let last = point_start
                    .div_euclid(step)
                    .saturating_add(per_point - 1)
                    .min(latest);
                consolidation.consolidate((first..=last).filter_map(|b| self.primary(b)))
            })
            .collect();

        TimeSeries {
            start,
            end,
            step: out_step,
            values,
        }
    }
}
