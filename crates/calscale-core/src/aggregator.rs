//! Aggregation of raw energy samples into calendar buckets.
//!
//! Uses rayon for parallel map-reduce over the sample set. Everything here
//! is a pure function of its inputs; nothing caches between calls.

use crate::interval::{bucket_start, days_in_month, periods, DateInterval, Granularity};
use crate::{EnergyPoint, EnergySample, SeriesSummary};
use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use std::collections::HashMap;

/// Summed kcal per bucket-start date. Sparse: buckets without samples are
/// absent, not zero (dense output is `materialize`'s job).
pub type BucketMap = HashMap<NaiveDate, f64>;

/// Bucket every in-interval sample by its truncated timestamp and sum per
/// bucket. Samples outside `[interval.start, interval.end)` are excluded.
pub fn aggregate_samples<Tz>(
    samples: &[EnergySample],
    interval: DateInterval,
    granularity: Granularity,
    tz: &Tz,
) -> BucketMap
where
    Tz: chrono::TimeZone + Sync,
{
    if samples.is_empty() {
        return BucketMap::new();
    }

    samples
        .par_iter()
        .filter(|s| interval.contains(s.timestamp))
        .fold(BucketMap::new, |mut acc, s| {
            *acc.entry(bucket_start(s.timestamp, granularity, tz))
                .or_insert(0.0) += s.kcal;
            acc
        })
        .reduce(BucketMap::new, |mut a, b| {
            for (bucket, kcal) in b {
                *a.entry(bucket).or_insert(0.0) += kcal;
            }
            a
        })
}

/// Outer-join two bucket maps over the union of their keys, treating a
/// missing side as zero before applying `combine`.
///
/// With addition as `combine` this is commutative and associative, so
/// merges can be chained across any number of series.
pub fn merge_buckets<F>(a: &BucketMap, b: &BucketMap, combine: F) -> BucketMap
where
    F: Fn(f64, f64) -> f64,
{
    let mut merged = BucketMap::with_capacity(a.len().max(b.len()));
    for (bucket, &va) in a {
        let vb = b.get(bucket).copied().unwrap_or(0.0);
        merged.insert(*bucket, combine(va, vb));
    }
    for (bucket, &vb) in b {
        if !a.contains_key(bucket) {
            merged.insert(*bucket, combine(0.0, vb));
        }
    }
    merged
}

/// Produce one point per enumerated bucket, in chronological order,
/// substituting zero for buckets the map has no entry for. Charts built on
/// the result never show holes, however sparse the input was.
pub fn materialize<Tz: chrono::TimeZone>(
    buckets: &BucketMap,
    interval: DateInterval,
    granularity: Granularity,
    tz: &Tz,
) -> Vec<EnergyPoint> {
    periods(interval, granularity, tz)
        .map(|date| EnergyPoint {
            date,
            kcal: buckets.get(&date).copied().unwrap_or(0.0),
            granularity,
        })
        .collect()
}

/// Summary statistics over a materialized series.
pub fn summarize(points: &[EnergyPoint]) -> SeriesSummary {
    let total_kcal: f64 = points.iter().map(|p| p.kcal).sum();
    let active_buckets = points.iter().filter(|p| p.kcal > 0.0).count() as u32;
    let max_bucket_kcal = points.iter().map(|p| p.kcal).fold(0.0, f64::max);

    SeriesSummary {
        total_kcal,
        bucket_count: points.len() as u32,
        active_buckets,
        average_per_active_bucket: if active_buckets > 0 {
            total_kcal / f64::from(active_buckets)
        } else {
            0.0
        },
        max_bucket_kcal,
    }
}

impl EnergyPoint {
    /// Average kcal per day represented by this bucket.
    ///
    /// Day buckets are their own average. Month buckets divide by the
    /// calendar month length, except the bucket containing `end_local`
    /// (the local date of the interval end), which divides by the days
    /// elapsed so a partial final month is not understated.
    pub fn daily_average(&self, end_local: NaiveDate) -> f64 {
        match self.granularity {
            Granularity::Day => self.kcal,
            Granularity::Month => {
                let same_month = end_local.year() == self.date.year()
                    && end_local.month() == self.date.month();
                let days = if same_month {
                    end_local.day()
                } else {
                    days_in_month(self.date)
                };
                if days == 0 {
                    0.0
                } else {
                    self.kcal / f64::from(days)
                }
            }
        }
    }
}
