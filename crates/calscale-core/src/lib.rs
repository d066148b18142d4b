#![deny(clippy::all)]

mod aggregator;
mod interval;
mod profile;
mod provider;
mod report;

pub use aggregator::*;
pub use interval::*;
pub use profile::*;
pub use provider::*;
pub use report::*;

use chrono::{DateTime, NaiveDate, Utc};

pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// One raw energy measurement from an external provider. Read-only input
/// to the aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    pub timestamp: DateTime<Utc>,
    pub kcal: f64,
}

/// One bucket of a materialized series: the bucket-start date and the
/// summed kcal for that day or month.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyPoint {
    pub date: NaiveDate,
    pub kcal: f64,
    pub granularity: Granularity,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub total_kcal: f64,
    pub bucket_count: u32,
    pub active_buckets: u32,
    pub average_per_active_bucket: f64,
    pub max_bucket_kcal: f64,
}
