//! Calendar intervals and bucket-start enumeration.
//!
//! All truncation is done against an explicit timezone so that bucket
//! boundaries are reproducible in tests regardless of the host locale.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Bucket size for calendar aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
}

/// Half-open range of instants `[start, end)`.
///
/// An inverted interval (`start > end`) is not an error; every operation
/// treats it as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Truncate an instant to the start date of its containing bucket,
/// expressed as a local `NaiveDate` in `tz`.
pub fn bucket_start<Tz: TimeZone>(ts: DateTime<Utc>, granularity: Granularity, tz: &Tz) -> NaiveDate {
    let date = ts.with_timezone(tz).date_naive();
    match granularity {
        Granularity::Day => date,
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// The UTC instant at which the local day containing `ts` begins.
pub fn local_day_start<Tz: TimeZone>(ts: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let midnight = ts.with_timezone(tz).date_naive().and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(ts)
}

/// Lazy iterator over every bucket-start date of an interval.
///
/// A bucket is emitted iff its start (local midnight) lies strictly before
/// the interval end in local time. An end falling exactly on a bucket
/// boundary excludes that bucket; an end inside a bucket includes it, so the
/// final partial day/month of an interval is never dropped.
#[derive(Debug, Clone)]
pub struct PeriodIter {
    granularity: Granularity,
    current: Option<NaiveDate>,
    end_local: NaiveDateTime,
}

impl Iterator for PeriodIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let date = self.current?;
        if date.and_time(NaiveTime::MIN) >= self.end_local {
            self.current = None;
            return None;
        }
        self.current = match self.granularity {
            Granularity::Day => date.succ_opt(),
            Granularity::Month => date.checked_add_months(Months::new(1)),
        };
        Some(date)
    }
}

/// Enumerate the bucket-start dates of `interval` at `granularity`.
///
/// Finite, restartable (same inputs produce the same sequence) and lazy.
pub fn periods<Tz: TimeZone>(
    interval: DateInterval,
    granularity: Granularity,
    tz: &Tz,
) -> PeriodIter {
    PeriodIter {
        granularity,
        current: Some(bucket_start(interval.start, granularity, tz)),
        end_local: interval.end.with_timezone(tz).naive_local(),
    }
}

/// Calendar length of the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => next.signed_duration_since(first).num_days() as u32,
        None => 0,
    }
}
