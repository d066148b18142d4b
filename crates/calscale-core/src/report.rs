//! Period policies and energy report assembly.
//!
//! `ChartPeriod` is the external policy table mapping a picker choice to a
//! span and a bucket granularity; `energy_report` runs the whole pipeline:
//! fetch, aggregate, merge, materialize, summarize.

use crate::aggregator::{aggregate_samples, materialize, merge_buckets, summarize, BucketMap};
use crate::interval::{local_day_start, DateInterval, Granularity};
use crate::profile::UserProfile;
use crate::provider::{EnergyKind, EnergyProvider, ProviderError};
use crate::EnergyPoint;
use crate::SeriesSummary;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

/// Chart period picker. The span/granularity mapping is policy, not
/// engine mechanics: short spans chart days, long spans chart months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartPeriod {
    Week,
    Month,
    HalfYear,
    Year,
}

impl ChartPeriod {
    pub fn days(&self) -> i64 {
        match self {
            ChartPeriod::Week => 7,
            ChartPeriod::Month => 30,
            ChartPeriod::HalfYear => 180,
            ChartPeriod::Year => 365,
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            ChartPeriod::Week | ChartPeriod::Month => Granularity::Day,
            ChartPeriod::HalfYear | ChartPeriod::Year => Granularity::Month,
        }
    }

    /// `[start-of-day(now - span + 1), now)` in the given timezone, so a
    /// week ending now covers exactly seven day buckets.
    pub fn interval<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> DateInterval {
        let start = local_day_start(now - Duration::days(self.days() - 1), tz);
        DateInterval::new(start, now)
    }
}

/// A materialized series plus its summary statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySeries {
    pub points: Vec<EnergyPoint>,
    pub summary: SeriesSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub generated_at: String,
    pub version: String,
    pub period: ChartPeriod,
    pub granularity: Granularity,
    pub range_start: Option<NaiveDate>,
    pub range_end: Option<NaiveDate>,
}

/// Basal, active and combined (total) energy series over one period.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyReport {
    pub meta: ReportMeta,
    pub basal: EnergySeries,
    pub active: EnergySeries,
    pub total: EnergySeries,
}

/// Today's dashboard numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySnapshot {
    pub date: NaiveDate,
    pub basal_kcal: f64,
    pub active_kcal: f64,
    pub total_kcal: f64,
    pub bmr: Option<f64>,
    pub tdee: Option<f64>,
}

fn build_series<Tz: TimeZone>(
    buckets: &BucketMap,
    interval: DateInterval,
    granularity: Granularity,
    tz: &Tz,
) -> EnergySeries {
    let points = materialize(buckets, interval, granularity, tz);
    let summary = summarize(&points);
    EnergySeries { points, summary }
}

/// Run the full pipeline for one period: fetch basal and active samples,
/// bucket each, merge into a total with addition, and materialize all three
/// as dense series. Provider failures propagate untouched.
pub async fn energy_report<P, Tz>(
    provider: &P,
    period: ChartPeriod,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<EnergyReport, ProviderError>
where
    P: EnergyProvider,
    Tz: TimeZone + Sync,
{
    let interval = period.interval(now, tz);
    let granularity = period.granularity();

    let basal_samples = provider.fetch_samples(EnergyKind::Basal, interval).await?;
    let active_samples = provider.fetch_samples(EnergyKind::Active, interval).await?;

    let basal_map = aggregate_samples(&basal_samples, interval, granularity, tz);
    let active_map = aggregate_samples(&active_samples, interval, granularity, tz);
    let total_map = merge_buckets(&basal_map, &active_map, |basal, active| basal + active);

    let basal = build_series(&basal_map, interval, granularity, tz);
    let active = build_series(&active_map, interval, granularity, tz);
    let total = build_series(&total_map, interval, granularity, tz);

    let meta = ReportMeta {
        generated_at: now.to_rfc3339(),
        version: crate::version(),
        period,
        granularity,
        range_start: total.points.first().map(|p| p.date),
        range_end: total.points.last().map(|p| p.date),
    };

    Ok(EnergyReport {
        meta,
        basal,
        active,
        total,
    })
}

/// Today's basal/active/total kcal, plus BMR and TDEE when a profile is
/// available.
pub async fn today_snapshot<P, Tz>(
    provider: &P,
    profile: Option<&UserProfile>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<TodaySnapshot, ProviderError>
where
    P: EnergyProvider,
    Tz: TimeZone + Sync,
{
    let basal_kcal = provider.fetch_today_total(EnergyKind::Basal, now, tz).await?;
    let active_kcal = provider.fetch_today_total(EnergyKind::Active, now, tz).await?;

    Ok(TodaySnapshot {
        date: now.with_timezone(tz).date_naive(),
        basal_kcal,
        active_kcal,
        total_kcal: basal_kcal + active_kcal,
        bmr: profile.map(UserProfile::bmr),
        tdee: profile.map(UserProfile::tdee),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SyntheticProvider;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn week_interval_spans_seven_day_buckets() {
        let now = utc(2025, 1, 8, 12);
        let interval = ChartPeriod::Week.interval(now, &Utc);
        assert_eq!(interval.start, utc(2025, 1, 2, 0));
        assert_eq!(interval.end, now);
        let count = crate::interval::periods(interval, Granularity::Day, &Utc).count();
        assert_eq!(count, 7);
    }

    #[test]
    fn period_granularity_policy() {
        assert_eq!(ChartPeriod::Week.granularity(), Granularity::Day);
        assert_eq!(ChartPeriod::Month.granularity(), Granularity::Day);
        assert_eq!(ChartPeriod::HalfYear.granularity(), Granularity::Month);
        assert_eq!(ChartPeriod::Year.granularity(), Granularity::Month);
    }

    #[tokio::test]
    async fn report_series_are_dense_and_aligned() {
        let provider = SyntheticProvider::default();
        let now = utc(2025, 3, 15, 18);
        let report = energy_report(&provider, ChartPeriod::Week, now, &Utc)
            .await
            .unwrap();

        assert_eq!(report.basal.points.len(), 7);
        assert_eq!(report.active.points.len(), 7);
        assert_eq!(report.total.points.len(), 7);

        for ((b, a), t) in report
            .basal
            .points
            .iter()
            .zip(&report.active.points)
            .zip(&report.total.points)
        {
            assert_eq!(b.date, a.date);
            assert_eq!(a.date, t.date);
            assert!((t.kcal - (b.kcal + a.kcal)).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn report_month_granularity_for_long_periods() {
        let provider = SyntheticProvider::default();
        let now = utc(2025, 6, 30, 12);
        let report = energy_report(&provider, ChartPeriod::HalfYear, now, &Utc)
            .await
            .unwrap();

        assert_eq!(report.meta.granularity, Granularity::Month);
        // 180 days back from Jun 30 lands on Jan 2, truncated to Jan 1.
        assert_eq!(report.total.points.len(), 6);
        assert!(report
            .total
            .points
            .windows(2)
            .all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn report_propagates_provider_failure() {
        let provider = SyntheticProvider {
            authorized: false,
            ..SyntheticProvider::default()
        };
        let err = energy_report(&provider, ChartPeriod::Week, utc(2025, 1, 8, 0), &Utc)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unauthorized));
    }

    #[tokio::test]
    async fn report_meta_covers_range() {
        let provider = SyntheticProvider::default();
        let now = utc(2025, 1, 8, 12);
        let report = energy_report(&provider, ChartPeriod::Week, now, &Utc)
            .await
            .unwrap();
        assert_eq!(
            report.meta.range_start,
            NaiveDate::from_ymd_opt(2025, 1, 2)
        );
        assert_eq!(report.meta.range_end, NaiveDate::from_ymd_opt(2025, 1, 8));
    }

    #[tokio::test]
    async fn report_serializes_camel_case() {
        let provider = SyntheticProvider::default();
        let report = energy_report(&provider, ChartPeriod::Week, utc(2025, 1, 8, 12), &Utc)
            .await
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["meta"]["generatedAt"].is_string());
        assert_eq!(json["meta"]["granularity"], "day");
        assert!(json["total"]["summary"]["totalKcal"].is_number());
        assert_eq!(json["basal"]["points"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn snapshot_includes_profile_metrics() {
        let provider = SyntheticProvider::default();
        let profile = UserProfile::default();
        let snapshot = today_snapshot(&provider, Some(&profile), utc(2025, 1, 5, 18), &Utc)
            .await
            .unwrap();

        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert!((snapshot.total_kcal - (snapshot.basal_kcal + snapshot.active_kcal)).abs() < 1e-9);
        assert_eq!(snapshot.bmr, Some(profile.bmr()));
        assert_eq!(snapshot.tdee, Some(profile.tdee()));
    }

    #[tokio::test]
    async fn snapshot_without_profile() {
        let provider = SyntheticProvider::default();
        let snapshot = today_snapshot(&provider, None, utc(2025, 1, 5, 18), &Utc)
            .await
            .unwrap();
        assert!(snapshot.bmr.is_none());
        assert!(snapshot.tdee.is_none());
    }
}
