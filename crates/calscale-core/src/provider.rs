//! The energy-sample provider boundary.
//!
//! In the shipping app this boundary fronts the platform health store; here
//! it is a trait plus two implementations: a deterministic synthetic source
//! and a decorator that derives basal energy from a user profile's BMR.

use crate::interval::{local_day_start, periods, DateInterval, Granularity};
use crate::profile::UserProfile;
use crate::EnergySample;
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which energy stream to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyKind {
    Basal,
    Active,
}

/// Opaque upstream failure. The aggregation engine itself never errors;
/// everything on the error path originates here.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("access to health data was not granted")]
    Unauthorized,
    #[error("health data provider is unavailable")]
    Unavailable,
    #[error("health data query failed: {0}")]
    Query(String),
}

#[allow(async_fn_in_trait)]
pub trait EnergyProvider {
    /// Fetch raw samples of `kind` whose timestamps fall within `interval`.
    async fn fetch_samples(
        &self,
        kind: EnergyKind,
        interval: DateInterval,
    ) -> Result<Vec<EnergySample>, ProviderError>;

    /// Sum of today's samples, where "today" is the local day of `now`.
    async fn fetch_today_total<Tz: TimeZone + Sync>(
        &self,
        kind: EnergyKind,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<f64, ProviderError> {
        let interval = DateInterval::new(local_day_start(now, tz), now);
        let samples = self.fetch_samples(kind, interval).await?;
        Ok(samples.iter().map(|s| s.kcal).sum())
    }
}

/// Deterministic sample generator: one sample per local day, a base level
/// plus a sine-of-epoch variation. The same interval always yields the same
/// data, which keeps the CLI output and tests stable.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    pub authorized: bool,
    pub basal_base: f64,
    pub active_base: f64,
    pub daily_variation: f64,
    pub tz: FixedOffset,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            authorized: true,
            basal_base: 1800.0,
            active_base: 600.0,
            daily_variation: 150.0,
            tz: Utc.fix(),
        }
    }
}

impl SyntheticProvider {
    fn day_sample(&self, interval: DateInterval, date: chrono::NaiveDate, base: f64) -> Option<EnergySample> {
        let midnight = self
            .tz
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .earliest()?
            .with_timezone(&Utc);
        // Noise keyed to the day start, so clamping the timestamp into the
        // interval does not change the value.
        let noise = ((midnight.timestamp() as f64) / 86_400.0).sin() * self.daily_variation;
        Some(EnergySample {
            timestamp: midnight.max(interval.start),
            kcal: (base + noise).max(0.0),
        })
    }
}

impl EnergyProvider for SyntheticProvider {
    async fn fetch_samples(
        &self,
        kind: EnergyKind,
        interval: DateInterval,
    ) -> Result<Vec<EnergySample>, ProviderError> {
        if !self.authorized {
            return Err(ProviderError::Unauthorized);
        }
        let base = match kind {
            EnergyKind::Basal => self.basal_base,
            EnergyKind::Active => self.active_base,
        };
        Ok(periods(interval, Granularity::Day, &self.tz)
            .filter_map(|date| self.day_sample(interval, date, base))
            .collect())
    }
}

/// Decorator that answers basal requests from the profile's BMR and
/// delegates active energy to the wrapped provider. Complete days report
/// the full BMR; the day containing the interval end is scaled by the
/// fraction of that day already elapsed.
#[derive(Debug, Clone)]
pub struct BmrProvider<P> {
    inner: P,
    profile: UserProfile,
    tz: FixedOffset,
}

impl<P> BmrProvider<P> {
    pub fn new(inner: P, profile: UserProfile, tz: FixedOffset) -> Self {
        Self { inner, profile, tz }
    }
}

impl<P: EnergyProvider> EnergyProvider for BmrProvider<P> {
    async fn fetch_samples(
        &self,
        kind: EnergyKind,
        interval: DateInterval,
    ) -> Result<Vec<EnergySample>, ProviderError> {
        if kind == EnergyKind::Active {
            return self.inner.fetch_samples(kind, interval).await;
        }

        let bmr = self.profile.bmr();
        let end_local = interval.end.with_timezone(&self.tz).naive_local();

        Ok(periods(interval, Granularity::Day, &self.tz)
            .filter_map(|date| {
                let midnight = self
                    .tz
                    .from_local_datetime(&date.and_time(NaiveTime::MIN))
                    .earliest()?
                    .with_timezone(&Utc);
                let kcal = if date == end_local.date() {
                    let elapsed = (end_local - date.and_time(NaiveTime::MIN)).num_seconds();
                    bmr * (elapsed as f64 / 86_400.0)
                } else {
                    bmr
                };
                Some(EnergySample {
                    timestamp: midnight.max(interval.start),
                    kcal,
                })
            })
            .collect())
    }
}
