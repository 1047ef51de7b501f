use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, NaiveDate};
use tracing::warn;

use super::cache::{Clock, WeatherCache};
use super::client::ForecastProvider;
use super::sample::{select_daily_samples, ForecastZone, WeatherSample};
use crate::calendar::DateKey;

/// Forecast lookups backed by a TTL cache.
///
/// Provider failures never escape: they are logged and surface as missing
/// samples.
pub struct WeatherService {
    provider: Arc<dyn ForecastProvider>,
    cache: Mutex<WeatherCache>,
    zone: ForecastZone,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn ForecastProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            cache: Mutex::new(WeatherCache::new(clock)),
            zone: ForecastZone::Local,
        }
    }

    pub fn with_ttl(self, ttl: Duration) -> Self {
        let cache = self.cache.into_inner().unwrap_or_else(PoisonError::into_inner);
        Self {
            cache: Mutex::new(cache.with_ttl(ttl)),
            ..self
        }
    }

    pub fn with_zone(mut self, zone: ForecastZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    fn cache(&self) -> MutexGuard<'_, WeatherCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Today's date according to the service clock and zone.
    pub fn today(&self) -> NaiveDate {
        let now = self.cache().now();
        self.zone.day_and_hour(now).0.date()
    }

    async fn try_forecast(&self, city: &str) -> Option<BTreeMap<DateKey, WeatherSample>> {
        if !self.provider.is_configured() {
            warn!("Weather API key not configured");
            return None;
        }
        match self.provider.fetch_forecast(city).await {
            Ok(response) => Some(select_daily_samples(&response.list, &self.zone)),
            Err(e) => {
                warn!(city, error = %e, "forecast fetch failed");
                None
            }
        }
    }

    /// One sample per forecast day. Empty when unconfigured or on failure.
    pub async fn forecast(&self, city: &str) -> BTreeMap<DateKey, WeatherSample> {
        self.try_forecast(city).await.unwrap_or_default()
    }

    /// Sample for a single day, served from cache while fresh.
    pub async fn daily_sample(&self, date: NaiveDate, city: &str) -> Option<WeatherSample> {
        let key = DateKey::new(date);
        let cached = self.cache().get(city, key).cloned();
        if cached.is_some() {
            return cached;
        }

        let forecast = self.try_forecast(city).await?;
        let mut cache = self.cache();
        cache.prune();
        cache.insert_all(city, forecast.iter().map(|(k, s)| (*k, s.clone())));
        forecast.get(&key).cloned()
    }

    /// Samples for the requested dates that the forecast covers, from one
    /// provider call.
    pub async fn samples_for_dates(
        &self,
        dates: &[NaiveDate],
        city: &str,
    ) -> BTreeMap<DateKey, WeatherSample> {
        let forecast = self.forecast(city).await;
        dates
            .iter()
            .filter_map(|date| {
                let key = DateKey::new(*date);
                forecast.get(&key).map(|s| (key, s.clone()))
            })
            .collect()
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cached_days(&self) -> usize {
        self.cache().len()
    }
}
