use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::sample::WeatherSample;
use crate::calendar::DateKey;

pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    sample: WeatherSample,
    fetched_at: DateTime<Utc>,
}

/// Entries are per city, so a slow fetch for a city the user has since left
/// can only ever fill that city's slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    city: String,
    day: DateKey,
}

impl CacheKey {
    fn new(city: &str, day: DateKey) -> Self {
        Self {
            city: city.trim().to_lowercase(),
            day,
        }
    }
}

/// Per-city, per-day weather samples with a time-to-live.
pub struct WeatherCache {
    entries: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl WeatherCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            clock,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.fetched_at) < self.ttl
    }

    /// Cached sample for `city` on `day` if it is younger than the TTL.
    pub fn get(&self, city: &str, day: DateKey) -> Option<&WeatherSample> {
        let now = self.clock.now();
        self.entries
            .get(&CacheKey::new(city, day))
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| &entry.sample)
    }

    pub fn insert(&mut self, city: &str, day: DateKey, sample: WeatherSample) {
        let fetched_at = self.clock.now();
        self.entries
            .insert(CacheKey::new(city, day), CacheEntry { sample, fetched_at });
    }

    pub fn insert_all(
        &mut self,
        city: &str,
        samples: impl IntoIterator<Item = (DateKey, WeatherSample)>,
    ) {
        let fetched_at = self.clock.now();
        for (day, sample) in samples {
            self.entries
                .insert(CacheKey::new(city, day), CacheEntry { sample, fetched_at });
        }
    }

    /// Drop expired entries; returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.signed_duration_since(entry.fetched_at) < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Clock that only moves when told to.
#[cfg(test)]
pub(crate) struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: std::sync::Mutex::new(now),
        })
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample(temp: i32) -> WeatherSample {
        WeatherSample {
            temp,
            temp_min: temp - 2,
            temp_max: temp + 2,
            feels_like: temp,
            condition: "Clear".into(),
            description: "clear sky".into(),
            icon: "☀️".into(),
            humidity: 40,
            wind_speed: 2,
            hour: 12,
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let clock = ManualClock::at(start());
        let mut cache = WeatherCache::new(clock.clone());
        let key: DateKey = "2024-03-05".parse().unwrap();
        cache.insert("London", key, sample(10));

        clock.advance(Duration::minutes(29));
        assert_eq!(cache.get("London", key).map(|s| s.temp), Some(10));

        clock.advance(Duration::minutes(2));
        assert!(cache.get("London", key).is_none());
        // Still stored until pruned
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.prune(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_exact_ttl_is_stale() {
        let clock = ManualClock::at(start());
        let mut cache = WeatherCache::new(clock.clone()).with_ttl(Duration::minutes(5));
        let key: DateKey = "2024-03-05".parse().unwrap();
        cache.insert("London", key, sample(3));

        clock.advance(Duration::minutes(5));
        assert!(cache.get("London", key).is_none());
    }

    #[test]
    fn test_insert_all_stamps_every_entry() {
        let clock = ManualClock::at(start());
        let mut cache = WeatherCache::new(clock.clone());
        let days: Vec<DateKey> = ["2024-03-05", "2024-03-06", "2024-03-07"]
            .iter()
            .map(|d| d.parse().unwrap())
            .collect();
        cache.insert_all("London", days.iter().map(|k| (*k, sample(1))));

        clock.advance(Duration::minutes(10));
        let refreshed: DateKey = "2024-03-08".parse().unwrap();
        cache.insert("London", refreshed, sample(2));

        clock.advance(Duration::minutes(25));
        assert_eq!(cache.prune(), 3);
        assert!(cache.get("London", refreshed).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cities_do_not_share_entries() {
        let clock = ManualClock::at(start());
        let mut cache = WeatherCache::new(clock);
        let key: DateKey = "2024-03-07".parse().unwrap();
        cache.insert("Slowtown", key, sample(1));

        assert!(cache.get("Fastville", key).is_none());
        assert_eq!(cache.get(" slowtown ", key).map(|s| s.temp), Some(1));

        cache.insert("Fastville", key, sample(2));
        assert_eq!(cache.get("Fastville", key).map(|s| s.temp), Some(2));
        assert_eq!(cache.get("Slowtown", key).map(|s| s.temp), Some(1));
        assert_eq!(cache.len(), 2);
    }
}
