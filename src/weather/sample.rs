use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Local, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::DateKey;

pub const DEFAULT_ICON: &str = "🌤️";

const WEATHER_ICONS: [(&str, &str); 9] = [
    ("Clear", "☀️"),
    ("Clouds", "☁️"),
    ("Rain", "🌧️"),
    ("Drizzle", "🌦️"),
    ("Thunderstorm", "⛈️"),
    ("Snow", "❄️"),
    ("Mist", "🌫️"),
    ("Fog", "🌫️"),
    ("Haze", "🌫️"),
];

/// Glyph for a coarse condition such as `"Rain"`; unknown conditions get
/// [`DEFAULT_ICON`].
pub fn icon_for(condition: &str) -> &'static str {
    WEATHER_ICONS
        .iter()
        .find(|(name, _)| *name == condition)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

/// One representative forecast reading for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSample {
    pub temp: i32,
    pub temp_min: i32,
    pub temp_max: i32,
    pub feels_like: i32,
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub humidity: i32,
    pub wind_speed: i32,
    /// Local hour of the reading, only used to pick the sample nearest noon.
    #[serde(skip)]
    pub hour: u32,
}

// ── Provider response ──

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Conditions>,
    #[serde(default)]
    pub wind: Wind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub feels_like: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conditions {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

/// Timezone used to turn forecast timestamps into calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForecastZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl ForecastZone {
    pub fn utc() -> Self {
        ForecastZone::Fixed(Utc.fix())
    }

    /// Calendar day and hour of `instant` in this zone.
    pub fn day_and_hour(&self, instant: DateTime<Utc>) -> (DateKey, u32) {
        match self {
            ForecastZone::Local => {
                let local = instant.with_timezone(&Local);
                (DateKey::from_datetime(&local), local.hour())
            }
            ForecastZone::Fixed(offset) => {
                let shifted = instant.with_timezone(offset);
                (DateKey::from_datetime(&shifted), shifted.hour())
            }
        }
    }
}

/// JavaScript-style rounding: halves go up, so -2.5 becomes -2.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

impl ForecastItem {
    fn to_sample(&self, hour: u32) -> WeatherSample {
        let conditions = self.weather.first().cloned().unwrap_or_default();
        WeatherSample {
            temp: round_half_up(self.main.temp),
            temp_min: round_half_up(self.main.temp_min),
            temp_max: round_half_up(self.main.temp_max),
            feels_like: round_half_up(self.main.feels_like),
            icon: icon_for(&conditions.main).to_string(),
            condition: conditions.main,
            description: conditions.description,
            humidity: round_half_up(self.main.humidity),
            wind_speed: round_half_up(self.wind.speed),
            hour,
        }
    }
}

/// Reduce 3-hourly forecast items to one sample per day: the one whose hour
/// is closest to noon. Only a strictly closer reading replaces the current
/// pick, so the first of two equally close readings wins.
pub fn select_daily_samples(
    items: &[ForecastItem],
    zone: &ForecastZone,
) -> BTreeMap<DateKey, WeatherSample> {
    let mut days: BTreeMap<DateKey, WeatherSample> = BTreeMap::new();

    for item in items {
        let Some(instant) = DateTime::from_timestamp(item.dt, 0) else {
            continue;
        };
        let (key, hour) = zone.day_and_hour(instant);

        let closer = days
            .get(&key)
            .map_or(true, |current| hour.abs_diff(12) < current.hour.abs_diff(12));
        if closer {
            days.insert(key, item.to_sample(hour));
        }
    }

    days
}
