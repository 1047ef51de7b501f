//! Date keys and month-grid arithmetic.
//!
//! Everything here works on local calendar days. Time of day and UTC offsets
//! never reach a [`DateKey`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CalendarError;

pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Number of days (starting today) the weather provider covers.
pub const WEATHER_RANGE_DAYS: u64 = 5;

const KEY_FORMAT: &str = "%Y-%m-%d";

/// Canonical `YYYY-MM-DD` key of a local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Key of the calendar day `dt` falls on in its own timezone.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self(dt.date_naive())
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), KEY_FORMAT)
            .map(Self)
            .map_err(|_| CalendarError::Parse(format!("Invalid date key '{s}'. Expected YYYY-MM-DD")))
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Shorthand for `DateKey::new(date)`.
pub fn date_key(date: NaiveDate) -> DateKey {
    DateKey::new(date)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .map(|next| (next - first).num_days() as u32)
        .unwrap_or(31)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date) + Days::new(u64::from(days_in_month(date)) - 1)
}

/// Every day shown by a Sunday-first month grid for `anchor`'s month.
///
/// Starts on the Sunday on or before the 1st and ends on the Saturday on or
/// after the last day, so the length is always a multiple of 7.
pub fn calendar_days(anchor: NaiveDate) -> Vec<NaiveDate> {
    let first = first_of_month(anchor);
    let last = last_of_month(anchor);

    let lead = u64::from(first.weekday().num_days_from_sunday());
    let trail = 6 - u64::from(last.weekday().num_days_from_sunday());

    let start = first.checked_sub_days(Days::new(lead)).unwrap_or(first);
    let end = last.checked_add_days(Days::new(trail)).unwrap_or(last);

    start.iter_days().take_while(|d| *d <= end).collect()
}

pub fn is_in_current_month(date: NaiveDate, anchor: NaiveDate) -> bool {
    date.year() == anchor.year() && date.month() == anchor.month()
}

pub fn is_same_day(date: NaiveDate, other: NaiveDate) -> bool {
    date == other
}

pub fn is_today(date: NaiveDate) -> bool {
    is_same_day(date, Local::now().date_naive())
}

/// Shift by whole months, clamping to the last valid day of the target month.
pub fn month_shift(date: NaiveDate, delta_months: i32) -> NaiveDate {
    let months = Months::new(delta_months.unsigned_abs());
    let shifted = if delta_months >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    };
    shifted.unwrap_or(date)
}

/// The days the forecast is requested for: today and the following four.
pub fn weather_date_range(today: NaiveDate) -> Vec<NaiveDate> {
    today.iter_days().take(WEATHER_RANGE_DAYS as usize).collect()
}

pub fn is_in_weather_range(date: NaiveDate, today: NaiveDate) -> bool {
    let horizon = today
        .checked_add_days(Days::new(WEATHER_RANGE_DAYS))
        .unwrap_or(today);
    date >= today && date <= horizon
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

pub fn month_title(date: NaiveDate) -> String {
    format!("{} {}", month_name(date.month()), date.year())
}
