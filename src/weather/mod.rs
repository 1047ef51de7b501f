//! Daily forecasts from OpenWeatherMap, cached and refreshed in the background.

pub mod cache;
pub mod client;
pub mod refresh;
pub mod sample;
pub mod service;

pub use cache::SystemClock;
pub use client::{ForecastProvider, OpenWeatherClient};
pub use refresh::{WeatherRefresher, WeatherUpdate};
pub use sample::WeatherSample;
pub use service::WeatherService;
