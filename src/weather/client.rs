use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::sample::ForecastResponse;
use crate::config::WeatherConfig;
use crate::error::{CalendarError, CalendarResult};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Placeholder left in sample config files; treated the same as no key.
const PLACEHOLDER_KEY: &str = "your_api_key_here";

/// Source of multi-day forecasts.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Fetch the raw 3-hourly forecast for `city`.
    async fn fetch_forecast(&self, city: &str) -> CalendarResult<ForecastResponse>;
}

/// OpenWeatherMap 5 day / 3 hour forecast client.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> CalendarResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CalendarError::Provider(format!("Could not build HTTP client: {e}")))?;

        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_KEY);

        Ok(Self {
            http,
            api_key,
            base_url: OPENWEATHER_BASE_URL.to_string(),
        })
    }

    pub fn from_config(config: &WeatherConfig) -> CalendarResult<Self> {
        Ok(Self::new(config.api_key.clone(), Duration::from_secs(config.timeout_secs))?
            .with_base_url(&config.base_url))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_forecast(&self, city: &str) -> CalendarResult<ForecastResponse> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CalendarError::Provider("Weather API key not configured".into()));
        };

        let url = format!("{}/forecast", self.base_url);
        debug!(%url, city, "requesting forecast");

        let response = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| CalendarError::Provider(format!("Weather request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::Provider(format!("Weather API error: {status}")));
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Provider(format!("Invalid forecast payload: {e}")))?;

        info!(city, items = forecast.list.len(), "forecast fetched");
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(key: Option<&str>, server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::new(key.map(String::from), Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri())
    }

    fn forecast_body() -> serde_json::Value {
        serde_json::json!({
            "list": [{
                "dt": 1709640000,
                "main": {"temp": 8.4, "temp_min": 6.0, "temp_max": 10.2, "feels_like": 5.5, "humidity": 71},
                "weather": [{"main": "Rain", "description": "light rain"}],
                "wind": {"speed": 4.1}
            }]
        })
    }

    #[tokio::test]
    async fn test_fetch_forecast_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "secret"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&server)
            .await;

        let forecast = client(Some("secret"), &server).fetch_forecast("London").await.unwrap();
        assert_eq!(forecast.list.len(), 1);
        assert_eq!(forecast.list[0].weather[0].main, "Rain");
    }

    #[tokio::test]
    async fn test_error_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let result = client(Some("bad"), &server).fetch_forecast("London").await;
        match result {
            Err(CalendarError::Provider(msg)) => assert!(msg.contains("401")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let result = client(Some("secret"), &server).fetch_forecast("London").await;
        assert!(matches!(result, Err(CalendarError::Provider(_))));
    }

    #[tokio::test]
    async fn test_missing_or_placeholder_key_never_hits_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(0)
            .mount(&server)
            .await;

        for key in [None, Some(""), Some("your_api_key_here")] {
            let client = client(key, &server);
            assert!(!client.is_configured());
            assert!(client.fetch_forecast("London").await.is_err());
        }
    }
}
