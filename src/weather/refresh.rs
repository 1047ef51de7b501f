//! Background forecast refresh.
//!
//! One long-lived task owns the refresh interval and the current city. Every
//! range fetch runs in its own task stamped with a generation number; the
//! receiving side keeps only results newer than the last one it applied, so a
//! slow response for an old city can never overwrite a newer one.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sample::WeatherSample;
use super::service::WeatherService;
use crate::calendar::date_key::weather_date_range;
use crate::calendar::DateKey;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
enum Command {
    Refresh,
    SetCity(String),
    Day(NaiveDate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherUpdate {
    /// Samples for the upcoming forecast window.
    Forecast {
        generation: u64,
        city: String,
        samples: BTreeMap<DateKey, WeatherSample>,
    },
    /// Answer to [`WeatherRefresher::request_day`].
    Day {
        city: String,
        key: DateKey,
        sample: Option<WeatherSample>,
    },
    /// No API key; no fetches will be made.
    Unconfigured,
}

pub struct WeatherRefresher {
    commands: mpsc::UnboundedSender<Command>,
    updates: mpsc::UnboundedReceiver<WeatherUpdate>,
    /// City of the most recent `spawn`/`set_city`; results for any other are stale.
    city: String,
    applied_generation: u64,
    stale_discarded: u64,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl WeatherRefresher {
    /// Start refreshing immediately and then every `interval`. Must be called
    /// inside a tokio runtime.
    pub fn spawn(service: Arc<WeatherService>, city: impl Into<String>, interval: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let city = city.into();

        let worker = RefreshWorker {
            service,
            city: city.clone(),
            generation: 0,
            updates: update_tx,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker.run(command_rx, interval));

        Self {
            commands: command_tx,
            updates: update_rx,
            city,
            applied_generation: 0,
            stale_discarded: 0,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Switch city; drops cached samples and refetches right away.
    pub fn set_city(&mut self, city: impl Into<String>) {
        self.city = city.into();
        self.send(Command::SetCity(self.city.clone()));
    }

    pub fn request_day(&self, date: NaiveDate) {
        self.send(Command::Day(date));
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            debug!(command = ?e.0, "weather refresher is not running");
        }
    }

    /// Pass an update through the city and generation gates.
    fn admit(&mut self, update: &WeatherUpdate) -> bool {
        let fresh = match update {
            WeatherUpdate::Forecast { generation, city, .. } => {
                let fresh = *city == self.city && *generation > self.applied_generation;
                if fresh {
                    self.applied_generation = *generation;
                }
                fresh
            }
            WeatherUpdate::Day { city, .. } => *city == self.city,
            WeatherUpdate::Unconfigured => true,
        };
        if !fresh {
            self.stale_discarded += 1;
            debug!(
                applied = self.applied_generation,
                city = %self.city,
                "discarding stale weather update"
            );
        }
        fresh
    }

    /// Next pending update without waiting.
    pub fn try_next(&mut self) -> Option<WeatherUpdate> {
        while let Ok(update) = self.updates.try_recv() {
            if self.admit(&update) {
                return Some(update);
            }
        }
        None
    }

    /// Wait for the next update. `None` once the worker has shut down.
    pub async fn next_update(&mut self) -> Option<WeatherUpdate> {
        while let Some(update) = self.updates.recv().await {
            if self.admit(&update) {
                return Some(update);
            }
        }
        None
    }

    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "weather refresher task ended abnormally");
            }
        }
        info!("weather refresher stopped");
    }
}

impl Drop for WeatherRefresher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct RefreshWorker {
    service: Arc<WeatherService>,
    city: String,
    generation: u64,
    updates: mpsc::UnboundedSender<WeatherUpdate>,
    cancel: CancellationToken,
}

impl RefreshWorker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, interval: Duration) {
        if !self.service.is_configured() {
            warn!("weather disabled: no API key configured");
            let _ = self.updates.send(WeatherUpdate::Unconfigured);
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("weather refresher cancelled");
                    break;
                }
                _ = ticker.tick() => self.spawn_range_fetch(),
                command = commands.recv() => match command {
                    None => break,
                    Some(Command::Refresh) => self.spawn_range_fetch(),
                    Some(Command::SetCity(city)) => {
                        info!(%city, "weather city changed");
                        self.city = city;
                        self.service.clear_cache();
                        ticker.reset();
                        self.spawn_range_fetch();
                    }
                    Some(Command::Day(date)) => self.spawn_day_fetch(date),
                },
            }
        }
    }

    fn spawn_range_fetch(&mut self) {
        if !self.service.is_configured() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let service = self.service.clone();
        let updates = self.updates.clone();
        let cancel = self.cancel.clone();
        let city = self.city.clone();

        tokio::spawn(async move {
            let dates = weather_date_range(service.today());
            tokio::select! {
                _ = cancel.cancelled() => {}
                samples = service.samples_for_dates(&dates, &city) => {
                    debug!(generation, %city, days = samples.len(), "forecast ready");
                    let city = city.clone();
                    let _ = updates.send(WeatherUpdate::Forecast { generation, city, samples });
                }
            }
        });
    }

    fn spawn_day_fetch(&self, date: NaiveDate) {
        let service = self.service.clone();
        let updates = self.updates.clone();
        let cancel = self.cancel.clone();
        let city = self.city.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                sample = service.daily_sample(date, &city) => {
                    let key = DateKey::new(date);
                    let city = city.clone();
                    let _ = updates.send(WeatherUpdate::Day { city, key, sample });
                }
            }
        });
    }
}
