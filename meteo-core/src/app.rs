use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    analyzer::{self, TemperatureVisualization},
    error::AppError,
    history::RecentSearches,
    location::{
        DeviceLocator, IpLocator, LocationResolver, PositionOptions, request_device_location,
    },
    model::{LocationDescriptor, UnitSystem, WeatherReport},
    provider::WeatherProvider,
    state::AppState,
    storage::KeyValueStore,
};

/// Everything the presentation layer needs for one lookup.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherView {
    pub report: WeatherReport,
    pub visualization: Option<TemperatureVisualization>,
    pub units: UnitSystem,
}

/// Owns the persisted state and the collaborators, and handles user intents.
#[derive(Debug)]
pub struct WeatherApp {
    provider: Arc<dyn WeatherProvider>,
    device: Arc<dyn DeviceLocator>,
    ip: Arc<dyn IpLocator>,
    store: Box<dyn KeyValueStore>,
    position_options: PositionOptions,
    state: AppState,
}

impl WeatherApp {
    /// Load persisted state from `store` and wire up the collaborators.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        device: Arc<dyn DeviceLocator>,
        ip: Arc<dyn IpLocator>,
        store: Box<dyn KeyValueStore>,
        position_options: PositionOptions,
    ) -> Self {
        let state = AppState::load(&*store);
        Self {
            provider,
            device,
            ip,
            store,
            position_options,
            state,
        }
    }

    pub fn units(&self) -> UnitSystem {
        self.state.units
    }

    pub fn recent_searches(&self) -> &RecentSearches {
        &self.state.recent
    }

    /// Startup display: resolve a location through the fallback chain and
    /// show its weather. `Ok(None)` when no location could be found.
    pub async fn show_initial(&mut self) -> Result<Option<WeatherView>, AppError> {
        let resolver = LocationResolver::standard(
            &self.state.recent,
            self.device.clone(),
            self.ip.clone(),
            self.position_options,
        );

        match resolver.resolve().await {
            Some(location) => self.display(&location).await.map(Some),
            None => {
                info!("no location available, nothing to show");
                Ok(None)
            }
        }
    }

    /// Look up the weather for a city typed by the user.
    pub async fn search(&mut self, input: &str) -> Result<WeatherView, AppError> {
        let city = input.trim();
        if city.is_empty() {
            return Err(AppError::Validation("city name is empty".into()));
        }

        self.display(&LocationDescriptor::city(city)).await
    }

    /// Explicit "use my location" request. Unlike startup resolution, a
    /// geolocation failure here is reported to the caller.
    pub async fn locate_device(&mut self) -> Result<WeatherView, AppError> {
        let coordinates =
            request_device_location(self.device.as_ref(), self.position_options).await?;

        self.display(&LocationDescriptor::Coordinates(coordinates)).await
    }

    pub fn set_units(&mut self, units: UnitSystem) -> Result<(), AppError> {
        self.state.set_units(units, &mut *self.store)?;
        Ok(())
    }

    pub fn toggle_units(&mut self) -> Result<UnitSystem, AppError> {
        let units = self.state.units.toggled();
        self.set_units(units)?;
        Ok(units)
    }

    /// Fetch, then record the provider's canonical city name in the history.
    pub async fn display(
        &mut self,
        location: &LocationDescriptor,
    ) -> Result<WeatherView, AppError> {
        let report = self.provider.get_weather(location, self.state.units).await?;

        let city = &report.snapshot.city_name;
        if let Err(err) = self.state.record_search(city, &mut *self.store) {
            warn!(error = %err, "failed to persist recent searches");
        }

        let visualization = analyzer::visualize_report(&report);
        Ok(WeatherView {
            report,
            visualization,
            units: self.state.units,
        })
    }
}
