//! Core library for the `meteo` weather lookup tool.
//!
//! This crate defines:
//! - Configuration & persisted local state
//! - Location resolution (recent search, device, IP fallback chain)
//! - The weather provider abstraction and its OpenWeatherMap client
//! - Temperature range and visualization math
//!
//! It is used by `meteo-cli`, but can also be reused by other front ends.

pub mod analyzer;
pub mod app;
pub mod config;
pub mod error;
pub mod history;
pub mod location;
pub mod model;
pub mod provider;
pub mod state;
pub mod storage;

pub use analyzer::{TemperatureRange, TemperatureVisualization, daily_range, visualize};
pub use app::{WeatherApp, WeatherView};
pub use config::Config;
pub use error::{AppError, FetchError, LocationError};
pub use history::{MAX_RECENT_SEARCHES, RecentSearches};
pub use location::{LocationResolver, PositionOptions};
pub use model::{
    Coordinates, ForecastSample, ForecastSeries, LocationDescriptor, UnitSystem, WeatherReport,
    WeatherSnapshot,
};
pub use provider::WeatherProvider;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
