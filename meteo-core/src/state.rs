use anyhow::{Context, Result};
use tracing::warn;

use crate::{history::RecentSearches, model::UnitSystem, storage::KeyValueStore};

pub const TEMPERATURE_UNIT_KEY: &str = "temperatureUnit";
pub const RECENT_SEARCHES_KEY: &str = "recentSearches";

/// User-facing state that survives between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub units: UnitSystem,
    pub recent: RecentSearches,
}

impl AppState {
    /// Read state from `store`. Unreadable or malformed entries fall back to
    /// their defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let units = match store.get(TEMPERATURE_UNIT_KEY) {
            Ok(Some(raw)) => raw.parse::<UnitSystem>().unwrap_or_else(|err| {
                warn!(%err, "ignoring stored temperature unit");
                UnitSystem::default()
            }),
            Ok(None) => UnitSystem::default(),
            Err(err) => {
                warn!(error = %err, "failed to read temperature unit");
                UnitSystem::default()
            }
        };

        let recent = match store.get(RECENT_SEARCHES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<RecentSearches>(&raw) {
                Ok(recent) => recent,
                Err(err) => {
                    warn!(%err, "ignoring malformed recent searches");
                    RecentSearches::default()
                }
            },
            Ok(None) => RecentSearches::default(),
            Err(err) => {
                warn!(error = %err, "failed to read recent searches");
                RecentSearches::default()
            }
        };

        Self { units, recent }
    }

    /// Put `city` at the head of the recent list and persist the list.
    pub fn record_search(&mut self, city: &str, store: &mut dyn KeyValueStore) -> Result<()> {
        self.recent.push(city);

        let json =
            serde_json::to_string(&self.recent).context("Failed to serialize recent searches")?;
        store.set(RECENT_SEARCHES_KEY, &json)
    }

    pub fn set_units(&mut self, units: UnitSystem, store: &mut dyn KeyValueStore) -> Result<()> {
        self.units = units;
        store.set(TEMPERATURE_UNIT_KEY, units.as_str())
    }
}
