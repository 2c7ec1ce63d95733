use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A place to query the weather provider with.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationDescriptor {
    City { name: String },
    Coordinates(Coordinates),
}

impl LocationDescriptor {
    pub fn city(name: impl Into<String>) -> Self {
        LocationDescriptor::City { name: name.into() }
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        LocationDescriptor::Coordinates(Coordinates::new(latitude, longitude))
    }
}

impl fmt::Display for LocationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationDescriptor::City { name } => f.write_str(name),
            LocationDescriptor::Coordinates(c) => {
                write!(f, "{:.4}, {:.4}", c.latitude, c.longitude)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_speed_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// Current conditions at a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Canonical city name as reported by the provider.
    pub city_name: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// Offset from UTC in seconds.
    pub timezone_offset: i32,
    pub observation_time: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// The location's UTC offset, or UTC when the provider sent something out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub time: DateTime<Utc>,
    pub temperature: f64,
}

/// 3-hour forecast samples in chronological order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub samples: Vec<ForecastSample>,
}

impl ForecastSeries {
    pub fn new(samples: Vec<ForecastSample>) -> Self {
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Combined result of one weather lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub forecast: ForecastSeries,
}
