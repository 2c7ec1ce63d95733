use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::info;

use crate::{
    Config, FetchError,
    model::{
        ForecastSample, ForecastSeries, LocationDescriptor, UnitSystem, WeatherReport,
        WeatherSnapshot,
    },
};

use super::{WeatherProvider, fetch_json};

/// OpenWeatherMap "current weather" + "5 day / 3 hour forecast" client.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    language: String,
    weather_url: Url,
    forecast_url: Url,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, language: String, weather_url: Url, forecast_url: Url) -> Self {
        Self {
            api_key,
            language,
            weather_url,
            forecast_url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config
            .api_key()
            .context("No API key configured for OpenWeather")?
            .to_string();
        let weather_url = Url::parse(&config.weather_url).context("Invalid weather_url")?;
        let forecast_url = Url::parse(&config.forecast_url).context("Invalid forecast_url")?;

        let language = config.language.clone();
        Ok(Self::new(api_key, language, weather_url, forecast_url))
    }

    /// Both endpoints take the same parameters: the location, then `units`,
    /// `lang` and the `appid` credential.
    pub fn build_url(&self, base: &Url, location: &LocationDescriptor, units: UnitSystem) -> Url {
        let mut url = base.clone();
        {
            let mut query = url.query_pairs_mut();
            match location {
                LocationDescriptor::City { name } => {
                    query.append_pair("q", name);
                }
                LocationDescriptor::Coordinates(c) => {
                    query
                        .append_pair("lat", &c.latitude.to_string())
                        .append_pair("lon", &c.longitude.to_string());
                }
            }
            query
                .append_pair("units", units.as_str())
                .append_pair("lang", &self.language)
                .append_pair("appid", &self.api_key);
        }
        url
    }

    async fn fetch_current(
        &self,
        location: &LocationDescriptor,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, FetchError> {
        let url = self.build_url(&self.weather_url, location, units);
        let parsed: OwCurrentResponse = fetch_json(&self.http, &url).await?;

        let (description, icon) = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

        Ok(WeatherSnapshot {
            city_name: parsed.name,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            temp_min: parsed.main.temp_min,
            temp_max: parsed.main.temp_max,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            wind_speed: parsed.wind.speed,
            description,
            icon,
            sunrise: unix_to_utc(parsed.sys.sunrise),
            sunset: unix_to_utc(parsed.sys.sunset),
            timezone_offset: parsed.timezone,
            observation_time: unix_to_utc(parsed.dt),
        })
    }

    async fn fetch_forecast(
        &self,
        location: &LocationDescriptor,
        units: UnitSystem,
    ) -> Result<ForecastSeries, FetchError> {
        let url = self.build_url(&self.forecast_url, location, units);
        let parsed: OwForecastResponse = fetch_json(&self.http, &url).await?;

        let samples = parsed
            .list
            .into_iter()
            .map(|entry| ForecastSample {
                time: unix_to_utc(entry.dt),
                temperature: entry.main.temp,
            })
            .collect();

        Ok(ForecastSeries::new(samples))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(
        &self,
        location: &LocationDescriptor,
        units: UnitSystem,
    ) -> Result<WeatherReport, FetchError> {
        info!(%location, %units, "fetching weather");

        let snapshot = self.fetch_current(location, units).await?;
        let forecast = self.fetch_forecast(location, units).await?;

        Ok(WeatherReport { snapshot, forecast })
    }
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
