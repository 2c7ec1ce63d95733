use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinates;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://ipapi.co/json/";
pub const DEFAULT_LANGUAGE: &str = "ro";
pub const DEFAULT_GEOLOCATION_TIMEOUT_SECS: u64 = 10;

/// Coordinates reported for this machine when no platform location service exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<DeviceConfig> for Coordinates {
    fn from(d: DeviceConfig) -> Self {
        Coordinates::new(d.latitude, d.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// language = "ro"
///
/// [device]
/// latitude = 46.77
/// longitude = 23.59
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeatherMap credential, sent as `appid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub language: String,
    pub weather_url: String,
    pub forecast_url: String,
    pub ip_lookup_url: String,
    pub geolocation_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            geolocation_timeout_secs: DEFAULT_GEOLOCATION_TIMEOUT_SECS,
            device: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation_timeout_secs)
    }

    /// Check the configuration before any request is made with it.
    pub fn validate(&self) -> Result<()> {
        let key = self.api_key().ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `meteo configure` and enter your OpenWeatherMap API key."
            )
        })?;
        ensure!(
            key.chars().all(|c| c.is_ascii_alphanumeric()),
            "API key contains invalid characters"
        );

        ensure!(
            !self.language.trim().is_empty(),
            "Language must not be empty"
        );
        ensure!(
            self.geolocation_timeout_secs > 0,
            "geolocation_timeout_secs must be greater than zero"
        );

        for (name, value) in [
            ("weather_url", &self.weather_url),
            ("forecast_url", &self.forecast_url),
            ("ip_lookup_url", &self.ip_lookup_url),
        ] {
            validate_endpoint(name, value)?;
        }

        if let Some(device) = self.device {
            ensure!(
                (-90.0..=90.0).contains(&device.latitude)
                    && (-180.0..=180.0).contains(&device.longitude),
                "Device coordinates out of range: {}, {}",
                device.latitude,
                device.longitude
            );
        }

        Ok(())
    }
}

fn validate_endpoint(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .with_context(|| format!("{name} is not an absolute URL: '{value}'"))?;

    ensure!(
        matches!(url.scheme(), "http" | "https"),
        "{name} must use http or https, got '{}'",
        url.scheme()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut cfg = Config::default();
        cfg.set_api_key("2ff3bc28465a836bdd80e8ae000e4a22".into());
        cfg
    }

    #[test]
    fn defaults_point_at_openweather() {
        let cfg = Config::default();
        assert_eq!(cfg.language, "ro");
        assert_eq!(cfg.forecast_url, DEFAULT_FORECAST_URL);
        assert_eq!(cfg.geolocation_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn validate_errors_when_api_key_missing() {
        let err = Config::default().validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `meteo configure`"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn validate_accepts_defaults_with_key() {
        valid().validate().expect("default endpoints with a key should be valid");
    }

    #[test]
    fn validate_rejects_scheme_less_endpoint() {
        let mut cfg = valid();
        cfg.forecast_url = "api.openweathermap.org/data/2.5/forecast".into();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("forecast_url"));
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let mut cfg = valid();
        cfg.ip_lookup_url = "ftp://ipapi.co/json/".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_odd_key_and_zero_timeout() {
        let mut cfg = valid();
        cfg.set_api_key("abc def".into());
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.geolocation_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_device() {
        let mut cfg = valid();
        cfg.device = Some(DeviceConfig {
            latitude: 123.0,
            longitude: 0.0,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg = Config::from_toml(
            r#"
            api_key = "KEY123"
            language = "en"

            [device]
            latitude = 46.77
            longitude = 23.59
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_key(), Some("KEY123"));
        assert_eq!(cfg.language, "en");
        assert_eq!(cfg.weather_url, DEFAULT_WEATHER_URL);
        let device = DeviceConfig {
            latitude: 46.77,
            longitude: 23.59,
        };
        assert_eq!(cfg.device, Some(device));
    }

    #[test]
    fn toml_round_trip() {
        let cfg = valid();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = Config::from_toml(&text).unwrap();
        assert_eq!(back.api_key(), cfg.api_key());
        assert_eq!(back.ip_lookup_url, cfg.ip_lookup_url);
    }
}
