use crate::{
    Config, FetchError, LocationDescriptor, UnitSystem, WeatherReport,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions plus forecast for `location`. Either both lookups
    /// succeed or the whole call fails.
    async fn get_weather(
        &self,
        location: &LocationDescriptor,
        units: UnitSystem,
    ) -> Result<WeatherReport, FetchError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    config.validate()?;
    Ok(Box::new(OpenWeatherProvider::from_config(config)?))
}

/// URL of the provider's icon image for `icon` at `size`x resolution (1, 2 or 4).
pub fn icon_url(icon: &str, size: u8) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@{size}x.png")
}

/// GET `url` and decode a JSON body. A non-2xx status, transport failure or
/// undecodable body all fail with the URL attached.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &Client,
    url: &Url,
) -> Result<T, FetchError> {
    debug!(url = %redact(url), "GET");

    let res = http.get(url.clone()).send().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| FetchError::Parse {
        url: url.to_string(),
        body,
        source,
    })
}

// Logged URLs must not leak the credential.
fn redact(url: &Url) -> Url {
    let mut out = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    if !pairs.is_empty() {
        out.query_pairs_mut().clear().extend_pairs(pairs);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(provider_from_config(&cfg).is_ok());
    }

    #[test]
    fn provider_from_config_rejects_bad_endpoint() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());
        cfg.forecast_url = "api.openweathermap.org/data/2.5/forecast".into();

        assert!(provider_from_config(&cfg).is_err());
    }

    #[test]
    fn icon_url_format() {
        assert_eq!(
            icon_url("10d", 4),
            "https://openweathermap.org/img/wn/10d@4x.png"
        );
    }

    #[test]
    fn redact_hides_credential() {
        let url = Url::parse("https://example.test/weather?q=Cluj&appid=SECRET").unwrap();
        let shown = redact(&url).to_string();
        assert!(!shown.contains("SECRET"));
        assert!(shown.contains("q=Cluj"));
    }
}
