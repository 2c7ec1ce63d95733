//! Location resolution.
//!
//! A [`LocationResolver`] walks an ordered list of [`LocationStrategy`]s and
//! returns the first descriptor one of them produces. Failures of individual
//! strategies are logged and swallowed; an exhausted list resolves to `None`.
//!
//! The standard order is: most recent search, device geolocation, IP lookup.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tracing::{debug, info};

use crate::{
    Config,
    error::LocationError,
    history::RecentSearches,
    model::{Coordinates, LocationDescriptor},
    provider::fetch_json,
};

/// Options passed to the device location service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub timeout: Duration,
    pub high_accuracy: bool,
}

impl PositionOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            high_accuracy: true,
        }
    }
}

/// Platform location service.
#[async_trait]
pub trait DeviceLocator: Send + Sync + Debug {
    async fn locate(&self, options: PositionOptions) -> Result<Coordinates, LocationError>;
}

/// Approximate location derived from the public IP address.
#[async_trait]
pub trait IpLocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Host without any location service.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDevice;

#[async_trait]
impl DeviceLocator for UnsupportedDevice {
    async fn locate(&self, _options: PositionOptions) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Reports a fixed, configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedDeviceLocator {
    coordinates: Coordinates,
}

impl FixedDeviceLocator {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl DeviceLocator for FixedDeviceLocator {
    async fn locate(&self, _options: PositionOptions) -> Result<Coordinates, LocationError> {
        Ok(self.coordinates)
    }
}

/// Device back end for this host: the configured fix if there is one.
pub fn device_from_config(config: &Config) -> Arc<dyn DeviceLocator> {
    match config.device {
        Some(device) => Arc::new(FixedDeviceLocator::new(device.into())),
        None => Arc::new(UnsupportedDevice),
    }
}

/// Ask `locator` for a position, giving up after `options.timeout`.
pub async fn request_device_location(
    locator: &dyn DeviceLocator,
    options: PositionOptions,
) -> Result<Coordinates, LocationError> {
    tokio::time::timeout(options.timeout, locator.locate(options))
        .await
        .map_err(|_| LocationError::Timeout(options.timeout))?
}

/// IP geolocation against an ipapi.co-compatible JSON endpoint.
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    url: Url,
    http: Client,
}

impl IpApiLocator {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let url = Url::parse(&config.ip_lookup_url).context("Invalid ip_lookup_url")?;
        Ok(Self::new(url))
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: f64,
    longitude: f64,
}

#[async_trait]
impl IpLocator for IpApiLocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let parsed: IpApiResponse = fetch_json(&self.http, &self.url).await?;
        Ok(Coordinates::new(parsed.latitude, parsed.longitude))
    }
}

/// One way of finding out where the user is.
#[async_trait]
pub trait LocationStrategy: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    async fn attempt(&self) -> Result<LocationDescriptor, LocationError>;
}

/// Reuse the most recently searched city. Never touches the network.
#[derive(Debug, Clone)]
pub struct RecentSearchStrategy {
    city: Option<String>,
}

impl RecentSearchStrategy {
    pub fn new(recent: &RecentSearches) -> Self {
        Self {
            city: recent.most_recent().map(str::to_string),
        }
    }
}

#[async_trait]
impl LocationStrategy for RecentSearchStrategy {
    fn name(&self) -> &'static str {
        "recent search"
    }

    async fn attempt(&self) -> Result<LocationDescriptor, LocationError> {
        self.city
            .as_ref()
            .map(|city| LocationDescriptor::city(city.clone()))
            .ok_or(LocationError::NoRecentSearch)
    }
}

#[derive(Debug, Clone)]
pub struct DeviceStrategy {
    locator: Arc<dyn DeviceLocator>,
    options: PositionOptions,
}

impl DeviceStrategy {
    pub fn new(locator: Arc<dyn DeviceLocator>, options: PositionOptions) -> Self {
        Self { locator, options }
    }
}

#[async_trait]
impl LocationStrategy for DeviceStrategy {
    fn name(&self) -> &'static str {
        "device geolocation"
    }

    async fn attempt(&self) -> Result<LocationDescriptor, LocationError> {
        let coordinates = request_device_location(self.locator.as_ref(), self.options).await?;
        Ok(LocationDescriptor::Coordinates(coordinates))
    }
}

#[derive(Debug, Clone)]
pub struct IpStrategy {
    locator: Arc<dyn IpLocator>,
}

impl IpStrategy {
    pub fn new(locator: Arc<dyn IpLocator>) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl LocationStrategy for IpStrategy {
    fn name(&self) -> &'static str {
        "IP geolocation"
    }

    async fn attempt(&self) -> Result<LocationDescriptor, LocationError> {
        let coordinates = self.locator.locate().await?;
        Ok(LocationDescriptor::Coordinates(coordinates))
    }
}

#[derive(Debug, Default)]
pub struct LocationResolver {
    strategies: Vec<Box<dyn LocationStrategy>>,
}

impl LocationResolver {
    pub fn new(strategies: Vec<Box<dyn LocationStrategy>>) -> Self {
        Self { strategies }
    }

    /// Recent search, then device geolocation, then IP lookup.
    pub fn standard(
        recent: &RecentSearches,
        device: Arc<dyn DeviceLocator>,
        ip: Arc<dyn IpLocator>,
        options: PositionOptions,
    ) -> Self {
        let strategies: Vec<Box<dyn LocationStrategy>> = vec![
            Box::new(RecentSearchStrategy::new(recent)),
            Box::new(DeviceStrategy::new(device, options)),
            Box::new(IpStrategy::new(ip)),
        ];
        Self::new(strategies)
    }

    /// Try each strategy in order, stopping at the first success.
    pub async fn resolve(&self) -> Option<LocationDescriptor> {
        for strategy in &self.strategies {
            match strategy.attempt().await {
                Ok(location) => {
                    info!(strategy = strategy.name(), %location, "location resolved");
                    return Some(location);
                }
                Err(err) => {
                    debug!(strategy = strategy.name(), error = %err, "location strategy failed");
                }
            }
        }

        info!("all location strategies failed");
        None
    }
}
