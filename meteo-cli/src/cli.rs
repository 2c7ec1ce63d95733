use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use meteo_core::{
    AppError, Config, FileStore, KeyValueStore, PositionOptions, UnitSystem, WeatherApp,
    WeatherView,
    location::{IpApiLocator, device_from_config},
    provider::provider_from_config,
    state::AppState,
};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Weather lookup")]
pub struct Cli {
    /// OpenWeatherMap API key; overrides the configured one.
    #[arg(long, env = "METEO_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `show`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show weather for the last searched city, or for the current location.
    Show,

    /// Show weather for a city.
    Search {
        /// City name, e.g. "Cluj-Napoca".
        city: String,
    },

    /// Show weather for the device location.
    Locate,

    /// Set the unit system, or toggle it when none is given, then refresh.
    Units {
        /// "metric" or "imperial".
        units: Option<UnitSystem>,
    },

    /// List recent searches, most recent first.
    Recent,

    /// Interactively set the API key and response language.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let api_key = self.api_key;

        match self.command.unwrap_or(Command::Show) {
            Command::Configure => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Recent => {
                let store = FileStore::open_default()?;
                let state = AppState::load(&store);
                print!("{}", render::render_recent(&state.recent));
                Ok(ExitCode::SUCCESS)
            }
            Command::Show => {
                let mut app = build_app(api_key)?;
                match app.show_initial().await {
                    Ok(Some(view)) => Ok(print_view(&view)),
                    Ok(None) => {
                        println!(
                            "Nicio locație disponibilă. Încercați `meteo search <oraș>`."
                        );
                        Ok(ExitCode::SUCCESS)
                    }
                    Err(err) => Ok(report_error(&err)),
                }
            }
            Command::Search { city } => {
                let mut app = build_app(api_key)?;
                Ok(finish(app.search(&city).await))
            }
            Command::Locate => {
                let mut app = build_app(api_key)?;
                Ok(finish(app.locate_device().await))
            }
            Command::Units { units } => {
                let mut store = FileStore::open_default()?;
                let units = apply_units(&mut store, units)?;
                println!("Unități: {units}");

                // The preference is already saved; a missing key only blocks the refresh.
                let mut app = match build_app(api_key) {
                    Ok(app) => app,
                    Err(err) => {
                        debug!(error = %err, "skipping refresh after unit change");
                        eprintln!("Afișarea nu a putut fi actualizată: {err:#}");
                        return Ok(ExitCode::FAILURE);
                    }
                };

                match app.show_initial().await {
                    Ok(Some(view)) => Ok(print_view(&view)),
                    Ok(None) => Ok(ExitCode::SUCCESS),
                    Err(err) => Ok(report_error(&err)),
                }
            }
        }
    }
}

/// Persist `units`, or the opposite of the stored unit when `None`.
fn apply_units(
    store: &mut dyn KeyValueStore,
    units: Option<UnitSystem>,
) -> anyhow::Result<UnitSystem> {
    let mut state = AppState::load(&*store);
    let units = units.unwrap_or_else(|| state.units.toggled());
    state.set_units(units, store)?;
    Ok(units)
}

fn build_app(api_key: Option<String>) -> anyhow::Result<WeatherApp> {
    let mut config = Config::load()?;
    if let Some(key) = api_key {
        config.set_api_key(key);
    }

    let provider = provider_from_config(&config)?;
    let ip = IpApiLocator::from_config(&config)?;
    let store = FileStore::open_default().context("Failed to open local state")?;
    debug!(path = %store.path().display(), "opened local state");

    Ok(WeatherApp::new(
        Arc::from(provider),
        device_from_config(&config),
        Arc::new(ip),
        Box::new(store),
        PositionOptions::with_timeout(config.geolocation_timeout()),
    ))
}

fn finish(result: Result<WeatherView, AppError>) -> ExitCode {
    match result {
        Ok(view) => print_view(&view),
        Err(err) => report_error(&err),
    }
}

fn print_view(view: &WeatherView) -> ExitCode {
    print!("{}", render::render_view(view));
    ExitCode::SUCCESS
}

fn report_error(err: &AppError) -> ExitCode {
    debug!(error = %err, "request failed");
    eprintln!("{}", err.user_message());
    ExitCode::FAILURE
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    config.set_api_key(api_key);

    let language = Text::new("Response language:")
        .with_default(&config.language)
        .prompt()?;
    config.language = language.trim().to_string();

    config.validate()?;
    config.save()?;

    let path = Config::config_file_path()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
