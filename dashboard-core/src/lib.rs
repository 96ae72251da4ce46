//! Core library for the `weather-dashboard` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind a provider trait
//! - The dashboard session: searches, unit/theme switching, view state
//! - Text rendering of weather cards
//!
//! It is used by `dashboard-cli`, but any front end can drive a [`Dashboard`].

pub mod config;
pub mod dashboard;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod render;

pub use config::Config;
pub use dashboard::{Dashboard, SearchOutcome, SearchPhase, SessionView};
pub use error::SearchError;
pub use geolocation::{GeolocationError, Geolocator, StaticGeolocator};
pub use model::{
    Condition, Coordinates, ForecastEntry, ForecastTimeline, LocationQuery, Observation,
    ThemeMode, UnitSystem,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use render::{WeatherCard, render, render_dashboard};
