use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of 3-hour samples per day in the provider's forecast timeline.
pub const SAMPLES_PER_DAY: usize = 8;

/// Unit system requested from the provider.
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

    pub fn temperature_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "C",
            UnitSystem::Imperial => "F",
        }
    }

    pub fn wind_speed_label(&self) -> &'static str {
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
            "metric" | "c" | "celsius" => Ok(UnitSystem::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeMode::Light => f.write_str("light"),
            ThemeMode::Dark => f.write_str("dark"),
        }
    }
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What a single fetch is keyed on.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

impl LocationQuery {
    /// Query parameters selecting the location on the provider side.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            LocationQuery::City(name) => vec![("q", name.clone())],
            LocationQuery::Coordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
        }
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::City(name) => f.write_str(name),
            LocationQuery::Coordinates(c) => write!(f, "({}, {})", c.latitude, c.longitude),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Condition {
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@2x.png", self.icon)
    }
}

/// One weather sample, either current conditions or a forecast slot.
///
/// Temperatures and wind speed are in whatever unit system the request used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Present for current conditions; forecast slots carry no name.
    pub location_name: Option<String>,
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: Condition,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub timestamp: DateTime<Utc>,
}

/// A forecast slot has the same shape as current conditions; its `timestamp`
/// identifies the slot.
pub type ForecastEntry = Observation;

/// Raw forecast timeline as returned by the provider (3-hour samples).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTimeline {
    pub city: Option<String>,
    pub samples: Vec<ForecastEntry>,
}

impl ForecastTimeline {
    pub fn daily_samples(&self) -> Vec<ForecastEntry> {
        daily_samples(&self.samples)
    }
}

/// Pick one sample per day: every 8th entry starting with the first,
/// keeping chronological order.
pub fn daily_samples(samples: &[ForecastEntry]) -> Vec<ForecastEntry> {
    samples.iter().step_by(SAMPLES_PER_DAY).cloned().collect()
}
