//! Text rendering of observations and of the whole session.
//!
//! Pure functions: nothing here fetches or mutates state.

use std::fmt;

use chrono::{Local, NaiveDate};

use crate::{
    dashboard::SessionView,
    model::{Observation, UnitSystem},
};

/// Display-ready form of one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherCard {
    /// Local calendar date, forecast cards only.
    pub date: Option<NaiveDate>,
    pub location_name: String,
    pub temperature: i64,
    pub temperature_unit: &'static str,
    pub description: String,
    pub icon_url: String,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub wind_unit: &'static str,
}

pub fn render(observation: &Observation, units: UnitSystem, is_forecast: bool) -> WeatherCard {
    WeatherCard {
        date: is_forecast.then(|| observation.timestamp.with_timezone(&Local).date_naive()),
        location_name: observation.location_name.clone().unwrap_or_default(),
        temperature: round_half_up(observation.temperature),
        temperature_unit: units.temperature_label(),
        description: observation.condition.description.clone(),
        icon_url: observation.condition.icon_url(),
        humidity_pct: observation.humidity_pct,
        wind_speed: observation.wind_speed,
        wind_unit: units.wind_speed_label(),
    }
}

/// Calendar date shown on forecast cards, e.g. `11/14/2023`.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Nearest whole number, halves toward positive infinity (-2.5 → -2).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

impl fmt::Display for WeatherCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(date) = self.date {
            writeln!(f, "{}", date.format(DATE_FORMAT))?;
        }
        if !self.location_name.is_empty() {
            writeln!(f, "{}", self.location_name)?;
        }
        writeln!(f, "{}° {}", self.temperature, self.temperature_unit)?;
        writeln!(f, "{} ({})", self.description, self.icon_url)?;
        writeln!(f, "Humidity: {}%", self.humidity_pct)?;
        write!(f, "Wind: {} {}", self.wind_speed, self.wind_unit)
    }
}

/// Lay out the session: loading indicator, else error, else current
/// conditions followed by the daily forecast.
pub fn render_dashboard(view: &SessionView) -> String {
    if view.is_loading() {
        return "Loading...".to_string();
    }
    if let Some(error) = view.error() {
        return error.to_string();
    }
    let Some(current) = view.current() else {
        return String::new();
    };

    let mut out = render(current, view.units(), false).to_string();
    out.push_str("\n\n5-Day Forecast\n");
    for entry in view.forecast() {
        out.push('\n');
        out.push_str(&render(entry, view.units(), true).to_string());
        out.push('\n');
    }
    out
}
