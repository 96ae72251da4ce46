use crate::{
    Config,
    model::{ForecastTimeline, LocationQuery, Observation, UnitSystem},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions and forecast timelines.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name or a coordinate pair.
    async fn current(
        &self,
        query: &LocationQuery,
        units: UnitSystem,
    ) -> anyhow::Result<Observation>;

    /// 5-day timeline of 3-hour samples for a city name.
    async fn forecast(&self, city: &str, units: UnitSystem) -> anyhow::Result<ForecastTimeline>;
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `weather-dashboard configure` and enter your OpenWeather API key."
        )
    })?;

    OpenWeatherProvider::new(api_key.to_owned(), &config.base_url, config.request_timeout())
}
