use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{
    Condition, ForecastEntry, ForecastTimeline, LocationQuery, Observation, UnitSystem,
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base_url}/{endpoint}` and return the body of a 2xx response.
    async fn get(
        &self,
        endpoint: &str,
        location: Vec<(&'static str, String)>,
        units: UnitSystem,
    ) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut query = location;
        query.push(("appid", self.api_key.clone()));
        query.push(("units", units.as_str().to_string()));

        tracing::debug!(%url, %units, "requesting OpenWeather {endpoint}");

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({endpoint})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {endpoint} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                endpoint,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u32,
    main: String,
    description: String,
    icon: String,
}

impl From<OwWeather> for Condition {
    fn from(w: OwWeather) -> Self {
        Condition {
            id: w.id,
            main: w.main,
            description: w.description,
            icon: w.icon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}

fn observation(
    location_name: Option<String>,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
) -> Result<Observation> {
    let condition = weather
        .into_iter()
        .next()
        .map(Condition::from)
        .ok_or_else(|| anyhow!("OpenWeather response contained no weather condition"))?;

    let timestamp =
        unix_to_utc(dt).ok_or_else(|| anyhow!("OpenWeather timestamp {dt} is out of range"))?;

    Ok(Observation {
        location_name,
        temperature: main.temp,
        feels_like: main.feels_like,
        condition,
        humidity_pct: main.humidity,
        wind_speed: wind.speed,
        timestamp,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, query: &LocationQuery, units: UnitSystem) -> Result<Observation> {
        tracing::debug!(%query, "fetching current conditions");
        let body = self.get("weather", query.query_pairs(), units).await?;

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather current JSON")?;

        observation(Some(parsed.name), parsed.dt, parsed.main, parsed.weather, parsed.wind)
    }

    async fn forecast(&self, city: &str, units: UnitSystem) -> Result<ForecastTimeline> {
        let body = self.get("forecast", vec![("q", city.to_string())], units).await?;

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather forecast JSON")?;

        let samples = parsed
            .list
            .into_iter()
            .map(|e| observation(None, e.dt, e.main, e.weather, e.wind))
            .collect::<Result<Vec<ForecastEntry>>>()?;

        Ok(ForecastTimeline { city: parsed.city.map(|c| c.name), samples })
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("not found"), "not found");
    }

    #[test]
    fn truncate_body_cuts_on_char_boundary() {
        let body = "é".repeat(300);
        let out = truncate_body(&body);

        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }

    #[test]
    fn observation_requires_a_condition() {
        let err = observation(
            None,
            1_700_000_000,
            OwMain { temp: 1.0, feels_like: 0.0, humidity: 10 },
            vec![],
            OwWind { speed: 0.5 },
        )
        .unwrap_err();

        assert!(err.to_string().contains("no weather condition"));
    }
}
