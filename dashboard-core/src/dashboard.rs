//! Weather query orchestration.
//!
//! [`Dashboard`] owns the session view state and is the only thing that
//! mutates it. Every user action maps to one method; the presentation layer
//! reads a cloned [`SessionView`] via [`Dashboard::snapshot`].
//!
//! Searches may overlap. Each one takes a generation number when it starts
//! and its completion is applied only if no newer search has started since,
//! so the most recently *issued* search decides what is displayed.

use std::time::Duration;

use parking_lot::Mutex;

use crate::{
    Config,
    error::SearchError,
    geolocation::{GeolocationError, Geolocator, StaticGeolocator},
    model::{ForecastEntry, LocationQuery, Observation, ThemeMode, UnitSystem},
    provider::{WeatherProvider, provider_from_config},
};

/// Lifecycle of the most recent search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// What happened to a requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results were stored in the session.
    Applied,
    /// The error message was stored in the session.
    Failed,
    /// A newer search started before this one completed; nothing was stored.
    Superseded,
    /// Nothing to do (no geolocation capability, unit unchanged, nothing loaded).
    Skipped,
}

/// Read-only copy of the session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    current: Option<Observation>,
    forecast: Vec<ForecastEntry>,
    loading: bool,
    error: Option<String>,
    units: UnitSystem,
    theme: ThemeMode,
    phase: SearchPhase,
}

impl SessionView {
    pub fn current(&self) -> Option<&Observation> {
        self.current.as_ref()
    }

    pub fn forecast(&self) -> &[ForecastEntry] {
        &self.forecast
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Name of the currently displayed location, used to re-fetch on unit change.
    pub fn location_name(&self) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|c| c.location_name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Default)]
struct Session {
    view: SessionView,
    generation: u64,
    /// City of the newest name search still in flight.
    pending_city: Option<String>,
}

/// Identifies one started search.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    generation: u64,
    units: UnitSystem,
}

#[derive(Debug)]
pub struct Dashboard {
    provider: Box<dyn WeatherProvider>,
    geolocator: Option<Box<dyn Geolocator>>,
    geolocation_timeout: Duration,
    session: Mutex<Session>,
}

impl Dashboard {
    pub fn new(provider: Box<dyn WeatherProvider>, units: UnitSystem) -> Self {
        let mut session = Session::default();
        session.view.units = units;

        Self {
            provider,
            geolocator: None,
            geolocation_timeout: Duration::from_secs(10),
            session: Mutex::new(session),
        }
    }

    pub fn with_geolocator(mut self, geolocator: Box<dyn Geolocator>, timeout: Duration) -> Self {
        self.geolocator = Some(geolocator);
        self.geolocation_timeout = timeout;
        self
    }

    /// Build a dashboard backed by OpenWeather, with the configured home
    /// position (if any) as the geolocation capability.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let dashboard = Self::new(Box::new(provider), config.units);

        Ok(match StaticGeolocator::from_option(config.location) {
            Some(geo) => dashboard.with_geolocator(Box::new(geo), config.geolocation_timeout()),
            None => dashboard,
        })
    }

    pub fn snapshot(&self) -> SessionView {
        self.session.lock().view.clone()
    }

    /// Search current conditions and the daily forecast for a city.
    pub async fn search_by_name(&self, city: &str) -> SearchOutcome {
        let city = city.trim();
        if city.is_empty() {
            return self.reject(SearchError::InvalidInput);
        }

        let ticket = self.begin(Some(city));
        self.fetch_city(ticket, city).await
    }

    /// Resolve the device position to a city, then search that city.
    ///
    /// A no-op when no geolocation capability is available.
    pub async fn search_by_location(&self) -> SearchOutcome {
        let Some(geolocator) = self.geolocator.as_deref() else {
            tracing::debug!("geolocation capability not available, ignoring location search");
            return SearchOutcome::Skipped;
        };

        let ticket = self.begin(None);

        let position =
            match tokio::time::timeout(self.geolocation_timeout, geolocator.current_position())
                .await
            {
                Ok(Ok(position)) => position,
                Ok(Err(e)) => return self.fail(ticket, SearchError::Location(e.into())),
                Err(_) => {
                    return self.fail(ticket, SearchError::Location(GeolocationError::Timeout.into()));
                }
            };

        let observation = match self
            .provider
            .current(&LocationQuery::Coordinates(position), ticket.units)
            .await
        {
            Ok(observation) => observation,
            Err(e) => return self.fail(ticket, SearchError::Location(e)),
        };

        let Some(name) = observation.location_name.clone().filter(|n| !n.trim().is_empty()) else {
            return self.fail(
                ticket,
                SearchError::Location(anyhow::anyhow!(
                    "provider returned no location name for {position:?}"
                )),
            );
        };

        {
            let mut session = self.session.lock();
            if session.generation != ticket.generation {
                tracing::debug!(generation = ticket.generation, "discarding stale location result");
                return SearchOutcome::Superseded;
            }
            // Shown while the forecast loads; the name search below replaces it.
            if session.view.units == ticket.units {
                session.view.current = Some(observation);
            }
        }

        tracing::info!(latitude = position.latitude, longitude = position.longitude, %name, "resolved location");
        self.search_by_name(&name).await
    }

    /// Switch units. A loaded location is fetched again under the new unit
    /// system rather than converted locally.
    pub async fn set_unit_system(&self, units: UnitSystem) -> SearchOutcome {
        let target = {
            let mut session = self.session.lock();
            if session.view.units == units {
                return SearchOutcome::Skipped;
            }
            session.view.units = units;
            session
                .pending_city
                .clone()
                .or_else(|| session.view.location_name().map(str::to_owned))
        };

        match target {
            Some(city) => {
                tracing::info!(%units, %city, "unit system changed, re-fetching");
                self.search_by_name(&city).await
            }
            None => SearchOutcome::Skipped,
        }
    }

    pub async fn toggle_unit_system(&self) -> SearchOutcome {
        let units = self.session.lock().view.units.toggled();
        self.set_unit_system(units).await
    }

    pub fn toggle_theme(&self) -> ThemeMode {
        let mut session = self.session.lock();
        session.view.theme = session.view.theme.toggled();
        session.view.theme
    }

    async fn fetch_city(&self, ticket: Ticket, city: &str) -> SearchOutcome {
        let query = LocationQuery::City(city.to_owned());

        let (current, forecast) = tokio::join!(
            self.provider.current(&query, ticket.units),
            self.provider.forecast(city, ticket.units),
        );

        match current.and_then(|c| forecast.map(|f| (c, f))) {
            Ok((current, timeline)) => {
                let forecast = timeline.daily_samples();
                tracing::info!(
                    city,
                    resolved = timeline.city.as_deref().unwrap_or(city),
                    units = %ticket.units,
                    raw_samples = timeline.samples.len(),
                    days = forecast.len(),
                    "weather loaded"
                );
                self.complete(ticket, current, forecast)
            }
            Err(e) => self.fail(ticket, SearchError::Provider(e)),
        }
    }

    fn begin(&self, city: Option<&str>) -> Ticket {
        let mut session = self.session.lock();
        session.generation += 1;
        session.pending_city = city.map(str::to_owned);
        session.view.loading = true;
        session.view.error = None;
        session.view.phase = SearchPhase::Loading;

        Ticket { generation: session.generation, units: session.view.units }
    }

    fn complete(
        &self,
        ticket: Ticket,
        current: Observation,
        forecast: Vec<ForecastEntry>,
    ) -> SearchOutcome {
        let mut session = self.session.lock();
        if session.generation != ticket.generation {
            tracing::debug!(generation = ticket.generation, "discarding stale weather result");
            return SearchOutcome::Superseded;
        }

        session.pending_city = None;
        session.view.current = Some(current);
        session.view.forecast = forecast;
        session.view.loading = false;
        session.view.error = None;
        session.view.phase = SearchPhase::Success;
        SearchOutcome::Applied
    }

    fn fail(&self, ticket: Ticket, error: SearchError) -> SearchOutcome {
        let mut session = self.session.lock();
        if session.generation != ticket.generation {
            tracing::debug!(generation = ticket.generation, %error, "discarding stale failure");
            return SearchOutcome::Superseded;
        }

        tracing::warn!(%error, "search failed");
        session.pending_city = None;
        session.view.loading = false;
        session.view.error = Some(error.user_message().to_string());
        session.view.phase = SearchPhase::Error;
        SearchOutcome::Failed
    }

    /// Local validation failure: no request is issued and an in-flight
    /// search keeps running.
    fn reject(&self, error: SearchError) -> SearchOutcome {
        let mut session = self.session.lock();
        session.view.error = Some(error.user_message().to_string());
        if !session.view.loading {
            session.view.phase = SearchPhase::Error;
        }
        SearchOutcome::Failed
    }
}
