use thiserror::Error;

pub const INVALID_INPUT_MESSAGE: &str = "Please enter a city name.";
pub const PROVIDER_ERROR_MESSAGE: &str = "City not found or API error.";
pub const LOCATION_ERROR_MESSAGE: &str = "Location error or API error.";

/// Failures at the dashboard boundary. Each kind collapses into one
/// user-visible message; the source is only logged.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("empty city name")]
    InvalidInput,

    #[error("weather provider request failed: {0:#}")]
    Provider(#[source] anyhow::Error),

    #[error("location lookup failed: {0:#}")]
    Location(#[source] anyhow::Error),
}

impl SearchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::InvalidInput => INVALID_INPUT_MESSAGE,
            SearchError::Provider(_) => PROVIDER_ERROR_MESSAGE,
            SearchError::Location(_) => LOCATION_ERROR_MESSAGE,
        }
    }
}
