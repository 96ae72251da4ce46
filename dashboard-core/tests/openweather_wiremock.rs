//! OpenWeather client and dashboard tests against a mock HTTP server.

use std::time::Duration;

use dashboard_core::{
    error::PROVIDER_ERROR_MESSAGE,
    Config, Coordinates, Dashboard, LocationQuery, OpenWeatherProvider, SearchOutcome,
    UnitSystem, WeatherProvider, render,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn current_body(name: &str, temp: f64) -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1257, "lat": 51.5085 },
        "weather": [
            { "id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d" }
        ],
        "base": "stations",
        "main": {
            "temp": temp,
            "feels_like": temp - 0.8,
            "temp_min": temp - 1.0,
            "temp_max": temp + 1.0,
            "pressure": 1012,
            "humidity": 60
        },
        "visibility": 10000,
        "wind": { "speed": 3.2, "deg": 240 },
        "clouds": { "all": 100 },
        "dt": 1_700_000_000,
        "sys": { "country": "GB", "sunrise": 1_699_946_000, "sunset": 1_699_978_000 },
        "timezone": 0,
        "id": 2_643_743,
        "name": name,
        "cod": 200
    })
}

fn forecast_body(name: &str, samples: usize) -> serde_json::Value {
    let list: Vec<_> = (0..samples)
        .map(|i| {
            serde_json::json!({
                "dt": 1_700_006_400 + (i as i64) * 10_800,
                "main": { "temp": 10.0 + i as f64 * 0.1, "feels_like": 9.0, "humidity": 70 },
                "weather": [
                    { "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }
                ],
                "wind": { "speed": 4.1, "deg": 200 },
                "dt_txt": "2023-11-15 00:00:00"
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": samples,
        "list": list,
        "city": { "id": 2_643_743, "name": name, "country": "GB", "timezone": 0 }
    })
}

fn create_test_client(mock_server: &MockServer) -> OpenWeatherProvider {
    #[allow(clippy::expect_used)]
    OpenWeatherProvider::new("TEST_KEY".into(), &mock_server.uri(), Duration::from_secs(5))
        .expect("Failed to create client")
}

async fn mount_city(mock_server: &MockServer, city: &str, units: &str) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", city))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", units))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(city, 15.3)))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", city))
        .and(query_param("units", units))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(city, 40)))
        .mount(mock_server)
        .await;
}

// ============================================================================
// Provider
// ============================================================================

#[tokio::test]
async fn test_current_by_city() {
    let mock_server = MockServer::start().await;
    mount_city(&mock_server, "London", "metric").await;

    let client = create_test_client(&mock_server);
    let obs = client
        .current(&LocationQuery::City("London".into()), UnitSystem::Metric)
        .await
        .expect("current weather");

    assert_eq!(obs.location_name.as_deref(), Some("London"));
    assert!((obs.temperature - 15.3).abs() < 1e-9);
    assert_eq!(obs.humidity_pct, 60);
    assert!((obs.wind_speed - 3.2).abs() < 1e-9);
    assert_eq!(obs.condition.description, "overcast clouds");
    assert_eq!(obs.condition.icon, "04d");
    assert_eq!(obs.timestamp.timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_current_by_coordinates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("London", 59.5)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let query = LocationQuery::Coordinates(Coordinates { latitude: 51.5, longitude: -0.12 });
    let obs = client.current(&query, UnitSystem::Imperial).await.expect("current weather");

    assert_eq!(obs.location_name.as_deref(), Some("London"));
}

#[tokio::test]
async fn test_forecast_timeline() {
    let mock_server = MockServer::start().await;
    mount_city(&mock_server, "London", "metric").await;

    let client = create_test_client(&mock_server);
    let timeline = client.forecast("London", UnitSystem::Metric).await.expect("forecast");

    assert_eq!(timeline.city.as_deref(), Some("London"));
    assert_eq!(timeline.samples.len(), 40);
    assert!(timeline.samples.iter().all(|s| s.location_name.is_none()));

    let days = timeline.daily_samples();
    assert_eq!(days.len(), 5);
    assert_eq!(days[1].timestamp.timestamp(), 1_700_006_400 + 8 * 10_800);
}

#[tokio::test]
async fn test_not_found_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client
        .current(&LocationQuery::City("Atlantis".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("404"), "unexpected error: {msg}");
    assert!(msg.contains("city not found"));
}

#[tokio::test]
async fn test_malformed_json_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.forecast("London", UnitSystem::Metric).await.unwrap_err();

    assert!(err.to_string().contains("Failed to parse OpenWeather forecast JSON"));
}

// ============================================================================
// Dashboard over HTTP
// ============================================================================

fn dashboard_for(mock_server: &MockServer, location: Option<Coordinates>) -> Dashboard {
    let mut config = Config::default().with_overrides(Some("TEST_KEY".into()), Some(mock_server.uri()));
    config.location = location;
    #[allow(clippy::expect_used)]
    Dashboard::from_config(&config).expect("dashboard")
}

#[tokio::test]
async fn test_dashboard_search_and_unit_switch() {
    let mock_server = MockServer::start().await;
    mount_city(&mock_server, "London", "metric").await;
    mount_city(&mock_server, "London", "imperial").await;

    let dash = dashboard_for(&mock_server, None);

    assert_eq!(dash.search_by_name("London").await, SearchOutcome::Applied);
    let view = dash.snapshot();
    let card = render(view.current().expect("current"), view.units(), false);
    assert_eq!(card.temperature, 15);
    assert_eq!(card.temperature_unit, "C");
    assert_eq!(card.wind_unit, "m/s");
    assert_eq!(view.forecast().len(), 5);

    assert_eq!(dash.set_unit_system(UnitSystem::Imperial).await, SearchOutcome::Applied);

    let requests = mock_server.received_requests().await.expect("recording enabled");
    let imperial = requests
        .iter()
        .filter(|r| r.url.query().is_some_and(|q| q.contains("units=imperial")))
        .count();
    assert_eq!(imperial, 2);
}

#[tokio::test]
async fn test_dashboard_server_error_sets_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dash = dashboard_for(&mock_server, None);

    assert_eq!(dash.search_by_name("London").await, SearchOutcome::Failed);
    let view = dash.snapshot();
    assert!(!view.is_loading());
    assert_eq!(view.error(), Some(PROVIDER_ERROR_MESSAGE));
    assert!(view.current().is_none());
}

/// Base URL of a local port nobody listens on.
fn unreachable_base_url() -> String {
    #[allow(clippy::expect_used)]
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    #[allow(clippy::expect_used)]
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn test_connection_refused_is_error() {
    #[allow(clippy::expect_used)]
    let client = OpenWeatherProvider::new("TEST_KEY".into(), &unreachable_base_url(), Duration::from_secs(5))
        .expect("Failed to create client");

    let err = client
        .current(&LocationQuery::City("London".into()), UnitSystem::Metric)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Failed to send request to OpenWeather"));
}

#[tokio::test]
async fn test_dashboard_network_failure_sets_message() {
    let config = Config::default().with_overrides(Some("TEST_KEY".into()), Some(unreachable_base_url()));
    #[allow(clippy::expect_used)]
    let dash = Dashboard::from_config(&config).expect("dashboard");

    assert_eq!(dash.search_by_name("London").await, SearchOutcome::Failed);

    let view = dash.snapshot();
    assert!(!view.is_loading());
    assert_eq!(view.error(), Some(PROVIDER_ERROR_MESSAGE));
    assert!(view.current().is_none());
    assert!(view.forecast().is_empty());
}

#[tokio::test]
async fn test_dashboard_location_search_resolves_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "51.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("London", 15.3)))
        .mount(&mock_server)
        .await;
    mount_city(&mock_server, "London", "metric").await;

    let dash = dashboard_for(
        &mock_server,
        Some(Coordinates { latitude: 51.5, longitude: -0.12 }),
    );

    assert_eq!(dash.search_by_location().await, SearchOutcome::Applied);
    let view = dash.snapshot();
    assert_eq!(view.location_name(), Some("London"));
    assert_eq!(view.forecast().len(), 5);
}
