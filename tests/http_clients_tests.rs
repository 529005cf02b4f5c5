//! HTTP clients against a mock server

use wildweather::config::{GeolocationConfig, WeatherConfig};
use wildweather::geo::{
    ForwardGeocoder, GeocodeError, IpApiClient, IpGeolocationService, NominatimClient,
    OpenWeatherGeocoder, ReverseGeocoder,
};
use wildweather::weather::OpenWeatherClient;
use wildweather::{ApiError, Coordinate, UnitMode, WeatherApi, WeatherFetcher, WildWeatherError};

use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test_api_key_123";
const LONDON: Coordinate = Coordinate { lat: 51.5074, lon: -0.1278 };

fn weather_config(server: &MockServer) -> WeatherConfig {
    WeatherConfig {
        api_key: Some(API_KEY.to_string()),
        base_url: server.uri(),
        timeout_seconds: 5,
        max_retries: 0,
    }
}

fn geolocation_config(server: &MockServer) -> GeolocationConfig {
    GeolocationConfig {
        reverse_geocode_url: server.uri(),
        ip_lookup_url: server.uri(),
        user_agent: "WildWeatherTest/1.0".to_string(),
        timeout_seconds: 5,
        device_position: None,
    }
}

fn current_body() -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": -0.1278, "lat": 51.5074},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 68.4, "feels_like": 67.1, "pressure": 1021, "humidity": 45},
        "visibility": 9000,
        "wind": {"speed": 6.9, "deg": 200},
        "clouds": {"all": 3},
        "sys": {"country": "GB", "sunrise": 1700000000, "sunset": 1700036000},
        "name": "London"
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "cnt": 2,
        "list": [
            {"dt": 1704067200, "main": {"temp": 40.1, "pressure": 1019, "humidity": 80},
             "weather": [{"icon": "04n", "description": "overcast clouds"}],
             "clouds": {"all": 90}, "wind": {"speed": 8.0}, "visibility": 10000},
            {"dt": 1704078000, "main": {"temp": 39.2, "pressure": 1018, "humidity": 83},
             "weather": [{"icon": "10n", "description": "light rain"}],
             "clouds": {"all": 100}, "wind": {"speed": 9.1}}
        ]
    })
}

async fn mount_weather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("units", "imperial"))
        .and(query_param("appid", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_normalizes_both_payloads() {
    let server = MockServer::start().await;
    mount_weather(&server).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(&weather_config(&server), "WildWeatherTest/1.0").unwrap();
    let fetcher = WeatherFetcher::new(Arc::new(client));
    let report = fetcher.fetch(LONDON, UnitMode::Imperial).await.unwrap();

    assert_eq!(report.unit_mode, UnitMode::Imperial);
    assert_eq!(report.current.temperature, 68.4);
    assert_eq!(report.current.condition.description, "clear sky");
    assert_eq!(report.current.visibility_meters, 9000.0);
    assert_eq!(report.current.country_code, "GB");

    assert_eq!(report.hourly.len(), 2);
    assert_eq!(report.hourly[1].condition.icon, "10n");
    assert_eq!(report.hourly[1].clouds_pct, 100.0);
    assert_eq!(report.hourly[1].visibility_meters, 10_000.0);
}

#[tokio::test]
async fn test_one_failing_request_fails_the_whole_fetch() {
    let server = MockServer::start().await;
    mount_weather(&server).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(&weather_config(&server), "WildWeatherTest/1.0").unwrap();
    let err = WeatherFetcher::new(Arc::new(client))
        .fetch(LONDON, UnitMode::Imperial)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WildWeatherError::FetchFailed {
            source: ApiError::Network(_)
        }
    ));
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(&weather_config(&server), "WildWeatherTest/1.0").unwrap();
    assert_eq!(
        client.current_conditions(LONDON, UnitMode::Metric).await,
        Err(ApiError::InvalidKey)
    );
    assert_eq!(
        client.forecast(LONDON, UnitMode::Metric).await,
        Err(ApiError::RateLimited)
    );
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(&weather_config(&server), "WildWeatherTest/1.0").unwrap();
    let result = client.current_conditions(LONDON, UnitMode::Metric).await;
    assert!(matches!(result, Err(ApiError::Parse(_))));
}

#[tokio::test]
async fn test_current_by_name_returns_matched_coordinate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(&weather_config(&server), "WildWeatherTest/1.0").unwrap();
    let found = client
        .current_conditions_by_name("London", UnitMode::Metric)
        .await
        .unwrap();
    assert_eq!(found.coordinate, LONDON);
    assert_eq!(found.current.place_name, "London");
}

#[tokio::test]
async fn test_reverse_geocode_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .and(header("user-agent", "WildWeatherTest/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "display_name": "Westminster, London, Greater London, England, United Kingdom"
        })))
        .mount(&server)
        .await;

    let client = NominatimClient::new(&geolocation_config(&server)).unwrap();
    let place = client.reverse_geocode(LONDON).await.unwrap();
    assert!(place.starts_with("Westminster, London"));
}

#[tokio::test]
async fn test_reverse_geocode_error_payload_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"error": "Unable to geocode"})),
        )
        .mount(&server)
        .await;

    let client = NominatimClient::new(&geolocation_config(&server)).unwrap();
    assert_eq!(
        client.reverse_geocode(Coordinate { lat: 0.0, lon: -30.0 }).await,
        Err(GeocodeError::NotFound)
    );
}

#[tokio::test]
async fn test_ip_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ip": "192.0.2.1",
            "city": "Paris",
            "country": "FR",
            "country_name": "France",
            "latitude": 48.8566,
            "longitude": 2.3522
        })))
        .mount(&server)
        .await;

    let client = IpApiClient::new(&geolocation_config(&server)).unwrap();
    let found = client.locate().await.unwrap();
    assert_eq!(found.city, "Paris");
    assert_eq!(found.country, "FR");
    assert_eq!(found.coordinate, Coordinate { lat: 48.8566, lon: 2.3522 });
}

#[tokio::test]
async fn test_ip_lookup_refusal_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": true,
            "reason": "RateLimited"
        })))
        .mount(&server)
        .await;

    let client = IpApiClient::new(&geolocation_config(&server)).unwrap();
    assert!(matches!(client.locate().await, Err(GeocodeError::Network(_))));
}

#[tokio::test]
async fn test_forward_search_passes_limit_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "San José"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "San José", "lat": 9.9281, "lon": -84.0907, "country": "CR"},
            {"name": "San Jose", "lat": 37.3362, "lon": -121.8906, "country": "US", "state": "California"}
        ])))
        .mount(&server)
        .await;

    let geocoder = OpenWeatherGeocoder::new(&weather_config(&server), "WildWeatherTest/1.0").unwrap();
    let results = geocoder.search("San José", 5).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].label(), "San José, CR");
    assert_eq!(results[1].label(), "San Jose, California, US");
}
