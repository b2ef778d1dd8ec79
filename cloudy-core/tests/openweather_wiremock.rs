//! OpenWeather client behaviour against a mock HTTP server.

use cloudy_core::{
    LocationFix, Units, WeatherError, WeatherProvider, WeatherRequest,
    provider::OpenWeatherProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn sample_response() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": 13.405, "lat": 52.52 },
        "weather": [
            { "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" },
            { "id": 701, "main": "Mist", "description": "mist", "icon": "50d" }
        ],
        "base": "stations",
        "main": {
            "temp": 5.5,
            "feels_like": 2.1,
            "temp_min": 3.9,
            "temp_max": 7.2,
            "pressure": 1013,
            "humidity": 75
        },
        "visibility": 10000,
        "wind": { "speed": 4.1, "deg": 230 },
        "clouds": { "all": 75 },
        "dt": 1705320000,
        "sys": { "country": "DE", "sunrise": 1705302900, "sunset": 1705336200 },
        "timezone": 3600,
        "id": 2950159,
        "name": "Berlin",
        "cod": 200
    })
}

fn provider(server: &MockServer, units: Units) -> OpenWeatherProvider {
    OpenWeatherProvider::new("TEST_KEY".into(), server.uri(), units)
}

#[tokio::test]
async fn place_query_sends_name_credential_and_units() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Berlin"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
        .expect(1)
        .mount(&server)
        .await;

    let reading = provider(&server, Units::Metric)
        .get_weather(&WeatherRequest::Place("Berlin".into()))
        .await
        .expect("request should succeed");

    assert_eq!(reading.place_name, "Berlin");
    assert!((reading.temperature - 5.5).abs() < f64::EPSILON);
    assert!((reading.temperature_min - 3.9).abs() < f64::EPSILON);
    assert!((reading.temperature_max - 7.2).abs() < f64::EPSILON);
    assert_eq!(reading.humidity_pct, 75);
    assert!((reading.pressure_hpa - 1013.0).abs() < f64::EPSILON);
    assert!((reading.wind_speed - 4.1).abs() < f64::EPSILON);
    assert_eq!(reading.sunrise, 1_705_302_900);
    assert_eq!(reading.sunset, 1_705_336_200);
    assert_eq!(reading.condition.as_deref(), Some("Clouds"));
    assert_eq!(reading.observed_at.timestamp(), 1_705_320_000);
}

#[tokio::test]
async fn coordinate_query_sends_lat_lon() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.405"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
        .expect(1)
        .mount(&server)
        .await;

    let reading = provider(&server, Units::Imperial)
        .get_weather(&WeatherRequest::Coordinates(LocationFix::new(52.52, 13.405)))
        .await
        .expect("request should succeed");

    assert_eq!(reading.place_name, "Berlin");
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
        )
        .mount(&server)
        .await;

    let err = provider(&server, Units::Metric)
        .get_weather(&WeatherRequest::Place("Atlantis".into()))
        .await
        .unwrap_err();

    match err {
        WeatherError::Status { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert!(body.contains("city not found"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_a_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = provider(&server, Units::Metric)
        .get_weather(&WeatherRequest::Place("Berlin".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Status { status, .. } if status.as_u16() == 401));
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = provider(&server, Units::Metric)
        .get_weather(&WeatherRequest::Place("Berlin".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Nothing listens on a port we bound and released.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("bind ephemeral port")
        .port();

    let provider = OpenWeatherProvider::new(
        "TEST_KEY".into(),
        format!("http://127.0.0.1:{port}"),
        Units::Metric,
    );
    let err = provider
        .get_weather(&WeatherRequest::Place("Berlin".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Transport(_)));
}
