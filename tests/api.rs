mod common;

use axum::http::HeaderMap;
use common::{hub, FakeSource};
use meteohub::{router, ApiState, HubConfig, MeteoHub, RequestGate, StationRegistry};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(state: ApiState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn get(url: String) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_out_of_range_hours_are_rejected_before_upstream() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider)
        .await;
    let config = HubConfig::builder().upstream_url(provider.uri()).build();
    let base = serve(ApiState::new(Arc::new(MeteoHub::new(config).unwrap()))).await;

    for hours in ["0", "200"] {
        let (status, body) = get(format!("{}/api/stations/10104/history?hours={}", base, hours)).await;
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains(hours));
    }
}

#[tokio::test]
async fn test_current_total_failure_is_a_soft_warning() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stations/10104/observations/latest"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&provider)
        .await;
    let config = HubConfig::builder()
        .upstream_url(provider.uri())
        .request_timeout(Duration::from_secs(2))
        .build();
    let base = serve(ApiState::new(Arc::new(MeteoHub::new(config).unwrap()))).await;

    let (status, body) = get(format!("{}/api/stations/10104/current", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], Value::Null);
    assert!(body["warning"].as_str().unwrap().contains("502"));
}

#[tokio::test]
async fn test_current_end_to_end_through_provider() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stations/10162/observations/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stationId": 10162,
            "observations": [{
                "observationTimeUtc": "2024-05-01T12:00:00Z",
                "airTemperature": 14.5,
                "seaLevelPressurePa": 101325,
                "uvIndex": null
            }]
        })))
        .expect(1)
        .mount(&provider)
        .await;
    let config = HubConfig::builder().upstream_url(provider.uri()).build();
    let base = serve(ApiState::new(Arc::new(MeteoHub::new(config).unwrap()))).await;

    // The second call is served from the cache.
    for _ in 0..2 {
        let (status, body) = get(format!(
            "{}/api/stations/10162/current?variables=air_temperature,sea_level_pressure",
            base
        ))
        .await;
        assert_eq!(status, 200);
        let series = body["data"]["series"].as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["parameterCode"], "air_temperature");
        assert_eq!(series[0]["points"][0]["value"], 14.5);
        assert_eq!(series[1]["unit"], "hPa");
        assert_eq!(series[1]["points"][0]["value"], 1013.25);
    }
}

#[tokio::test]
async fn test_validation_errors() {
    let source = Arc::new(FakeSource::default());
    let base = serve(ApiState::new(Arc::new(hub(source.clone())))).await;

    let (status, body) = get(format!("{}/api/stations/10104/current?variables=ozone", base)).await;
    assert_eq!(status, 400);
    assert_eq!(body["invalidVariables"], json!(["ozone"]));
    assert!(body["validVariables"]
        .as_array()
        .unwrap()
        .contains(&json!("air_temperature")));

    let (status, _) = get(format!("{}/api/stations/4242/current", base)).await;
    assert_eq!(status, 404);

    let (status, body) = get(format!("{}/api/stations/harbour/current", base)).await;
    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("harbour"));

    let (status, _) = get(format!("{}/api/compare?stations=10104&period=96h", base)).await;
    assert_eq!(status, 400);

    let (status, _) = get(format!("{}/api/compare?stations=10104,4242", base)).await;
    assert_eq!(status, 404);

    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_compare_response_shape() {
    let source = Arc::new(FakeSource {
        down_stations: HashSet::from([10170]),
        ..Default::default()
    });
    let base = serve(ApiState::new(Arc::new(hub(source)))).await;

    let (status, body) = get(format!(
        "{}/api/compare?stations=10104,10162,10170&period=24h&variables=air_temperature,uv_index",
        base
    ))
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["stations"], json!([10104, 10162, 10170]));
    assert_eq!(body["period"], "24h");
    assert_eq!(body["omitted"], json!([10170]));
    assert!(body["warning"].as_str().unwrap().contains("10170"));

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["parameterCode"], "air_temperature");
    assert_eq!(data[0]["parameterName"], "Air temperature");
    let per_station = data[0]["perStation"].as_object().unwrap();
    assert_eq!(per_station.keys().collect::<Vec<_>>(), vec!["10104", "10162"]);
    assert_eq!(data[1]["parameterCode"], "uv_index");
    assert_eq!(data[1]["perStation"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stations_and_forecast_routes() {
    let source = Arc::new(FakeSource::default());
    let base = serve(ApiState::new(Arc::new(hub(source)))).await;

    let (status, body) = get(format!("{}/api/stations", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"][0]["id"], 10104);

    let (status, body) = get(format!("{}/api/forecast/Harbour-District", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["target"], json!({"kind": "municipality", "id": "harbour-district"}));

    let (status, body) = get(format!("{}/api/stations/10162/forecast", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["target"], json!({"kind": "station", "id": 10162}));
}

struct DenyAll;

impl RequestGate for DenyAll {
    fn permits(&self, headers: &HeaderMap) -> bool {
        headers.contains_key("x-session-verified")
    }
}

#[tokio::test]
async fn test_gate_refusal_is_unauthorized() {
    let source = Arc::new(FakeSource::default());
    let state = ApiState::new(Arc::new(hub(source.clone()))).with_gate(Arc::new(DenyAll));
    let base = serve(state).await;

    let (status, body) = get(format!("{}/api/stations/10104/current", base)).await;
    assert_eq!(status, 401);
    assert!(body["error"].is_string());

    let response = reqwest::Client::new()
        .get(format!("{}/api/stations", base))
        .header("x-session-verified", "1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_registry_from_file_is_served() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(
        &mut file,
        br#"[{"id": 1, "name": "Test Mast", "latitude": 50.0, "longitude": 8.0,
              "supportedParameters": ["wind_speed"]}]"#,
    )
    .unwrap();
    let registry = StationRegistry::from_json_file(file.path()).unwrap();
    let hub = MeteoHub::with_source(HubConfig::default(), registry, Arc::new(FakeSource::default()));
    let base = serve(ApiState::new(Arc::new(hub))).await;

    let (_, body) = get(format!("{}/api/stations", base)).await;
    assert_eq!(body["data"][0]["name"], "Test Mast");
    assert_eq!(body["data"][0]["supportedParameters"], json!(["wind_speed"]));
}

#[tokio::test]
async fn test_abandoned_request_does_not_starve_other_stations() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stations/10104/observations/latest"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"stationId": 10104, "observations": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/stations/10162/observations/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stationId": 10162,
            "observations": [{"observationTimeUtc": "2024-05-01T12:00:00Z", "airTemperature": 9.5}]
        })))
        .mount(&provider)
        .await;

    let config = HubConfig::builder()
        .upstream_url(provider.uri())
        .max_concurrent_upstream(1)
        .request_timeout(Duration::from_secs(2))
        .build();
    let hub = MeteoHub::new(config).unwrap();

    let dropped = tokio::time::timeout(Duration::from_millis(100), hub.current(10104).call()).await;
    assert!(dropped.is_err());

    let bundle = tokio::time::timeout(Duration::from_secs(3), hub.current(10162).call())
        .await
        .expect("request for another station never got an upstream permit")
        .unwrap();
    assert_eq!(bundle.station_id, 10162);
    assert_eq!(bundle.series.len(), 1);
}
