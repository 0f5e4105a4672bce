//! Fixtures shared by the integration tests

#![allow(dead_code)]

use axum::{http::StatusCode, routing::get, Router};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use shared::{Location, RawHistoryRow, Readings, WeatherObservation};
use thundercast::config::{
    Config, DatabaseConfig, ForecastConfig, LocationConfig, SchedulerConfig, ServerConfig,
    WeatherConfig,
};

pub const SAMPLE_OWM_BODY: &str = r#"{
    "coord": {"lon": 73.7997, "lat": 18.6298},
    "weather": [{"id": 211, "main": "Thunderstorm", "description": "thunderstorm", "icon": "11d"}],
    "main": {"temp": 27.3, "feels_like": 30.1, "pressure": 1006, "humidity": 84},
    "wind": {"speed": 4.6, "deg": 250},
    "clouds": {"all": 92},
    "dt": 1717243200,
    "name": "Pimpri"
}"#;

pub fn test_config(model_path: &Path) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://localhost/thundercast_test".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        weather: WeatherConfig {
            api_endpoint: "http://127.0.0.1:9".to_string(),
            api_key: "test-key".to_string(),
            request_timeout_secs: 2,
        },
        location: LocationConfig {
            city: "Pimpri-Chinchwad".to_string(),
            latitude: 18.6298,
            longitude: 73.7997,
        },
        scheduler: SchedulerConfig {
            poll_interval_secs: 3600,
            fetch_timeout_secs: 2,
        },
        forecast: ForecastConfig {
            horizon_hours: 6,
            model_path: model_path.to_path_buf(),
            model_version: "seasonal_v1".to_string(),
        },
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// Ten hourly rows; only the seventh crosses all three storm thresholds
pub fn ten_hour_history() -> Vec<RawHistoryRow> {
    (0..10)
        .map(|i| {
            let storm = i == 6;
            RawHistoryRow {
                timestamp: base_time() + Duration::hours(i),
                temperature: Some(26.0 + i as f64 * 0.3),
                humidity: Some(if storm { 85.0 } else { 60.0 + i as f64 }),
                pressure: Some(if storm { 1004.0 } else { 1012.0 }),
                wind_speed_kmph: Some(12.0 + (i % 3) as f64),
                cloud_cover: Some(if storm { 98.0 } else { 40.0 }),
                precipitation: Some(if storm { 8.0 } else { 0.0 }),
            }
        })
        .collect()
}

/// Same rows in the raw CSV layout the trainer reads
pub fn history_csv(rows: &[RawHistoryRow]) -> String {
    let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    let mut out = String::from("date_time,tempC,humidity,pressure,windspeedKmph,cloudcover,precipMM\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            row.timestamp.format("%Y-%m-%d %H:%M:%S"),
            cell(row.temperature),
            cell(row.humidity),
            cell(row.pressure),
            cell(row.wind_speed_kmph),
            cell(row.cloud_cover),
            cell(row.precipitation),
        ));
    }
    out
}

pub fn observation_at(timestamp: DateTime<Utc>, humidity: f64) -> WeatherObservation {
    WeatherObservation::new(
        timestamp,
        Readings {
            temperature: 28.0,
            humidity,
            pressure: 1006.0,
            wind_speed: 3.5,
            cloud_cover: 85.0,
        },
        &Location::new("Pimpri-Chinchwad", 18.6298, 73.7997),
    )
}

/// Serve `body` with `status` at `/weather` on an ephemeral port
pub async fn spawn_weather_source(status: StatusCode, body: &'static str) -> String {
    spawn_router(Router::new().route("/weather", get(move || async move { (status, body) }))).await
}

/// Answer `/weather` only after `delay`
pub async fn spawn_slow_weather_source(delay: std::time::Duration) -> String {
    spawn_router(Router::new().route(
        "/weather",
        get(move || async move {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, SAMPLE_OWM_BODY)
        }),
    ))
    .await
}

/// Stall only the first `/weather` request by `first_delay`
pub async fn spawn_stalling_weather_source(first_delay: std::time::Duration) -> String {
    let hits = Arc::new(AtomicUsize::new(0));
    spawn_router(Router::new().route(
        "/weather",
        get(move || {
            let hits = hits.clone();
            async move {
                if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(first_delay).await;
                }
                (StatusCode::OK, SAMPLE_OWM_BODY)
            }
        }),
    ))
    .await
}

async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
