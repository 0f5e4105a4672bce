//! PostgreSQL-backed store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{ForecastRecord, WeatherObservation};

use super::WeatherStore;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgWeatherStore {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ObservationRow {
    id: Uuid,
    timestamp: DateTime<Utc>,
    temperature: f64,
    humidity: f64,
    pressure: f64,
    wind_speed: f64,
    cloud_cover: f64,
    location: String,
    latitude: f64,
    longitude: f64,
}

impl From<ObservationRow> for WeatherObservation {
    fn from(row: ObservationRow) -> Self {
        Self {
            id: row.id,
            timestamp: row.timestamp,
            temperature: row.temperature,
            humidity: row.humidity,
            pressure: row.pressure,
            wind_speed: row.wind_speed,
            cloud_cover: row.cloud_cover,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

#[derive(Debug, FromRow)]
struct PredictionRow {
    id: Uuid,
    prediction_time: DateTime<Utc>,
    forecast_time: DateTime<Utc>,
    thunderstorm_probability: f64,
    location: String,
    model_version: String,
}

impl From<PredictionRow> for ForecastRecord {
    fn from(row: PredictionRow) -> Self {
        Self {
            id: row.id,
            prediction_time: row.prediction_time,
            forecast_time: row.forecast_time,
            thunderstorm_probability: row.thunderstorm_probability,
            location: row.location,
            model_version: row.model_version,
        }
    }
}

impl PgWeatherStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn write_failure(table: &str, err: sqlx::Error) -> AppError {
    AppError::StoreWriteFailure(format!("{}: {}", table, err))
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl WeatherStore for PgWeatherStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn append_observation(&self, observation: &WeatherObservation) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_data (
                id, "timestamp", temperature, humidity, pressure,
                wind_speed, cloud_cover, location, latitude, longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(observation.id)
        .bind(observation.timestamp)
        .bind(observation.temperature)
        .bind(observation.humidity)
        .bind(observation.pressure)
        .bind(observation.wind_speed)
        .bind(observation.cloud_cover)
        .bind(&observation.location)
        .bind(observation.latitude)
        .bind(observation.longitude)
        .execute(&self.db)
        .await
        .map_err(|e| write_failure("weather_data", e))?;

        Ok(())
    }

    async fn latest_observations(&self, limit: usize) -> AppResult<Vec<WeatherObservation>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT id, "timestamp", temperature, humidity, pressure,
                   wind_speed, cloud_cover, location, latitude, longitude
            FROM weather_data
            ORDER BY "timestamp" DESC
            LIMIT $1
            "#,
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_forecasts(&self, rows: &[ForecastRecord]) -> AppResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| write_failure("predictions", e))?;

        let mut written = 0;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO predictions (
                    id, prediction_time, forecast_time,
                    thunderstorm_probability, location, model_version
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.id)
            .bind(row.prediction_time)
            .bind(row.forecast_time)
            .bind(row.thunderstorm_probability)
            .bind(&row.location)
            .bind(&row.model_version)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_failure("predictions", e))?;
            written += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| write_failure("predictions", e))?;

        Ok(written)
    }

    async fn recent_forecasts(&self, limit: usize) -> AppResult<Vec<ForecastRecord>> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT id, prediction_time, forecast_time,
                   thunderstorm_probability, location, model_version
            FROM predictions
            ORDER BY prediction_time DESC, forecast_time DESC
            LIMIT $1
            "#,
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
