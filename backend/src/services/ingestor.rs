//! Ingestor: fetch current conditions and append them to the store

use std::sync::Arc;

use shared::{Location, WeatherObservation};

use crate::error::AppResult;
use crate::external::WeatherClient;
use crate::store::WeatherStore;

#[derive(Clone)]
pub struct IngestorService {
    store: Arc<dyn WeatherStore>,
    client: WeatherClient,
    location: Location,
}

impl IngestorService {
    pub fn new(store: Arc<dyn WeatherStore>, client: WeatherClient, location: Location) -> Self {
        Self {
            store,
            client,
            location,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// One fetch-and-append. No retry; the next tick is the retry.
    pub async fn fetch(&self) -> AppResult<WeatherObservation> {
        let conditions = self
            .client
            .get_current_conditions(self.location.latitude, self.location.longitude)
            .await?;

        let station = conditions.station_name.unwrap_or_default();
        let observation =
            WeatherObservation::new(conditions.observed_at, conditions.readings, &self.location);
        self.store.append_observation(&observation).await?;

        tracing::info!(
            location = %observation.location,
            station = %station,
            observed_at = %observation.timestamp,
            temperature = observation.temperature,
            humidity = observation.humidity,
            pressure = observation.pressure,
            "Stored weather observation"
        );

        Ok(observation)
    }
}
