//! Configuration management for ThunderCast
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with THUNDERCAST__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use shared::{validate_coordinates, Location};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Dashboard API server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Weather API configuration
    pub weather: WeatherConfig,

    /// Observation site
    pub location: LocationConfig,

    /// Collection schedule
    pub scheduler: SchedulerConfig,

    /// Forecasting configuration
    pub forecast: ForecastConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationConfig {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Seconds between collection runs
    pub poll_interval_secs: u64,

    /// Upper bound on one fetch-and-store, in seconds
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    /// Hourly steps scored per prediction cycle
    pub horizon_hours: u32,

    /// Where the trained model artifact lives
    pub model_path: PathBuf,

    /// Tag written on every published forecast row
    pub model_version: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("THUNDERCAST_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost/thundercast")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("weather.api_endpoint", "https://api.openweathermap.org/data/2.5")?
            .set_default("weather.api_key", "")?
            .set_default("weather.request_timeout_secs", 20)?
            .set_default("location.city", "Pimpri-Chinchwad")?
            .set_default("location.latitude", 18.6298)?
            .set_default("location.longitude", 73.7997)?
            .set_default("scheduler.poll_interval_secs", 3600)?
            .set_default("scheduler.fetch_timeout_secs", 30)?
            .set_default("forecast.horizon_hours", 6)?
            .set_default("forecast.model_path", "data/models/seasonal_model.json")?
            .set_default("forecast.model_version", "seasonal_v1")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (THUNDERCAST__ prefix)
            .add_source(
                Environment::with_prefix("THUNDERCAST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_coordinates(self.location.latitude, self.location.longitude)
            .map_err(|e| ConfigError::Message(format!("location: {}", e)))?;

        if self.scheduler.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "scheduler.poll_interval_secs must be positive".into(),
            ));
        }
        if self.scheduler.fetch_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "scheduler.fetch_timeout_secs must be positive".into(),
            ));
        }
        if !(1..=168).contains(&self.forecast.horizon_hours) {
            return Err(ConfigError::Message(
                "forecast.horizon_hours must be between 1 and 168".into(),
            ));
        }
        if self.forecast.model_version.trim().is_empty() {
            return Err(ConfigError::Message(
                "forecast.model_version must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl LocationConfig {
    pub fn to_location(&self) -> Location {
        Location::new(self.city.clone(), self.latitude, self.longitude)
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl WeatherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
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
            request_timeout_secs: 1,
        },
        location: LocationConfig {
            city: "Pimpri-Chinchwad".to_string(),
            latitude: 18.6298,
            longitude: 73.7997,
        },
        scheduler: SchedulerConfig {
            poll_interval_secs: 3600,
            fetch_timeout_secs: 5,
        },
        forecast: ForecastConfig {
            horizon_hours: 6,
            model_path: PathBuf::from("data/models/seasonal_model.json"),
            model_version: "seasonal_v1".to_string(),
        },
    }
}
