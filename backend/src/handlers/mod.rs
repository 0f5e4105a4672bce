//! HTTP handlers

pub mod dashboard;
pub mod health;

pub use dashboard::{forecasts, latest_observation, observation_history};
pub use health::health_check;
