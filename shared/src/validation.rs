//! Validation utilities for weather data
//!
//! A reading that fails these checks is treated as a malformed payload rather
//! than stored.

use crate::models::Readings;

// ============================================================================
// Observation Validations
// ============================================================================

/// Validate a percentage field (humidity, cloud cover)
pub fn validate_percent(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err("Percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate air temperature in Celsius against recorded extremes
pub fn validate_temperature(celsius: f64) -> Result<(), &'static str> {
    if !celsius.is_finite() || !(-90.0..=60.0).contains(&celsius) {
        return Err("Temperature out of physical range");
    }
    Ok(())
}

/// Validate station pressure in hPa
pub fn validate_pressure(hpa: f64) -> Result<(), &'static str> {
    if !hpa.is_finite() || !(800.0..=1100.0).contains(&hpa) {
        return Err("Pressure out of physical range");
    }
    Ok(())
}

/// Validate wind speed in m/s
pub fn validate_wind_speed(mps: f64) -> Result<(), &'static str> {
    if !mps.is_finite() || mps < 0.0 || mps > 120.0 {
        return Err("Wind speed out of physical range");
    }
    Ok(())
}

/// Validate a full set of readings
pub fn validate_readings(readings: &Readings) -> Result<(), &'static str> {
    validate_temperature(readings.temperature)?;
    validate_percent(readings.humidity)?;
    validate_pressure(readings.pressure)?;
    validate_wind_speed(readings.wind_speed)?;
    validate_percent(readings.cloud_cover)?;
    Ok(())
}

// ============================================================================
// Location Validations
// ============================================================================

/// Validate latitude and longitude in decimal degrees
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), &'static str> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}
