//! WebAssembly module for ThunderCast
//!
//! Provides client-side computation for:
//! - Risk banding of forecast probabilities
//! - The thunderstorm label rule
//! - Season and cyclical time encodings
//!
//! Every rule comes from `shared`, so dashboards band and label exactly like
//! the backend.

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::debug_1(&JsValue::from_str(concat!(
        "thundercast-wasm ",
        env!("CARGO_PKG_VERSION")
    )));
}

/// Risk level ("low", "moderate", "high") of a probability in percent
#[wasm_bindgen]
pub fn risk_level(probability: f64) -> String {
    RiskLevel::from_probability(probability).label().to_string()
}

/// Risk levels for a batch of probabilities, as a JS array of strings
#[wasm_bindgen]
pub fn risk_levels(probabilities: &[f64]) -> js_sys::Array {
    probabilities
        .iter()
        .map(|&p| JsValue::from_str(RiskLevel::from_probability(p).label()))
        .collect()
}

/// Clamp a raw percent into `[0, 100]`; `undefined` for non-finite input
#[wasm_bindgen]
pub fn clamp_forecast_probability(raw_percent: f64) -> Option<f64> {
    clamp_probability(raw_percent)
}

/// Thunderstorm label. NaN inputs count as missing.
#[wasm_bindgen]
pub fn is_thunderstorm(precipitation: f64, humidity: f64, pressure: f64) -> bool {
    let present = |v: f64| (!v.is_nan()).then_some(v);
    shared::thunderstorm_label(present(precipitation), present(humidity), present(pressure))
}

/// Season name for a calendar month (1-12)
#[wasm_bindgen]
pub fn season_for_month(month: u32) -> Result<String, JsValue> {
    if !(1..=12).contains(&month) {
        return Err(JsValue::from_str("Month must be between 1 and 12"));
    }
    Ok(Season::from_month(month).as_str().to_string())
}

/// `[sin, cos]` encoding of an hour of day
#[wasm_bindgen]
pub fn encode_hour(hour: f64) -> Vec<f64> {
    let (sin, cos) = shared::cyclical_encode(hour, shared::HOURS_PER_DAY);
    vec![sin, cos]
}

/// Risk level of every row in a JSON array of forecast records
#[wasm_bindgen]
pub fn band_forecasts(records_json: &str) -> Result<String, JsValue> {
    let records: Vec<ForecastRecord> = serde_json::from_str(records_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid forecasts JSON: {}", e)))?;

    let banded: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "forecast_time": r.forecast_time,
                "thunderstorm_probability": r.thunderstorm_probability,
                "risk_level": r.risk_level(),
            })
        })
        .collect();

    serde_json::to_string(&banded).map_err(|e| JsValue::from_str(&e.to_string()))
}
