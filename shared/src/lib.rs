//! Shared types and pipeline steps for ThunderCast
//!
//! This crate holds everything that is pure: the record shapes stored and
//! exchanged by the backend, the cleaning and feature-engineering steps, and
//! the risk banding rule. The backend and the WASM bindings both build on it.

pub mod cleaning;
pub mod features;
pub mod models;
pub mod series;
pub mod types;
pub mod validation;

pub use cleaning::*;
pub use features::*;
pub use models::*;
pub use series::*;
pub use types::*;
pub use validation::*;
