//! Pipeline services for ThunderCast

pub mod dashboard;
pub mod ingestor;
pub mod prediction;
pub mod publisher;
pub mod training;

pub use dashboard::DashboardService;
pub use ingestor::IngestorService;
pub use prediction::{CycleOutcome, PredictionService};
pub use publisher::PublisherService;
pub use training::{PreparedHistory, TrainingService, TrainingSummary};
