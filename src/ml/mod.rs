// Offline model: preprocessing, forest, trainer and the cached scorer.

pub mod features;
pub mod forest;
pub mod model;
pub mod report;
pub mod train;

pub use model::{shared_model, ModelCache, RiskModel};
pub use train::{train, TrainingOptions, TrainingOutcome};
