pub mod config;
pub mod core;
pub mod domain;
pub mod ml;
pub mod utils;

#[cfg(feature = "dashboard")]
pub mod dashboard;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, risk_config::RiskConfig};
pub use core::{etl::EtlEngine, pipeline::ScoringPipeline, scoring::HeuristicScorer};
pub use utils::error::{Result, RiskError};
