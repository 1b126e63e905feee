pub mod alerts;
pub mod csv_io;
pub mod etl;
pub mod pipeline;
pub mod radar;
pub mod recommendations;
pub mod report;
pub mod scoring;

pub use crate::domain::model::{EventTable, Record, RiskReport, ScoredTable};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RiskScorer, Storage};
pub use crate::utils::error::Result;
