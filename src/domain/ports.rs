use crate::domain::model::{EventTable, RiskReport, ScoredTable};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn bundle_output(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<EventTable>;
    async fn transform(&self, data: EventTable) -> Result<RiskReport>;
    async fn load(&self, report: RiskReport) -> Result<String>;
}

/// Turns an event table into per-row risk probabilities.
pub trait RiskScorer: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, table: EventTable) -> Result<ScoredTable>;
}
