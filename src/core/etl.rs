use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

/// Outcome of a single scoring run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: String,
    pub rows: usize,
    pub alerts: usize,
    pub threshold: f64,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting risk scoring run...");

        // Extract
        let events = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} records", events.len());
        self.monitor.log_phase("extract");

        // Transform
        let report = self.pipeline.transform(events).await?;
        let rows = report.scored.len();
        let alerts = report.alerts.len();
        let threshold = report.threshold;
        tracing::info!("🚨 {} of {} records at or above threshold {:.2}", alerts, rows, threshold);
        self.monitor.log_phase("transform");

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("💾 Output saved to: {}", output_path);
        self.monitor.log_phase("load");
        self.monitor.log_final_stats();

        Ok(RunSummary {
            output_path,
            rows,
            alerts,
            threshold,
        })
    }
}
