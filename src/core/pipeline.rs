use crate::core::csv_io::{parse_csv, write_scored};
use crate::core::recommendations::Recommender;
use crate::core::report::build_report;
use crate::core::{ConfigProvider, EventTable, Pipeline, RiskReport, RiskScorer, Storage};
use crate::utils::error::Result;
use std::io::Write;
use std::sync::Arc;
use zip::write::{FileOptions, ZipWriter};

pub const SCORED_FILENAME: &str = "scored_events.csv";
pub const BUNDLE_FILENAME: &str = "risk_report.zip";

pub struct ScoringPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    scorer: Arc<dyn RiskScorer>,
    recommender: Recommender,
    threshold: f64,
}

impl<S: Storage, C: ConfigProvider> ScoringPipeline<S, C> {
    pub fn new(
        storage: S,
        config: C,
        scorer: Arc<dyn RiskScorer>,
        recommender: Recommender,
        threshold: f64,
    ) -> Self {
        Self {
            storage,
            config,
            scorer,
            recommender,
            threshold,
        }
    }

    fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), name)
    }

    fn build_bundle(&self, scored_csv: &[u8], report: &RiskReport) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>(SCORED_FILENAME, FileOptions::default())?;
        zip.write_all(scored_csv)?;

        zip.start_file::<_, ()>("alerts.json", FileOptions::default())?;
        zip.write_all(serde_json::to_string_pretty(&report.alerts)?.as_bytes())?;

        // 數值欄位不足時仍輸出 null，方便下游判斷
        zip.start_file::<_, ()>("radar.json", FileOptions::default())?;
        zip.write_all(serde_json::to_string_pretty(&report.radar)?.as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ScoringPipeline<S, C> {
    async fn extract(&self) -> Result<EventTable> {
        tracing::debug!("Reading events from: {}", self.config.input_file());
        let bytes = self.storage.read_file(self.config.input_file()).await?;
        parse_csv(&bytes)
    }

    async fn transform(&self, data: EventTable) -> Result<RiskReport> {
        build_report(data, self.scorer.as_ref(), self.threshold, &self.recommender)
    }

    async fn load(&self, report: RiskReport) -> Result<String> {
        let scored_csv = write_scored(&report.scored)?;
        let scored_path = self.output_file(SCORED_FILENAME);

        tracing::debug!("Writing scored CSV ({} bytes) to {}", scored_csv.len(), scored_path);
        self.storage.write_file(&scored_path, &scored_csv).await?;

        if !self.config.bundle_output() {
            return Ok(scored_path);
        }

        let bundle = self.build_bundle(&scored_csv, &report)?;
        let bundle_path = self.output_file(BUNDLE_FILENAME);
        tracing::debug!("Writing report bundle ({} bytes) to {}", bundle.len(), bundle_path);
        self.storage.write_file(&bundle_path, &bundle).await?;

        Ok(bundle_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::HeuristicScorer;
    use crate::utils::error::RiskError;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                RiskError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.put(path, data).await;
            Ok(())
        }
    }

    struct TestConfig {
        bundle: bool,
    }

    impl ConfigProvider for TestConfig {
        fn input_file(&self) -> &str {
            "events.csv"
        }

        fn output_path(&self) -> &str {
            "out/"
        }

        fn bundle_output(&self) -> bool {
            self.bundle
        }
    }

    fn pipeline(storage: MockStorage, bundle: bool) -> ScoringPipeline<MockStorage, TestConfig> {
        ScoringPipeline::new(
            storage,
            TestConfig { bundle },
            Arc::new(HeuristicScorer::default()),
            Recommender::default(),
            0.5,
        )
    }

    #[tokio::test]
    async fn test_extract_reports_unparseable_input() {
        let storage = MockStorage::default();
        storage.put("events.csv", b"a,b\n1,2,3\n").await;

        let result = pipeline(storage, false).extract().await;
        assert!(matches!(result, Err(RiskError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_load_writes_scored_csv() {
        let storage = MockStorage::default();
        storage
            .put("events.csv", b"event_type,severity\nmalware,9\ndos,3\n")
            .await;

        let p = pipeline(storage.clone(), false);
        let table = p.extract().await.unwrap();
        let report = p.transform(table).await.unwrap();
        assert_eq!(report.alerts.len(), 1);

        let path = p.load(report).await.unwrap();
        assert_eq!(path, "out/scored_events.csv");

        let csv = String::from_utf8(storage.get_file(&path).await.unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("event_type,severity,vuln_count,packet_size,risk_probability")
        );
        assert_eq!(lines.next(), Some("malware,9,0,0,0.5"));
    }

    #[tokio::test]
    async fn test_load_bundle_contains_report_files() {
        let storage = MockStorage::default();
        storage
            .put("events.csv", b"event_type,severity,vuln_count\nmalware,9,2\n")
            .await;

        let p = pipeline(storage.clone(), true);
        let table = p.extract().await.unwrap();
        let report = p.transform(table).await.unwrap();
        let path = p.load(report).await.unwrap();
        assert_eq!(path, "out/risk_report.zip");

        let bytes = storage.get_file(&path).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["scored_events.csv", "alerts.json", "radar.json"]);

        let mut alerts = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("alerts.json").unwrap(), &mut alerts)
            .unwrap();
        let alerts: serde_json::Value = serde_json::from_str(&alerts).unwrap();
        assert_eq!(alerts.as_array().unwrap().len(), 1);
        assert!(storage.get_file("out/scored_events.csv").await.is_some());
    }
}
