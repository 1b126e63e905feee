#![cfg(feature = "cli")]

use cyber_risk_etl::core::csv_io::parse_csv;
use cyber_risk_etl::domain::model::EventTable;
use cyber_risk_etl::domain::ports::RiskScorer;
use cyber_risk_etl::ml::forest::ForestParams;
use cyber_risk_etl::ml::{train, RiskModel, TrainingOptions};
use cyber_risk_etl::{CliConfig, EtlEngine, LocalStorage, ScoringPipeline};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn training_table() -> EventTable {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("training_events.csv");
    let bytes = std::fs::read(path).unwrap();
    parse_csv(&bytes).unwrap()
}

fn quick_options() -> TrainingOptions {
    TrainingOptions {
        forest: ForestParams {
            n_trees: 40,
            ..ForestParams::default()
        },
        ..TrainingOptions::default()
    }
}

#[test]
fn test_training_report_covers_both_classes() {
    let table = training_table();
    let outcome = train(&table, &quick_options()).unwrap();

    assert_eq!(outcome.train_rows + outcome.test_rows, table.len());
    assert_eq!(outcome.test_rows, 12);
    assert_eq!(outcome.report.classes[0].support, 6);
    assert_eq!(outcome.report.classes[1].support, 6);
    assert!((0.0..=1.0).contains(&outcome.report.accuracy));

    let text = outcome.report.to_string();
    assert!(text.contains("precision"));
    assert!(text.contains("weighted avg"));
}

#[test]
fn test_saved_model_reloads_and_scores_identically() {
    let table = training_table();
    let outcome = train(&table, &quick_options()).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models").join("risk_model.json");
    outcome.model.save(&path).unwrap();
    let loaded = RiskModel::load(&path).unwrap();

    let before = outcome.model.score(table.clone()).unwrap();
    let after = loaded.score(table).unwrap();
    assert_eq!(before.risk_probability, after.risk_probability);
    assert_eq!(before.risk_label, after.risk_label);
    assert!(after
        .risk_probability
        .iter()
        .all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn test_same_seed_same_model() {
    let table = training_table();
    let a = train(&table, &quick_options()).unwrap();
    let b = train(&table, &quick_options()).unwrap();
    assert_eq!(a.model.forest, b.model.forest);
    assert_eq!(a.report, b.report);
}

#[tokio::test]
async fn test_model_scorer_in_pipeline_adds_label_column() -> anyhow::Result<()> {
    let table = training_table();
    let outcome = train(&table, &quick_options())?;

    let dir = TempDir::new()?;
    let input = dir.path().join("events.csv");
    std::fs::write(
        &input,
        "event_type,severity,vuln_count,asset_criticality,auth_failures,malware_alerts,packet_size\n\
         ransomware,9,6,10,0,4,900\n\
         port_scan,1,0,1,0,0,64\n",
    )?;

    let config = CliConfig {
        input: input.to_str().unwrap().to_string(),
        config: "config.yaml".to_string(),
        output_path: dir.path().to_str().unwrap().to_string(),
        threshold: None,
        model: None,
        bundle: false,
        verbose: false,
        monitor: false,
    };
    let pipeline = ScoringPipeline::new(
        LocalStorage::default(),
        config,
        Arc::new(outcome.model),
        Default::default(),
        0.5,
    );
    let summary = EtlEngine::new(pipeline).run().await?;

    let csv_text = std::fs::read_to_string(&summary.output_path)?;
    let mut lines = csv_text.lines();
    assert!(lines
        .next()
        .unwrap()
        .ends_with("packet_size,risk_probability,risk_label"));
    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        let risk: f64 = fields[fields.len() - 2].parse()?;
        let label = fields[fields.len() - 1];
        assert_eq!(label, if risk >= 0.5 { "1" } else { "0" });
    }
    Ok(())
}
