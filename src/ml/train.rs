use crate::domain::model::{parse_number, EventTable};
use crate::ml::features::{FeaturePipeline, TARGET_COLUMN};
use crate::ml::forest::{ForestParams, RandomForest};
use crate::ml::model::RiskModel;
use crate::ml::report::ClassificationReport;
use crate::utils::error::{Result, RiskError};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    pub forest: ForestParams,
    pub test_size: f64,
    pub split_seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            test_size: 0.25,
            split_seed: 42,
        }
    }
}

impl Validate for TrainingOptions {
    fn validate(&self) -> Result<()> {
        validate_positive_number("n_trees", self.forest.n_trees, 1)?;
        validate_positive_number("min_samples_split", self.forest.min_samples_split, 2)?;
        if let Some(depth) = self.forest.max_depth {
            validate_positive_number("max_depth", depth, 1)?;
        }
        // 0 與 1 都會讓其中一邊沒有資料
        validate_range("test_size", self.test_size, 0.01, 0.99)
    }
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub model: RiskModel,
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// 標籤接受 0/1、1.0 與 true/false
pub fn parse_label(cell: &str) -> Option<u8> {
    let trimmed = cell.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => return Some(1),
        "false" => return Some(0),
        _ => {}
    }
    match parse_number(trimmed)? {
        v if v == 0.0 => Some(0),
        v if v == 1.0 => Some(1),
        _ => None,
    }
}

pub fn extract_labels(table: &EventTable) -> Result<Vec<u8>> {
    let idx = table.column_index(TARGET_COLUMN).ok_or_else(|| {
        RiskError::training(format!("target column '{}' not found", TARGET_COLUMN))
    })?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            parse_label(cell).ok_or_else(|| {
                RiskError::training(format!(
                    "invalid {} value '{}' in row {}",
                    TARGET_COLUMN,
                    cell,
                    row + 1
                ))
            })
        })
        .collect()
}

/// Stratified split: each class keeps its share in both sides.
/// Returns sorted (train, test) row indices.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect();

        if members.len() < 2 {
            return Err(RiskError::training(format!(
                "the least populated class ({}) has only {} member(s); need at least 2",
                class,
                members.len()
            )));
        }

        members.shuffle(&mut rng);
        let n_test = ((members.len() as f64 * test_size).round() as usize).clamp(1, members.len() - 1);
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

fn subset(table: &EventTable, indices: &[usize]) -> EventTable {
    EventTable {
        headers: table.headers.clone(),
        rows: indices.iter().map(|&i| table.rows[i].clone()).collect(),
    }
}

/// Fits preprocessing and forest on the training split and evaluates on the
/// held-out split.
pub fn train(table: &EventTable, options: &TrainingOptions) -> Result<TrainingOutcome> {
    options.validate()?;

    let labels = extract_labels(table)?;
    let (train_idx, test_idx) = stratified_split(&labels, options.test_size, options.split_seed)?;
    tracing::info!(
        "🧪 Split {} rows into {} train / {} test",
        labels.len(),
        train_idx.len(),
        test_idx.len()
    );

    let train_table = subset(table, &train_idx);
    let test_table = subset(table, &test_idx);
    let y_train: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();
    let y_test: Vec<u8> = test_idx.iter().map(|&i| labels[i]).collect();

    let features = FeaturePipeline::fit(&train_table)?;
    tracing::debug!("Features: {:?}", features.feature_names());

    let x_train = features.transform(&train_table);
    let forest = RandomForest::fit(&x_train, &y_train, options.forest)?;

    let model = RiskModel::new(features, forest);
    let y_pred: Vec<u8> = model
        .predict_table(&test_table)
        .into_iter()
        .map(|p| u8::from(p >= 0.5))
        .collect();
    let report = ClassificationReport::from_predictions(&y_test, &y_pred);

    Ok(TrainingOutcome {
        model,
        report,
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
    })
}
