//! Column preprocessing for the trained model: one-hot encoding for the
//! categorical columns and median imputation for everything numeric.

use crate::domain::model::{parse_number, EventTable};
use crate::utils::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

pub const TARGET_COLUMN: &str = "label_high_risk";
pub const DROPPED_COLUMNS: [&str; 4] = ["timestamp", "src_ip", "dst_ip", "asset_id"];
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["event_type", "severity"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub column: String,
    /// Sorted; unknown values at prediction time encode as all zeros.
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFeature {
    pub column: String,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    pub categorical: Vec<CategoricalFeature>,
    pub numeric: Vec<NumericFeature>,
}

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn is_excluded(column: &str) -> bool {
    column == TARGET_COLUMN || DROPPED_COLUMNS.contains(&column)
}

impl FeaturePipeline {
    pub fn fit(table: &EventTable) -> Result<Self> {
        let mut categorical = Vec::new();
        for column in CATEGORICAL_COLUMNS {
            let Some(idx) = table.column_index(column) else {
                tracing::warn!("⚠️ Categorical column '{}' not found, skipping", column);
                continue;
            };
            let mut categories: Vec<String> = table
                .rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.trim().to_string())
                .filter(|cell| !cell.is_empty())
                .collect();
            categories.sort();
            categories.dedup();
            categorical.push(CategoricalFeature {
                column: column.to_string(),
                categories,
            });
        }

        let mut numeric = Vec::new();
        for (idx, column) in table.headers.iter().enumerate() {
            if is_excluded(column) || CATEGORICAL_COLUMNS.contains(&column.as_str()) {
                continue;
            }
            let mut values: Vec<f64> = table
                .rows
                .iter()
                .filter_map(|row| row.get(idx).and_then(|cell| parse_number(cell)))
                .collect();

            // 全部缺值的欄位無法估中位數，直接略過
            match median(&mut values) {
                Some(median) => numeric.push(NumericFeature {
                    column: column.clone(),
                    median,
                }),
                None => tracing::warn!("⚠️ Column '{}' has no numeric values, skipping", column),
            }
        }

        let pipeline = Self {
            categorical,
            numeric,
        };
        if pipeline.n_features() == 0 {
            return Err(RiskError::training("no usable feature columns"));
        }
        Ok(pipeline)
    }

    pub fn n_features(&self) -> usize {
        self.categorical
            .iter()
            .map(|c| c.categories.len())
            .sum::<usize>()
            + self.numeric.len()
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features());
        for feature in &self.categorical {
            for category in &feature.categories {
                names.push(format!("{}={}", feature.column, category));
            }
        }
        names.extend(self.numeric.iter().map(|n| n.column.clone()));
        names
    }

    /// 缺少的欄位：類別特徵全為 0，數值特徵填中位數
    pub fn transform_row(&self, table: &EventTable, row: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n_features());

        for feature in &self.categorical {
            let value = table.cell(row, &feature.column).map(str::trim);
            for category in &feature.categories {
                out.push(if value == Some(category.as_str()) { 1.0 } else { 0.0 });
            }
        }

        for feature in &self.numeric {
            let value = table
                .cell(row, &feature.column)
                .and_then(parse_number)
                .unwrap_or(feature.median);
            out.push(value);
        }

        out
    }

    pub fn transform(&self, table: &EventTable) -> Vec<Vec<f64>> {
        (0..table.len())
            .map(|row| self.transform_row(table, row))
            .collect()
    }
}
