use crate::domain::model::{EventTable, ScoredTable};
use crate::domain::ports::RiskScorer;
use crate::ml::features::FeaturePipeline;
use crate::ml::forest::RandomForest;
use crate::utils::error::{Result, RiskError};
use chrono::{DateTime, Utc};
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MODEL_FORMAT_VERSION: u32 = 1;
pub const LABEL_CUTOFF: f64 = 0.5;

/// Fitted preprocessing + forest, saved as JSON by the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskModel {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub features: FeaturePipeline,
    pub forest: RandomForest,
}

impl RiskModel {
    pub fn new(features: FeaturePipeline, forest: RandomForest) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            trained_at: Utc::now(),
            features,
            forest,
        }
    }

    /// Class-1 probability per row.
    pub fn predict_table(&self, table: &EventTable) -> Vec<f64> {
        self.features
            .transform(table)
            .iter()
            .map(|row| self.forest.predict_proba(row))
            .collect()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            RiskError::model(format!("cannot read model file {}: {}", path.display(), e))
        })?;
        let model: RiskModel = serde_json::from_slice(&bytes)
            .map_err(|e| RiskError::model(format!("corrupt model file {}: {}", path.display(), e)))?;

        if model.format_version != MODEL_FORMAT_VERSION {
            return Err(RiskError::model(format!(
                "unsupported model format version {} (expected {})",
                model.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if model.features.n_features() != model.forest.n_features {
            return Err(RiskError::model(format!(
                "feature count mismatch: preprocessing has {}, forest expects {}",
                model.features.n_features(),
                model.forest.n_features
            )));
        }
        Ok(model)
    }
}

impl RiskScorer for RiskModel {
    fn name(&self) -> &str {
        "model"
    }

    fn score(&self, table: EventTable) -> Result<ScoredTable> {
        let table = table.without_score_columns();
        let risk_probability = self.predict_table(&table);
        let risk_label = risk_probability
            .iter()
            .map(|p| u8::from(*p >= LABEL_CUTOFF))
            .collect();

        Ok(ScoredTable {
            table,
            risk_probability,
            risk_label: Some(risk_label),
        })
    }
}

/// Loads the model once and hands out the same instance afterwards.
#[derive(Default)]
pub struct ModelCache {
    cell: OnceCell<(PathBuf, Arc<RiskModel>)>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<RiskModel>> {
        let path = path.as_ref();
        let (loaded_from, model) = self.cell.get_or_try_init(|| {
            tracing::info!("📦 Loading model from {}", path.display());
            RiskModel::load(path).map(|m| (path.to_path_buf(), Arc::new(m)))
        })?;

        if loaded_from != path {
            tracing::warn!(
                "⚠️ Model already loaded from {}, ignoring {}",
                loaded_from.display(),
                path.display()
            );
        }
        Ok(Arc::clone(model))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

static SHARED_MODEL: Lazy<ModelCache> = Lazy::new(ModelCache::new);

/// Process-wide lazily loaded model.
pub fn shared_model<P: AsRef<Path>>(path: P) -> Result<Arc<RiskModel>> {
    SHARED_MODEL.get_or_load(path)
}
