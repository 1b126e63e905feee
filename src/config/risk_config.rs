use crate::config::bootstrap;
use crate::core::recommendations::{Playbook, Recommender};
use crate::core::scoring::ScoringWeights;
use crate::utils::error::{Result, RiskError};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MAX_PREVIEW_ROWS: usize = 200;
pub const DEFAULT_MAX_ALERTS: usize = 50;

/// Scoring settings: alert threshold, playbook and optional tuning.
///
/// Every key is optional; missing keys fall back to defaults. The legacy
/// `risk_threshold` / `recommendations` keys are still read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playbook: Option<Playbook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Playbook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: Option<ScoringWeights>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub max_preview_rows: Option<usize>,
    pub max_alerts: Option<usize>,
}

impl RiskConfig {
    /// 從檔案載入；`.toml` 用 TOML 解析，其他副檔名一律當作 YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(RiskError::IoError)?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// 設定檔不存在時先寫入範例設定再載入
    pub fn load_or_bootstrap<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if bootstrap::ensure_sample_config(path)? {
            tracing::info!("📝 Wrote sample config to {}", path.display());
        }
        Self::from_file(path)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        if processed.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&processed)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed)?)
    }

    /// 替換環境變數 (例如 ${RISK_THRESHOLD})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RiskError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
            .or(self.risk_threshold)
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    /// `playbook` and legacy `recommendations` merged; `playbook` wins per key.
    pub fn playbook(&self) -> Playbook {
        let mut merged = self.recommendations.clone().unwrap_or_default();
        if let Some(playbook) = &self.playbook {
            merged.extend(playbook.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    pub fn recommender(&self) -> Recommender {
        Recommender::new(self.playbook())
    }

    pub fn weights(&self) -> ScoringWeights {
        self.scoring
            .as_ref()
            .and_then(|s| s.weights)
            .unwrap_or_default()
    }

    pub fn max_preview_rows(&self) -> usize {
        self.display
            .as_ref()
            .and_then(|d| d.max_preview_rows)
            .unwrap_or(DEFAULT_MAX_PREVIEW_ROWS)
    }

    pub fn max_alerts(&self) -> usize {
        self.display
            .as_ref()
            .and_then(|d| d.max_alerts)
            .unwrap_or(DEFAULT_MAX_ALERTS)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_range("threshold", self.threshold(), 0.0, 1.0)?;

        let weights = self.weights();
        for (field, value) in [
            ("scoring.weights.severity", weights.severity),
            ("scoring.weights.vuln_count", weights.vuln_count),
            ("scoring.weights.packet_size", weights.packet_size),
        ] {
            validate_range(field, value, 0.0, f64::MAX)?;
        }

        validate_positive_number("display.max_preview_rows", self.max_preview_rows(), 1)?;
        validate_positive_number("display.max_alerts", self.max_alerts(), 1)?;

        Ok(())
    }
}

impl Validate for RiskConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_playbook_config() {
        let yaml = r#"
threshold: 0.6
playbook:
  malware:
    - Run antivirus scan
    - Isolate infected machine
  phishing:
    - Reset user passwords
"#;
        let config = RiskConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.threshold(), 0.6);
        assert_eq!(config.playbook()["malware"].len(), 2);
        assert_eq!(config.weights(), ScoringWeights::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_legacy_keys() {
        let yaml = r#"
risk_threshold: 0.7
recommendations:
  default: [Open ticket]
  malware: [Old malware step]
playbook:
  malware: [Run antivirus scan]
"#;
        let config = RiskConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.threshold(), 0.7);
        let playbook = config.playbook();
        assert_eq!(playbook["default"], vec!["Open ticket"]);
        assert_eq!(playbook["malware"], vec!["Run antivirus scan"]);
    }

    #[test]
    fn test_missing_keys_default_silently() {
        let config = RiskConfig::from_yaml_str("").unwrap();
        assert_eq!(config.threshold(), DEFAULT_THRESHOLD);
        assert!(config.playbook().is_empty());
        assert_eq!(config.max_preview_rows(), 200);
        assert_eq!(config.max_alerts(), 50);

        let config = RiskConfig::from_yaml_str("unrelated: true\n").unwrap();
        assert_eq!(config.threshold(), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_threshold_out_of_range_fails_validation() {
        let config = RiskConfig::from_yaml_str("threshold: 1.5\n").unwrap();
        assert!(config.validate().is_err());

        let config = RiskConfig::from_yaml_str("scoring:\n  weights:\n    severity: -1\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_weights_keep_defaults() {
        let config =
            RiskConfig::from_yaml_str("scoring:\n  weights:\n    packet_size: 0.4\n").unwrap();
        let weights = config.weights();
        assert_eq!(weights.severity, 0.5);
        assert_eq!(weights.vuln_count, 0.3);
        assert_eq!(weights.packet_size, 0.4);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CYBER_RISK_TEST_THRESHOLD", "0.85");
        let config = RiskConfig::from_yaml_str("threshold: ${CYBER_RISK_TEST_THRESHOLD}\n").unwrap();
        assert_eq!(config.threshold(), 0.85);
        std::env::remove_var("CYBER_RISK_TEST_THRESHOLD");
    }

    #[test]
    fn test_toml_config_from_file() {
        let mut temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        temp_file
            .write_all(b"threshold = 0.4\n\n[playbook]\nmalware = [\"Run antivirus scan\"]\n")
            .unwrap();

        let config = RiskConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.threshold(), 0.4);
        assert_eq!(config.playbook()["malware"], vec!["Run antivirus scan"]);
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = RiskConfig::from_yaml_str("threshold: [oops\n").unwrap_err();
        assert_eq!(
            err.category(),
            crate::utils::error::ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_load_or_bootstrap_writes_sample() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let config = RiskConfig::load_or_bootstrap(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.threshold(), 0.5);
        assert!(config.playbook().contains_key("malware"));
        assert!(config.playbook().contains_key("phishing"));
    }
}
