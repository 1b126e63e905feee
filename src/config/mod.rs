pub mod bootstrap;
pub mod cli;
pub mod risk_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_file_extension, validate_path, validate_range, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_EVENTS: &str = "data/sample_events.csv";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_MODEL_PATH: &str = "models/risk_model.json";

pub const CONFIG_EXTENSIONS: [&str; 3] = ["yaml", "yml", "toml"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "cyber-risk-etl")]
#[command(about = "Score a CSV of security events: risk probabilities, alerts and remediation steps")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_SAMPLE_EVENTS, help = "Events CSV to score")]
    pub input: String,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH, help = "YAML/TOML file with threshold and playbook")]
    pub config: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, help = "Override the alert threshold from the config file")]
    pub threshold: Option<f64>,

    #[arg(long, help = "Score with a trained model instead of the heuristic")]
    pub model: Option<String>,

    #[arg(long, help = "Also write risk_report.zip with alerts and chart data")]
    pub bundle: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU/memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_file(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn bundle_output(&self) -> bool {
        self.bundle
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extension("input", &self.input, &["csv"])?;
        validate_path("config", &self.config)?;
        validate_file_extension("config", &self.config, &CONFIG_EXTENSIONS)?;
        validate_path("output_path", &self.output_path)?;

        if let Some(threshold) = self.threshold {
            validate_range("threshold", threshold, 0.0, 1.0)?;
        }
        if let Some(model) = &self.model {
            validate_path("model", model)?;
            validate_file_extension("model", model, &["json"])?;
        }
        Ok(())
    }
}
