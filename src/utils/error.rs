use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Error reading the uploaded CSV: {message}")]
    InvalidInput { message: String },

    #[error("Model error: {message}")]
    ModelError { message: String },

    #[error("Training error: {message}")]
    TrainingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    Model,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        RiskError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn model(message: impl Into<String>) -> Self {
        RiskError::ModelError {
            message: message.into(),
        }
    }

    pub fn training(message: impl Into<String>) -> Self {
        RiskError::TrainingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RiskError::ConfigError { .. }
            | RiskError::InvalidConfigValueError { .. }
            | RiskError::YamlError(_)
            | RiskError::TomlError(_) => ErrorCategory::Configuration,
            RiskError::InvalidInput { .. } | RiskError::CsvError(_) => ErrorCategory::Input,
            RiskError::ModelError { .. } | RiskError::TrainingError { .. } => ErrorCategory::Model,
            RiskError::SerializationError(_) => ErrorCategory::Processing,
            RiskError::IoError(_) | RiskError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Processing | ErrorCategory::Model => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RiskError::InvalidInput { .. } | RiskError::CsvError(_) => {
                "Check that the file is a comma-separated CSV with a header row".to_string()
            }
            RiskError::YamlError(_) | RiskError::TomlError(_) | RiskError::ConfigError { .. } => {
                "Check the config file syntax (threshold + playbook mapping)".to_string()
            }
            RiskError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the config file or CLI flags", field)
            }
            RiskError::ModelError { .. } => {
                "Run the train-model binary first, or score without --model".to_string()
            }
            RiskError::TrainingError { .. } => {
                "Check that the training CSV has a 0/1 label_high_risk column with both classes"
                    .to_string()
            }
            RiskError::IoError(_) => "Check file paths and permissions".to_string(),
            RiskError::ZipError(_) => {
                "Check free disk space in the output directory, or run without --bundle".to_string()
            }
            RiskError::SerializationError(_) => {
                "Re-run with --verbose and inspect the input rows".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => self.to_string(),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Model => format!("Model problem: {}", self),
            ErrorCategory::Processing => format!("Scoring failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_user_visible() {
        let err = RiskError::invalid_input("missing header row");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(
            err.user_friendly_message(),
            "Error reading the uploaded CSV: missing header row"
        );
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: RiskError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.recovery_suggestion().contains("paths"));
    }
}
