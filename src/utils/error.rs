use thiserror::Error;

/// Structural problems with a loaded or loading decision tree.
///
/// Every variant routes the request to the fallback linear model; none of
/// them is fatal to the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("model file not found: {path}")]
    MissingModel { path: String },

    #[error("model file could not be decoded: {message}")]
    Malformed { message: String },

    #[error("unsupported model format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("tree has no nodes")]
    EmptyTree,

    #[error("node {node} points at child {child}, but the tree has {len} nodes")]
    MissingChild { node: usize, child: usize, len: usize },

    #[error("node {node} splits on feature {feature}, but only {available} features exist")]
    FeatureOutOfRange {
        node: usize,
        feature: usize,
        available: usize,
    },

    #[error("traversal exceeded the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("node {node} holds a non-finite value")]
    NonFinite { node: usize },
}

#[derive(Error, Debug)]
pub enum ReimburseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input '{value}' for {field}: {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Model integrity error: {0}")]
    ModelIntegrity(#[from] IntegrityError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Model,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ReimburseError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::Input,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::ModelIntegrity(_) => ErrorCategory::Model,
            Self::IoError(_) | Self::SerializationError(_) | Self::CsvError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // Integrity problems are absorbed by the fallback model.
            ErrorCategory::Model => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the command line tools.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            Self::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            Self::ModelIntegrity(e) => format!("The decision tree model is unusable: {}", e),
            Self::IoError(e) => format!("File access failed: {}", e),
            Self::SerializationError(e) => format!("Could not read JSON data: {}", e),
            Self::CsvError(e) => format!("Could not write CSV report: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => {
                "Usage: reimburse <trip_days> <miles> <receipts> (days is a whole number, miles and receipts are non-negative)"
            }
            ErrorCategory::Configuration => {
                "Check the configuration file against the documented keys"
            }
            ErrorCategory::Model => {
                "Regenerate the model file; estimates use the fallback formula until then"
            }
            ErrorCategory::System => "Check that the file exists and is readable",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReimburseError>;
