use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Token signing failed: {0}")]
    TokenSigningError(#[from] jsonwebtoken::errors::Error),

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Firestore returned {status}: {message}")]
    FirestoreError { status: String, message: String },

    #[error("Failed to decode field '{field}': {reason}")]
    DecodeError { field: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 可重試 (網路暫時性錯誤)
    Medium,
    /// 處理或設定錯誤
    High,
    /// 系統錯誤
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::FirestoreError { .. } => ErrorCategory::Network,
            EtlError::AuthError { .. } | EtlError::TokenSigningError(_) => {
                ErrorCategory::Authentication
            }
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::CsvError(_) | EtlError::DecodeError { .. } => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Authentication
            | ErrorCategory::Configuration
            | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 對應嚴重程度的行程結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(_) => "Could not reach Firestore".to_string(),
            EtlError::FirestoreError { status, message } => {
                format!("Firestore rejected the request ({}): {}", status, message)
            }
            EtlError::AuthError { .. } | EtlError::TokenSigningError(_) => {
                "Could not authenticate with Google Cloud".to_string()
            }
            EtlError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            EtlError::IoError(e) => format!("File system error: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity, the project id and the Firestore endpoint, then rerun the export"
            }
            ErrorCategory::Authentication => {
                "Point GOOGLE_APPLICATION_CREDENTIALS (or --credentials) at a valid service account key"
            }
            ErrorCategory::Configuration => "Review the command line flags and the config file",
            ErrorCategory::Data => "Inspect the source documents for malformed values",
            ErrorCategory::System => "Check that the output path is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
