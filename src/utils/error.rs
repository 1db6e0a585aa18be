use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("A movie title or a spreadsheet file is required")]
    InputMissing,

    #[error("Spreadsheet error: {message}")]
    Spreadsheet { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("XML processing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl MetaError {
    pub fn spreadsheet(message: impl Into<String>) -> Self {
        MetaError::Spreadsheet {
            message: message.into(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MetaError::InputMissing => "Pass --title <TITLE> or --input <FILE>",
            MetaError::Spreadsheet { .. }
            | MetaError::ZipError(_)
            | MetaError::XmlError(_)
            | MetaError::CsvError(_) => {
                "Check that the input is a valid .xlsx or .csv file with titles in the first column"
            }
            MetaError::ApiError(_) => "Check network connectivity or enable the CORS proxy",
            MetaError::IoError(_) => "Check file paths and permissions",
            MetaError::SerializationError(_) => "The provider returned an unexpected payload",
            MetaError::ConfigError { .. }
            | MetaError::MissingConfigError { .. }
            | MetaError::InvalidConfigValueError { .. }
            | MetaError::ValidationError { .. } => {
                "Review the TOML config or the KMDB_SERVICE_KEY / OMDB_API_KEY environment variables"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MetaError>;

/// 單一來源查詢失敗的原因，由 resolver 在本地處理並觸發備援
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider}: no usable result ({reason})")]
    NotFound {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider}: call failed ({reason})")]
    CallFailed {
        provider: &'static str,
        reason: String,
    },
}

impl ProviderError {
    pub fn not_found(provider: &'static str, reason: impl Into<String>) -> Self {
        ProviderError::NotFound {
            provider,
            reason: reason.into(),
        }
    }

    pub fn call_failed(provider: &'static str, err: impl std::fmt::Display) -> Self {
        ProviderError::CallFailed {
            provider,
            reason: err.to_string(),
        }
    }
}
