use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceHubError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data source error: {0}")]
    SourceError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, PriceHubError>;

// 用于从字符串创建错误
impl From<String> for PriceHubError {
    fn from(s: String) -> Self {
        PriceHubError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for PriceHubError {
    fn from(s: &str) -> Self {
        PriceHubError::Unknown(s.to_string())
    }
}
