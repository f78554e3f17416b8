use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("CSV error: {0}")]
    CsvError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    pub fn is_missing_data(&self) -> bool {
        matches!(self, AppError::MissingData(_))
    }
}
