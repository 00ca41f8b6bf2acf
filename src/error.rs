use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Required column missing from batch: {0}")]
    MissingColumn(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for PipelineError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            // A table missing an expected column is fatal to the whole
            // invocation, not a per-row condition.
            rusqlite::Error::InvalidColumnName(name) => PipelineError::MissingColumn(name),
            other => PipelineError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
