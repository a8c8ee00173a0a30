use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoalsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid year-month token '{0}': expected YYYY-MM or MM/YYYY")]
    InvalidYearMonth(String),

    #[error("No active data sources in the index")]
    NoActiveSources,

    #[error("No data: {0}")]
    NoData(String),

    #[error("Source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Unknown brand: {0}")]
    UnknownBrand(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for GoalsError {
    fn from(e: serde_json::Error) -> Self {
        GoalsError::SerializationError(e.to_string())
    }
}
