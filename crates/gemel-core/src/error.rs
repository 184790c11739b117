use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvidentError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Unknown output metric: {0}")]
    UnknownMetric(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ProvidentError {
    fn from(e: serde_json::Error) -> Self {
        ProvidentError::SerializationError(e.to_string())
    }
}
