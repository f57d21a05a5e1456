/// Domain-specific error types for phrasemine
///
/// Record-level errors (bad column, bad weight) skip one input line.
/// Training errors abort one query. Missing mappings drop one phrase.
/// None of them stop a run on their own.

#[derive(Debug, thiserror::Error)]
pub enum MineError {
    #[error("Column {column} is not a valid column (total columns: {available})")]
    InvalidColumnIndex {
        column: usize,
        available: usize,
    },

    #[error("Malformed weight '{value}': {reason}")]
    MalformedWeight {
        value: String,
        reason: String,
    },

    #[error("Model training failed for query '{query}': {message}")]
    ModelTraining {
        query: String,
        message: String,
    },

    #[error("No textual mapping for '{0}'")]
    MissingCanonicalMapping(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MineError {
    /// Helper to create weight errors from a raw field value
    ///
    /// Example:
    /// ```
    /// use phrasemine::errors::MineError;
    /// let err = MineError::malformed_weight("1e-x", "not a number");
    /// ```
    pub fn malformed_weight(value: &str, reason: &str) -> Self {
        MineError::MalformedWeight {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error only concerns the current record and the run can continue.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            MineError::InvalidColumnIndex { .. } | MineError::MalformedWeight { .. }
        )
    }
}
