//! Error type shared by every matching stage.
//!
//! Each variant maps to a stable exit code so a front end can turn a failed run
//! into a process status without inspecting messages.

/// Errors raised by the deviation, selection and classification stages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    /// Row-count, grid or column-shape mismatch between tables.
    #[error("schema mismatch in {context}: {message}")]
    SchemaMismatch {
        context: &'static str,
        message: String,
    },

    /// A selected series name is absent from the live table.
    #[error("column '{column}' not found in {table} table")]
    MissingColumn { table: &'static str, column: String },

    /// A record is malformed or references an unknown series.
    #[error("key lookup failed: {0}")]
    KeyLookup(String),

    /// The caller required non-empty input (or output) and got none.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
}

impl MatchError {
    pub fn schema(context: &'static str, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            context,
            message: message.into(),
        }
    }

    pub fn missing(table: &'static str, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table,
            column: column.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            MatchError::SchemaMismatch { .. } => 2,
            MatchError::EmptyInput(_) => 3,
            MatchError::MissingColumn { .. } | MatchError::KeyLookup(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
