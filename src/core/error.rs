use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Table '{0}' already declared")]
    DuplicateTable(String),

    #[error("Column '{column}' declared twice on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Column '{column}' not found in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl ModelError {
    pub fn invalid_declaration(msg: impl Into<String>) -> Self {
        Self::InvalidDeclaration(msg.into())
    }

    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

impl<T> From<std::sync::PoisonError<T>> for ModelError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

/// Failure reported by an optional type extension while it is loaded.
///
/// Only [`ExtensionError::Unavailable`] is treated as a soft miss; every other
/// fault propagates out of registry construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("extension '{0}' is not available")]
    Unavailable(&'static str),

    #[error("extension '{name}' failed to load: {reason}")]
    Failed { name: &'static str, reason: String },
}

impl From<ExtensionError> for ModelError {
    fn from(err: ExtensionError) -> Self {
        Self::InvalidDeclaration(err.to_string())
    }
}
