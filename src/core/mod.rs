pub mod error;
pub mod types;
pub mod value;

pub use error::{ExtensionError, ModelError, Result};
pub use types::{ColumnSpec, ColumnType, ForeignKeyRef, SemanticType};
pub use value::Value;
