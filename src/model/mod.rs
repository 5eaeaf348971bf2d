// ============================================================================
// Model Declarations
// ============================================================================
//
// A model is declared once through ModelBuilder and resolved by the registry
// into an immutable ModelDescriptor: table name, ordered columns, named
// constraints and (for sequential identities) the table's sequence.
//
// ============================================================================

pub mod builder;
pub mod ddl;
pub mod descriptor;

pub use builder::ModelBuilder;
pub use descriptor::{ColumnDef, ColumnOrigin, ModelDescriptor, NamedConstraint};
