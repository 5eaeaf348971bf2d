// ============================================================================
// Schema Naming
// ============================================================================
//
// Deterministic names for tables (derived from type names) and for the
// constraints and indexes declared on them (template based, one fixed
// template per constraint role).
//
// ============================================================================

pub mod convention;
pub mod table;

pub use convention::{
    ConstraintRole, DEFAULT_MAX_IDENTIFIER_LENGTH, NameParts, NamingConvention,
};
pub use table::{table_name_for, validate_identifier, validate_type_name};
