use crate::core::{ColumnType, ForeignKeyRef, SemanticType};
use crate::identity::{IdentityStrategy, SequenceDef};
use crate::naming::ConstraintRole;

/// Which capability contributed a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnOrigin {
    Identity,
    Declared,
    Audit,
    /// Server-populated bookkeeping column, never projected.
    Sentinel,
}

/// A fully resolved column of a declared model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub semantic: SemanticType,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub index: bool,
    pub foreign_key: Option<ForeignKeyRef>,
    pub origin: ColumnOrigin,
}

impl ColumnDef {
    pub(crate) fn capability(
        name: &str,
        semantic: SemanticType,
        column_type: ColumnType,
        origin: ColumnOrigin,
    ) -> Self {
        Self {
            name: name.to_string(),
            semantic,
            column_type,
            nullable: false,
            primary_key: false,
            unique: false,
            index: false,
            foreign_key: None,
            origin,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.origin == ColumnOrigin::Sentinel
    }
}

/// A named schema constraint or index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedConstraint {
    pub role: ConstraintRole,
    pub name: String,
    pub columns: Vec<String>,
    pub references: Option<ForeignKeyRef>,
    pub expression: Option<String>,
}

/// Immutable description of a declared entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub(crate) type_name: String,
    pub(crate) table_name: String,
    pub(crate) identity: IdentityStrategy,
    pub(crate) audited: bool,
    pub(crate) columns: Vec<ColumnDef>,
    pub(crate) constraints: Vec<NamedConstraint>,
    pub(crate) sequence: Option<SequenceDef>,
}

impl ModelDescriptor {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn identity(&self) -> &IdentityStrategy {
        &self.identity
    }

    pub fn is_audited(&self) -> bool {
        self.audited
    }

    /// Columns in declaration order: identity, declared, audit, sentinel.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    pub fn declared_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(|col| col.origin == ColumnOrigin::Declared)
    }

    pub fn primary_key(&self) -> &ColumnDef {
        // The builder always emits the identity column first.
        &self.columns[0]
    }

    pub fn sentinel_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|col| col.is_internal())
    }

    pub fn constraints(&self) -> &[NamedConstraint] {
        &self.constraints
    }

    pub fn sequence(&self) -> Option<&SequenceDef> {
        self.sequence.as_ref()
    }

    /// Name of the first constraint of `role` covering `column`.
    pub fn constraint_name(&self, role: ConstraintRole, column: &str) -> Option<&str> {
        self.constraints
            .iter()
            .find(|c| c.role == role && c.columns.iter().any(|name| name == column))
            .map(|c| c.name.as_str())
    }

    pub fn primary_key_name(&self) -> &str {
        self.constraints
            .iter()
            .find(|c| c.role == ConstraintRole::PrimaryKey)
            .map(|c| c.name.as_str())
            .unwrap_or(&self.table_name)
    }
}
