use super::descriptor::{ColumnDef, ColumnOrigin, ModelDescriptor, NamedConstraint};
use crate::audit::{CREATED_AT_COLUMN, UPDATED_AT_COLUMN};
use crate::core::{ColumnSpec, ColumnType, ForeignKeyRef, ModelError, Result, SemanticType};
use crate::identity::{ID_COLUMN, INSERT_SENTINEL_COLUMN, IdentityStrategy, SequenceDef};
use crate::naming::{
    ConstraintRole, NamingConvention, table_name_for, validate_identifier, validate_type_name,
};
use crate::registry::TypeMap;
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct CheckSpec {
    label: String,
    expression: String,
}

/// Assembles a model declaration from capabilities: an identity strategy,
/// optional audit columns and the consumer's own columns.
///
/// Nothing is validated until the builder is registered; registration either
/// yields an immutable [`ModelDescriptor`] or fails with the first problem.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    type_name: String,
    table_name: Option<String>,
    identity: IdentityStrategy,
    audited: bool,
    columns: Vec<ColumnSpec>,
    checks: Vec<CheckSpec>,
}

impl ModelBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table_name: None,
            identity: IdentityStrategy::default(),
            audited: false,
            columns: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn identity(mut self, identity: IdentityStrategy) -> Self {
        self.identity = identity;
        self
    }

    /// Adds `created_at` / `updated_at`.
    pub fn audited(mut self) -> Self {
        self.audited = true;
        self
    }

    /// Overrides the table name derived from the type name.
    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn check(mut self, label: impl Into<String>, expression: impl Into<String>) -> Self {
        self.checks.push(CheckSpec {
            label: label.into(),
            expression: expression.into(),
        });
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn resolve(
        self,
        naming: &NamingConvention,
        types: &TypeMap,
    ) -> Result<ModelDescriptor> {
        validate_type_name(&self.type_name)?;

        let table_name = match &self.table_name {
            Some(explicit) => explicit.clone(),
            None => table_name_for(&self.type_name),
        };
        if let Err(err) = validate_identifier(&table_name, "table") {
            return Err(match self.identity {
                IdentityStrategy::Sequential => ModelError::invalid_declaration(format!(
                    "sequential identity on '{}' needs a resolvable table name: {}",
                    self.type_name, err
                )),
                _ => err,
            });
        }

        let mut reserved: HashSet<&str> = HashSet::from([ID_COLUMN]);
        if self.audited {
            reserved.insert(CREATED_AT_COLUMN);
            reserved.insert(UPDATED_AT_COLUMN);
        }
        if self.identity.has_insert_sentinel() {
            reserved.insert(INSERT_SENTINEL_COLUMN);
        }

        let mut columns = Vec::with_capacity(self.columns.len() + 4);
        let mut id_column = ColumnDef::capability(
            ID_COLUMN,
            match self.identity {
                IdentityStrategy::Sequential => SemanticType::BigInt,
                IdentityStrategy::Random { .. } => SemanticType::Uuid,
            },
            self.identity.column_type(),
            ColumnOrigin::Identity,
        );
        id_column.primary_key = true;
        columns.push(id_column);

        let mut seen: HashSet<String> = HashSet::new();
        for spec in &self.columns {
            validate_identifier(&spec.name, "column")?;
            if reserved.contains(spec.name.as_str()) || !seen.insert(spec.name.clone()) {
                return Err(ModelError::DuplicateColumn {
                    table: table_name.clone(),
                    column: spec.name.clone(),
                });
            }
            columns.push(resolve_column(&table_name, spec, types)?);
        }

        if self.audited {
            for name in [CREATED_AT_COLUMN, UPDATED_AT_COLUMN] {
                columns.push(ColumnDef::capability(
                    name,
                    SemanticType::Timestamp,
                    ColumnType::TimestampUtc,
                    ColumnOrigin::Audit,
                ));
            }
        }

        if self.identity.has_insert_sentinel() {
            let mut sentinel = ColumnDef::capability(
                INSERT_SENTINEL_COLUMN,
                SemanticType::BigInt,
                ColumnType::BigInt,
                ColumnOrigin::Sentinel,
            );
            sentinel.nullable = true;
            columns.push(sentinel);
        }

        let constraints = name_constraints(naming, &table_name, &columns, &self.checks)?;
        let sequence = match self.identity {
            IdentityStrategy::Sequential => Some(SequenceDef::for_table(&table_name)),
            IdentityStrategy::Random { .. } => None,
        };

        Ok(ModelDescriptor {
            type_name: self.type_name,
            table_name,
            identity: self.identity,
            audited: self.audited,
            columns,
            constraints,
            sequence,
        })
    }
}

fn resolve_column(table: &str, spec: &ColumnSpec, types: &TypeMap) -> Result<ColumnDef> {
    let base = match spec.column_type {
        Some(explicit) => explicit,
        None => types.resolve(spec.semantic).ok_or_else(|| {
            ModelError::invalid_declaration(format!(
                "column '{}.{}' uses semantic type '{}' which has no registered column type",
                table, spec.name, spec.semantic
            ))
        })?,
    };

    let column_type = match (base, spec.length) {
        (ColumnType::String(_), Some(len)) => ColumnType::String(Some(len)),
        (other, Some(_)) => {
            return Err(ModelError::invalid_declaration(format!(
                "column '{}.{}' of type {} cannot take a length",
                table, spec.name, other
            )));
        }
        (other, None) => other,
    };

    let foreign_key = spec
        .foreign_key
        .as_deref()
        .map(ForeignKeyRef::parse)
        .transpose()?;

    Ok(ColumnDef {
        name: spec.name.clone(),
        semantic: spec.semantic,
        column_type,
        nullable: spec.nullable,
        primary_key: false,
        unique: spec.unique,
        index: spec.index,
        foreign_key,
        origin: ColumnOrigin::Declared,
    })
}

fn name_constraints(
    naming: &NamingConvention,
    table: &str,
    columns: &[ColumnDef],
    checks: &[CheckSpec],
) -> Result<Vec<NamedConstraint>> {
    let mut constraints = Vec::new();

    let pk_columns: Vec<&str> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();
    constraints.push(NamedConstraint {
        role: ConstraintRole::PrimaryKey,
        name: naming.name_for(ConstraintRole::PrimaryKey, table, &pk_columns, None, None)?,
        columns: pk_columns.iter().map(|c| c.to_string()).collect(),
        references: None,
        expression: None,
    });

    for col in columns {
        let cols = [col.name.as_str()];
        if col.unique {
            constraints.push(NamedConstraint {
                role: ConstraintRole::Unique,
                name: naming.name_for(ConstraintRole::Unique, table, &cols, None, None)?,
                columns: vec![col.name.clone()],
                references: None,
                expression: None,
            });
        }
        if col.index {
            constraints.push(NamedConstraint {
                role: ConstraintRole::Index,
                name: naming.name_for(ConstraintRole::Index, table, &cols, None, None)?,
                columns: vec![col.name.clone()],
                references: None,
                expression: None,
            });
        }
        if let Some(fk) = &col.foreign_key {
            constraints.push(NamedConstraint {
                role: ConstraintRole::ForeignKey,
                name: naming.name_for(
                    ConstraintRole::ForeignKey,
                    table,
                    &cols,
                    Some(&fk.table),
                    None,
                )?,
                columns: vec![col.name.clone()],
                references: Some(fk.clone()),
                expression: None,
            });
        }
    }

    for check in checks {
        validate_identifier(&check.label, "check constraint label")?;
        if check.expression.trim().is_empty() {
            return Err(ModelError::invalid_declaration(format!(
                "check constraint '{}' on '{}' has an empty expression",
                check.label, table
            )));
        }
        constraints.push(NamedConstraint {
            role: ConstraintRole::Check,
            name: naming.name_for(ConstraintRole::Check, table, &[], None, Some(&check.label))?,
            columns: Vec::new(),
            references: None,
            expression: Some(check.expression.clone()),
        });
    }

    let mut names = HashSet::new();
    for constraint in &constraints {
        if !names.insert(constraint.name.as_str()) {
            return Err(ModelError::invalid_declaration(format!(
                "constraint name '{}' generated twice on '{}'",
                constraint.name, table
            )));
        }
    }

    Ok(constraints)
}
