use super::Entity;
use crate::audit::{AuditStamps, CREATED_AT_COLUMN, UPDATED_AT_COLUMN};
use crate::core::{ModelError, Result, Value};
use crate::identity::Identity;
use crate::model::{ColumnOrigin, ModelDescriptor};
use crate::projection::Mapping;
use crate::registry::extension::check_format;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Dynamic entity backed by a column → value map.
///
/// Declared columns absent from the map are unloaded: a new record has no
/// declared attribute loaded until it is set, and a record built from a
/// partial row only has the columns that row carried.
#[derive(Debug, Clone)]
pub struct Record {
    descriptor: Arc<ModelDescriptor>,
    identity: Identity,
    values: BTreeMap<String, Value>,
    audit: Option<AuditStamps>,
    insert_sentinel: Option<i64>,
}

impl Record {
    pub fn new(descriptor: Arc<ModelDescriptor>) -> Self {
        Self::new_at(descriptor, Utc::now())
    }

    /// New transient record whose audit stamps (if any) read `now`.
    pub fn new_at(descriptor: Arc<ModelDescriptor>, now: DateTime<Utc>) -> Self {
        let identity = descriptor.identity().generate();
        let audit = descriptor.is_audited().then(|| AuditStamps::new(now));
        Self {
            descriptor,
            identity,
            values: BTreeMap::new(),
            audit,
            insert_sentinel: None,
        }
    }

    /// Rebuilds a record from a stored row. Columns missing from `row` stay
    /// unloaded, each audit stamp included.
    pub fn from_row(descriptor: Arc<ModelDescriptor>, row: &Mapping) -> Result<Self> {
        let pk = descriptor.primary_key();
        let identity = match row.get(&pk.name) {
            Some(value) => Identity::from_value(descriptor.identity(), value).ok_or_else(|| {
                ModelError::TypeMismatch(format!(
                    "primary key of '{}' expects {}, got {}",
                    descriptor.table_name(),
                    pk.column_type,
                    value.type_name()
                ))
            })?,
            None => {
                return Err(ModelError::NotFound(format!(
                    "row for '{}' has no primary key",
                    descriptor.table_name()
                )));
            }
        };

        let mut values = BTreeMap::new();
        let mut insert_sentinel = None;
        for col in descriptor.columns() {
            let Some(value) = row.get(&col.name) else {
                continue;
            };
            match col.origin {
                ColumnOrigin::Declared => {
                    values.insert(col.name.clone(), value.clone());
                }
                ColumnOrigin::Sentinel => insert_sentinel = value.as_i64(),
                ColumnOrigin::Identity | ColumnOrigin::Audit => {}
            }
        }

        let audit = descriptor.is_audited().then(|| {
            AuditStamps::restore(
                row.get(CREATED_AT_COLUMN).and_then(Value::as_timestamp),
                row.get(UPDATED_AT_COLUMN).and_then(Value::as_timestamp),
            )
        });

        Ok(Self {
            descriptor,
            identity,
            values,
            audit,
            insert_sentinel,
        })
    }

    /// Builder-style [`Entity::set_attribute`].
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Result<Self> {
        self.set_attribute(column, value.into())?;
        Ok(self)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn insert_sentinel(&self) -> Option<i64> {
        self.insert_sentinel
    }

    pub fn is_loaded(&self, column: &str) -> bool {
        match self.descriptor.column(column).map(|c| c.origin) {
            Some(ColumnOrigin::Identity) => self.identity.is_assigned(),
            Some(ColumnOrigin::Declared) => self.values.contains_key(column),
            Some(ColumnOrigin::Audit) => {
                let stamps = self.audit.as_ref();
                match column {
                    CREATED_AT_COLUMN => stamps.and_then(AuditStamps::created_at).is_some(),
                    UPDATED_AT_COLUMN => stamps.and_then(AuditStamps::updated_at).is_some(),
                    _ => false,
                }
            }
            Some(ColumnOrigin::Sentinel) => self.insert_sentinel.is_some(),
            None => false,
        }
    }

    /// Columns of the model that currently hold no in-memory value.
    pub fn unloaded(&self) -> Vec<&str> {
        self.descriptor
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !self.is_loaded(name))
            .collect()
    }
}

impl Entity for Record {
    fn descriptor(&self) -> &Arc<ModelDescriptor> {
        &self.descriptor
    }

    fn identity(&self) -> Identity {
        self.identity
    }

    fn assign_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    fn attribute(&self, column: &str) -> Option<Value> {
        self.values.get(column).cloned()
    }

    fn set_attribute(&mut self, column: &str, value: Value) -> Result<()> {
        let col = self
            .descriptor
            .column(column)
            .filter(|c| c.origin == ColumnOrigin::Declared)
            .ok_or_else(|| ModelError::unknown_column(self.descriptor.table_name(), column))?;

        if value.is_null() && !col.nullable {
            return Err(ModelError::ConstraintViolation(format!(
                "Column '{}' cannot be NULL",
                column
            )));
        }
        if !col.column_type.accepts(&value) {
            return Err(ModelError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                column,
                col.column_type,
                value.type_name()
            )));
        }
        check_format(column, col.semantic, &value)?;

        self.values.insert(column.to_string(), value);
        Ok(())
    }

    fn audit(&self) -> Option<&AuditStamps> {
        self.audit.as_ref()
    }

    fn audit_mut(&mut self) -> Option<&mut AuditStamps> {
        self.audit.as_mut()
    }

    fn record_insert_sentinel(&mut self, marker: i64) {
        self.insert_sentinel = Some(marker);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
