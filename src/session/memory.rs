use super::backend::{Backend, InsertOutcome};
use crate::core::{ModelError, Result, Value};
use crate::identity::IdentityStrategy;
use crate::model::{ColumnDef, ColumnOrigin, ModelDescriptor};
use crate::naming::ConstraintRole;
use crate::projection::Mapping;
use crate::registry::extension::check_format;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{Level, event};

#[derive(Debug, Default)]
struct TableData {
    rows: Vec<Mapping>,
    next_id: i64,
}

impl TableData {
    fn new(model: &ModelDescriptor) -> Self {
        Self {
            rows: Vec::new(),
            next_id: model.sequence().map(|seq| seq.start).unwrap_or(1),
        }
    }

    fn position(&self, pk: &str, key: &Value) -> Option<usize> {
        self.rows.iter().position(|row| row.get(pk) == Some(key))
    }
}

/// In-process [`Backend`]: one row list per table behind a single lock.
///
/// Enforces primary key and unique constraints, NOT NULL and column types.
/// Foreign keys are not checked.
#[derive(Debug)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, TableData>>,
    next_sentinel: AtomicI64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_sentinel: AtomicI64::new(1),
        }
    }

    /// Number of stored rows in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(|data| data.rows.len())
            .unwrap_or(0)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn check_value(col: &ColumnDef, value: &Value) -> Result<()> {
    if value.is_null() && !col.nullable {
        return Err(ModelError::ConstraintViolation(format!(
            "Column '{}' cannot be NULL",
            col.name
        )));
    }
    if !col.column_type.accepts(value) {
        return Err(ModelError::TypeMismatch(format!(
            "Column '{}' expects type {}, got {}",
            col.name,
            col.column_type,
            value.type_name()
        )));
    }
    check_format(&col.name, col.semantic, value)
}

fn check_known_columns(model: &ModelDescriptor, row: &Mapping) -> Result<()> {
    match row.keys().find(|key| !model.has_column(key)) {
        Some(unknown) => Err(ModelError::unknown_column(model.table_name(), unknown)),
        None => Ok(()),
    }
}

/// Rejects `row` if one of its unique values is already held by another row.
fn check_unique(
    model: &ModelDescriptor,
    rows: &[Mapping],
    row: &Mapping,
    skip: Option<usize>,
) -> Result<()> {
    for col in model.columns().iter().filter(|c| c.unique) {
        let Some(value) = row.get(&col.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let taken = rows
            .iter()
            .enumerate()
            .any(|(idx, other)| Some(idx) != skip && other.get(&col.name) == Some(value));
        if taken {
            let name = model
                .constraint_name(ConstraintRole::Unique, &col.name)
                .unwrap_or(&col.name);
            return Err(ModelError::ConstraintViolation(format!(
                "duplicate value {} violates unique constraint '{}'",
                value, name
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn insert(&self, model: &ModelDescriptor, row: Mapping) -> Result<InsertOutcome> {
        check_known_columns(model, &row)?;

        let mut tables = self.tables.write().await;
        let data = tables
            .entry(model.table_name().to_string())
            .or_insert_with(|| TableData::new(model));

        let mut outcome = InsertOutcome::default();
        let mut stored = Mapping::new();
        for col in model.columns() {
            let given = row.get(&col.name).filter(|v| !v.is_null()).cloned();
            let value = match col.origin {
                ColumnOrigin::Identity => match (model.identity(), given) {
                    (IdentityStrategy::Sequential, None) => {
                        let id = data.next_id;
                        outcome.identity = Some(id);
                        Value::Integer(id)
                    }
                    (_, Some(value)) => value,
                    (IdentityStrategy::Random { .. }, None) => Value::Null,
                },
                // Server-populated; a caller value is ignored.
                ColumnOrigin::Sentinel => {
                    let marker = self.next_sentinel.fetch_add(1, Ordering::SeqCst);
                    outcome.insert_sentinel = Some(marker);
                    Value::Integer(marker)
                }
                ColumnOrigin::Declared | ColumnOrigin::Audit => given.unwrap_or(Value::Null),
            };
            check_value(col, &value)?;
            stored.insert(col.name.clone(), value);
        }

        let pk = model.primary_key();
        if let Some(key) = stored.get(&pk.name) {
            if data.position(&pk.name, key).is_some() {
                return Err(ModelError::ConstraintViolation(format!(
                    "duplicate key {} violates primary key '{}'",
                    key,
                    model.primary_key_name()
                )));
            }
        }
        check_unique(model, &data.rows, &stored, None)?;

        if model.identity() == &IdentityStrategy::Sequential {
            if let Some(id) = stored.get(&pk.name).and_then(Value::as_i64) {
                data.next_id = data.next_id.max(id.saturating_add(1));
            }
        }
        data.rows.push(stored);

        event!(
            Level::TRACE,
            table = model.table_name(),
            rows = data.rows.len(),
            "row inserted"
        );
        Ok(outcome)
    }

    async fn update(&self, model: &ModelDescriptor, key: &Value, changes: Mapping) -> Result<()> {
        check_known_columns(model, &changes)?;
        let pk = model.primary_key();
        if changes.get(&pk.name).is_some_and(|v| v != key) {
            return Err(ModelError::ConstraintViolation(format!(
                "primary key of '{}' cannot change",
                model.table_name()
            )));
        }

        let mut tables = self.tables.write().await;
        let data = tables
            .get_mut(model.table_name())
            .ok_or_else(|| ModelError::NotFound(format!("{} {}", model.table_name(), key)))?;
        let idx = data
            .position(&pk.name, key)
            .ok_or_else(|| ModelError::NotFound(format!("{} {}", model.table_name(), key)))?;

        let mut updated = data.rows[idx].clone();
        for (name, value) in changes {
            if let Some(col) = model.column(&name) {
                check_value(col, &value)?;
            }
            updated.insert(name, value);
        }
        check_unique(model, &data.rows, &updated, Some(idx))?;
        data.rows[idx] = updated;
        Ok(())
    }

    async fn delete(&self, model: &ModelDescriptor, key: &Value) -> Result<()> {
        let pk = &model.primary_key().name;
        let mut tables = self.tables.write().await;
        let removed = tables.get_mut(model.table_name()).and_then(|data| {
            let idx = data.position(pk, key)?;
            Some(data.rows.remove(idx))
        });
        match removed {
            Some(_) => Ok(()),
            None => Err(ModelError::NotFound(format!(
                "{} {}",
                model.table_name(),
                key
            ))),
        }
    }

    async fn fetch(&self, model: &ModelDescriptor, key: &Value) -> Result<Option<Mapping>> {
        let pk = &model.primary_key().name;
        let tables = self.tables.read().await;
        Ok(tables.get(model.table_name()).and_then(|data| {
            data.position(pk, key).map(|idx| data.rows[idx].clone())
        }))
    }

    async fn scan(&self, model: &ModelDescriptor) -> Result<Vec<Mapping>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(model.table_name())
            .map(|data| data.rows.clone())
            .unwrap_or_default())
    }
}
