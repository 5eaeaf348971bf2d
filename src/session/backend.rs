use crate::core::{Result, Value};
use crate::model::ModelDescriptor;
use crate::projection::Mapping;
use async_trait::async_trait;

/// Values the store filled in while inserting a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Sequence value drawn for a sequential primary key.
    pub identity: Option<i64>,
    /// Insertion order marker, for models that carry one.
    pub insert_sentinel: Option<i64>,
}

/// Row store the unit of work flushes into.
///
/// Rows travel as [`Mapping`]s keyed by column name. A missing key on insert
/// means "let the store decide" (sequence ids, sentinel); on update it means
/// "leave unchanged".
#[async_trait]
pub trait Backend: Send + Sync {
    async fn insert(&self, model: &ModelDescriptor, row: Mapping) -> Result<InsertOutcome>;

    async fn update(&self, model: &ModelDescriptor, key: &Value, changes: Mapping) -> Result<()>;

    async fn delete(&self, model: &ModelDescriptor, key: &Value) -> Result<()>;

    async fn fetch(&self, model: &ModelDescriptor, key: &Value) -> Result<Option<Mapping>>;

    /// Every row of the model's table.
    async fn scan(&self, model: &ModelDescriptor) -> Result<Vec<Mapping>>;
}
