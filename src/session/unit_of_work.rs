use super::engine::Engine;
use super::listener::DirtySet;
use crate::core::{ModelError, Result, Value};
use crate::entity::{Entity, Record};
use crate::identity::Identity;
use crate::model::ModelDescriptor;
use crate::projection::{Mapping, to_mapping};
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

/// Handle to an entity tracked by a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Added, not yet inserted.
    Pending,
    /// Known to the backend.
    Persistent,
    /// Persistent, marked for deletion at the next flush.
    Deleted,
}

struct Tracked {
    entity: Box<dyn Entity>,
    state: EntityState,
    dirty: bool,
}

/// What a flush wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// Unit of work over an [`Engine`].
///
/// Tracks added, loaded, modified and deleted entities and writes them out on
/// [`flush`](Session::flush): listeners first (synchronously, on the modified
/// persistent entities), then inserts, updates and deletes in that order.
/// A failed flush stops at the first backend error; everything not yet
/// written stays queued.
pub struct Session {
    engine: Engine,
    slots: Vec<Option<Tracked>>,
}

impl Session {
    pub(crate) fn new(engine: Engine) -> Self {
        Self {
            engine,
            slots: Vec::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    // ========================================================================
    // Tracking
    // ========================================================================

    /// Queues a new entity for insertion.
    pub fn add<E: Entity>(&mut self, entity: E) -> Result<EntityKey> {
        self.add_boxed(Box::new(entity))
    }

    pub fn add_boxed(&mut self, entity: Box<dyn Entity>) -> Result<EntityKey> {
        self.registered_model(entity.descriptor().table_name())?;
        if let Some(existing) = self.find(entity.descriptor(), entity.identity()) {
            return Err(ModelError::ConstraintViolation(format!(
                "{} {} is already tracked as {:?}",
                entity.descriptor().table_name(),
                entity.identity(),
                existing
            )));
        }
        Ok(self.track(entity, EntityState::Pending))
    }

    pub fn get(&self, key: EntityKey) -> Option<&dyn Entity> {
        self.tracked(key).map(|t| t.entity.as_ref())
    }

    /// Typed access to a tracked entity.
    pub fn get_as<T: Entity>(&self, key: EntityKey) -> Option<&T> {
        self.get(key)?.as_any().downcast_ref::<T>()
    }

    pub fn state(&self, key: EntityKey) -> Option<EntityState> {
        self.tracked(key).map(|t| t.state)
    }

    /// Mutates a tracked entity and marks it modified.
    pub fn modify<R>(&mut self, key: EntityKey, f: impl FnOnce(&mut dyn Entity) -> R) -> Result<R> {
        let tracked = self.live_mut(key)?;
        tracked.dirty = true;
        Ok(f(tracked.entity.as_mut()))
    }

    /// Typed [`modify`](Session::modify).
    pub fn modify_as<T: Entity, R>(&mut self, key: EntityKey, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let tracked = self.live_mut(key)?;
        let entity = tracked
            .entity
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| ModelError::TypeMismatch(format!("{:?} is not the requested type", key)))?;
        tracked.dirty = true;
        Ok(f(entity))
    }

    pub fn set(&mut self, key: EntityKey, column: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let tracked = self.live_mut(key)?;
        tracked.entity.set_attribute(column, value)?;
        tracked.dirty = true;
        Ok(())
    }

    /// Marks an entity for deletion. A pending entity is simply dropped.
    pub fn delete(&mut self, key: EntityKey) -> Result<()> {
        let tracked = self.live_mut(key)?;
        if tracked.state == EntityState::Pending {
            self.slots[key.0] = None;
        } else {
            tracked.state = EntityState::Deleted;
        }
        Ok(())
    }

    /// Stops tracking an entity and hands it back, unflushed changes included.
    pub fn expunge(&mut self, key: EntityKey) -> Option<Box<dyn Entity>> {
        self.slots.get_mut(key.0)?.take().map(|t| t.entity)
    }

    pub fn is_dirty(&self, key: EntityKey) -> bool {
        self.tracked(key).is_some_and(|t| t.dirty)
    }

    /// Modified persistent entities waiting for the next flush.
    pub fn dirty_count(&self) -> usize {
        self.iter_state(EntityState::Persistent)
            .filter(|t| t.dirty)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.iter_state(EntityState::Pending).count()
    }

    pub fn deleted_count(&self) -> usize {
        self.iter_state(EntityState::Deleted).count()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Loads a row by primary key. An entity already tracked under the same
    /// identity is returned as is.
    pub async fn load(&mut self, table: &str, id: impl Into<Value>) -> Result<Option<EntityKey>> {
        self.load_columns(table, id.into(), None).await
    }

    /// Loads a row with only `columns` (plus the primary key) populated; every
    /// other attribute stays unloaded.
    pub async fn load_only(
        &mut self,
        table: &str,
        id: impl Into<Value>,
        columns: &[&str],
    ) -> Result<Option<EntityKey>> {
        self.load_columns(table, id.into(), Some(columns)).await
    }

    /// Loads every row of `table`.
    pub async fn load_all(&mut self, table: &str) -> Result<Vec<EntityKey>> {
        let model = self.registered_model(table)?;
        let rows = self.engine.backend().scan(&model).await?;
        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            keys.push(self.adopt_row(&model, &row)?);
        }
        Ok(keys)
    }

    async fn load_columns(
        &mut self,
        table: &str,
        id: Value,
        columns: Option<&[&str]>,
    ) -> Result<Option<EntityKey>> {
        let model = self.registered_model(table)?;
        if let Some(columns) = columns {
            if let Some(unknown) = columns.iter().find(|c| !model.has_column(c)) {
                return Err(ModelError::unknown_column(table, *unknown));
            }
        }

        let Some(row) = self.engine.backend().fetch(&model, &id).await? else {
            return Ok(None);
        };
        let row = match columns {
            Some(columns) => {
                let pk = model.primary_key().name.as_str();
                row.into_iter()
                    .filter(|(name, _)| name == pk || columns.contains(&name.as_str()))
                    .collect::<Mapping>()
            }
            None => row,
        };
        self.adopt_row(&model, &row).map(Some)
    }

    fn adopt_row(&mut self, model: &Arc<ModelDescriptor>, row: &Mapping) -> Result<EntityKey> {
        let record = Record::from_row(model.clone(), row)?;
        if let Some(existing) = self.find(model, record.identity()) {
            return Ok(existing);
        }
        Ok(self.track(Box::new(record), EntityState::Persistent))
    }

    // ========================================================================
    // Flush
    // ========================================================================

    pub async fn flush(&mut self) -> Result<FlushReport> {
        let span = info_span!(
            "session.flush",
            pending = self.pending_count(),
            dirty = self.dirty_count(),
            deleted = self.deleted_count()
        );
        self.flush_inner().instrument(span).await
    }

    /// Flush, then forget the flushed state. Entities stay tracked as
    /// persistent and clean.
    pub async fn commit(&mut self) -> Result<FlushReport> {
        let report = self.flush().await?;
        event!(
            Level::DEBUG,
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            "session committed"
        );
        Ok(report)
    }

    /// Drops every tracked entity, flushed or not.
    pub fn rollback(&mut self) {
        let discarded = self.len();
        self.slots.clear();
        event!(Level::DEBUG, discarded, "session rolled back");
    }

    async fn flush_inner(&mut self) -> Result<FlushReport> {
        let mut report = FlushReport::default();
        if self.pending_count() == 0 && self.dirty_count() == 0 && self.deleted_count() == 0 {
            return Ok(report);
        }

        self.run_listeners();
        let backend = self.engine.backend().clone();

        for idx in 0..self.slots.len() {
            let Some(tracked) = self.slots[idx].as_mut() else {
                continue;
            };
            if tracked.state != EntityState::Pending {
                continue;
            }
            let model = tracked.entity.descriptor().clone();
            let row = to_mapping(tracked.entity.as_ref(), None);
            let outcome = backend.insert(&model, row).await?;
            if let Some(id) = outcome.identity {
                tracked.entity.assign_identity(Identity::Sequence(Some(id)));
            }
            if let Some(marker) = outcome.insert_sentinel {
                tracked.entity.record_insert_sentinel(marker);
            }
            tracked.state = EntityState::Persistent;
            tracked.dirty = false;
            report.inserted += 1;
        }

        for idx in 0..self.slots.len() {
            let Some(tracked) = self.slots[idx].as_mut() else {
                continue;
            };
            if tracked.state != EntityState::Persistent || !tracked.dirty {
                continue;
            }
            let model = tracked.entity.descriptor().clone();
            let key = identity_value(&model, tracked.entity.identity())?;
            let pk = model.primary_key().name.as_str();
            let exclude = [pk];
            let changes = to_mapping(tracked.entity.as_ref(), Some(&exclude[..]));
            backend.update(&model, &key, changes).await?;
            tracked.dirty = false;
            report.updated += 1;
        }

        for idx in 0..self.slots.len() {
            let Some(tracked) = self.slots[idx].as_ref() else {
                continue;
            };
            if tracked.state != EntityState::Deleted {
                continue;
            }
            let model = tracked.entity.descriptor().clone();
            let key = identity_value(&model, tracked.entity.identity())?;
            backend.delete(&model, &key).await?;
            self.slots[idx] = None;
            report.deleted += 1;
        }

        event!(
            Level::DEBUG,
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            "session flushed"
        );
        Ok(report)
    }

    fn run_listeners(&mut self) {
        let engine = self.engine.clone();
        let listeners = engine.listeners();
        if listeners.is_empty() {
            return;
        }

        let mut entities: Vec<&mut dyn Entity> = Vec::new();
        for tracked in self.slots.iter_mut().flatten() {
            if tracked.state == EntityState::Persistent && tracked.dirty {
                entities.push(tracked.entity.as_mut());
            }
        }
        let mut dirty = DirtySet::new(entities);
        for listener in listeners {
            listener.before_flush(&mut dirty);
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn registered_model(&self, table: &str) -> Result<Arc<ModelDescriptor>> {
        self.engine
            .registry()
            .model(table)
            .cloned()
            .ok_or_else(|| ModelError::NotFound(format!("model for table '{}'", table)))
    }

    fn track(&mut self, entity: Box<dyn Entity>, state: EntityState) -> EntityKey {
        self.slots.push(Some(Tracked {
            entity,
            state,
            dirty: false,
        }));
        EntityKey(self.slots.len() - 1)
    }

    fn find(&self, model: &ModelDescriptor, identity: Identity) -> Option<EntityKey> {
        if !identity.is_assigned() {
            return None;
        }
        self.slots.iter().enumerate().find_map(|(idx, slot)| {
            let tracked = slot.as_ref()?;
            let same = tracked.entity.descriptor().table_name() == model.table_name()
                && tracked.entity.identity() == identity;
            same.then_some(EntityKey(idx))
        })
    }

    fn tracked(&self, key: EntityKey) -> Option<&Tracked> {
        self.slots.get(key.0)?.as_ref()
    }

    fn live_mut(&mut self, key: EntityKey) -> Result<&mut Tracked> {
        self.slots
            .get_mut(key.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| ModelError::NotFound(format!("{:?} is not tracked", key)))
    }

    fn iter_state(&self, state: EntityState) -> impl Iterator<Item = &Tracked> {
        self.slots.iter().flatten().filter(move |t| t.state == state)
    }
}

fn identity_value(model: &ModelDescriptor, identity: Identity) -> Result<Value> {
    identity.value().ok_or_else(|| {
        ModelError::NotFound(format!(
            "{} row has no assigned primary key",
            model.table_name()
        ))
    })
}
