use super::backend::Backend;
use super::config::EngineConfig;
use super::listener::{FlushListener, TouchUpdatedTimestamp};
use super::memory::MemoryBackend;
use super::unit_of_work::Session;
use crate::core::{ModelError, Result};
use crate::entity::Record;
use crate::registry::EntityRegistry;
use std::sync::Arc;
use tracing::{Level, event};

struct EngineInner {
    registry: Arc<EntityRegistry>,
    backend: Arc<dyn Backend>,
    listeners: Vec<Arc<dyn FlushListener>>,
    config: EngineConfig,
}

/// Shared entry point for sessions: the registry, the backend and the flush
/// listeners installed once for every session it opens.
///
/// Cloning is cheap; clones share everything.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn builder(registry: Arc<EntityRegistry>, backend: Arc<dyn Backend>) -> EngineBuilder {
        EngineBuilder {
            registry,
            backend,
            listeners: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Engine over a fresh [`MemoryBackend`] with the default configuration.
    pub fn in_memory(registry: Arc<EntityRegistry>) -> Self {
        Self::builder(registry, Arc::new(MemoryBackend::new())).build()
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.inner.registry
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn session(&self) -> Session {
        Session::new(self.clone())
    }

    /// New transient [`Record`] of the model mapped to `table`, stamped with
    /// the engine clock.
    pub fn new_record(&self, table: &str) -> Result<Record> {
        let model = self
            .inner
            .registry
            .model(table)
            .ok_or_else(|| ModelError::NotFound(format!("model for table '{}'", table)))?;
        Ok(Record::new_at(model.clone(), self.inner.config.clock.now()))
    }

    pub fn listener_names(&self) -> Vec<&'static str> {
        self.inner.listeners.iter().map(|l| l.name()).collect()
    }

    pub(crate) fn listeners(&self) -> &[Arc<dyn FlushListener>] {
        &self.inner.listeners
    }
}

pub struct EngineBuilder {
    registry: Arc<EntityRegistry>,
    backend: Arc<dyn Backend>,
    listeners: Vec<Arc<dyn FlushListener>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a flush listener. A listener whose name is already registered is
    /// ignored.
    pub fn listen(mut self, listener: Arc<dyn FlushListener>) -> Self {
        if self.listeners.iter().any(|l| l.name() == listener.name()) {
            event!(
                Level::DEBUG,
                listener = listener.name(),
                "flush listener already registered"
            );
            return self;
        }
        self.listeners.push(listener);
        self
    }

    pub fn build(mut self) -> Engine {
        let has_touch = self
            .listeners
            .iter()
            .any(|l| l.name() == TouchUpdatedTimestamp::NAME);
        if self.config.touch_updated_timestamp && !has_touch {
            let touch = TouchUpdatedTimestamp::new(self.config.clock.clone());
            self.listeners.insert(0, Arc::new(touch));
        }

        event!(
            Level::INFO,
            models = self.registry.len(),
            listeners = self.listeners.len(),
            "engine ready"
        );
        Engine {
            inner: Arc::new(EngineInner {
                registry: self.registry,
                backend: self.backend,
                listeners: self.listeners,
                config: self.config,
            }),
        }
    }
}
