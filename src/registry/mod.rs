// ============================================================================
// Entity Registry
// ============================================================================
//
// Construct-once, read-only-after configuration shared by every model:
// the naming convention, the semantic type map and the declared models.
//
// RegistryBuilder is the only mutable phase. `finish()` consumes it and hands
// out an Arc<EntityRegistry> that exposes no mutating methods, so concurrent
// readers need no locking.
//
// ============================================================================

pub mod config;
pub mod extension;
pub mod type_map;

pub use config::RegistryConfig;
pub use extension::{TypeExtension, ValidatedStringTypes, default_extensions};
pub use type_map::TypeMap;

use crate::core::{ColumnType, ExtensionError, ModelError, Result, SemanticType};
use crate::model::{ModelBuilder, ModelDescriptor};
use crate::naming::NamingConvention;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Level, event};

#[derive(Debug)]
pub struct EntityRegistry {
    naming: NamingConvention,
    type_map: TypeMap,
    models: Vec<Arc<ModelDescriptor>>,
    by_table: HashMap<String, usize>,
    by_type: HashMap<String, usize>,
    loaded_extensions: Vec<&'static str>,
    unavailable_extensions: Vec<&'static str>,
}

impl EntityRegistry {
    pub fn builder(config: RegistryConfig) -> Result<RegistryBuilder> {
        RegistryBuilder::new(config)
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    pub fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    pub fn resolve_type(&self, semantic: SemanticType) -> Option<ColumnType> {
        self.type_map.resolve(semantic)
    }

    pub fn model(&self, table_name: &str) -> Option<&Arc<ModelDescriptor>> {
        self.by_table.get(table_name).map(|idx| &self.models[*idx])
    }

    pub fn model_for_type(&self, type_name: &str) -> Option<&Arc<ModelDescriptor>> {
        self.by_type.get(type_name).map(|idx| &self.models[*idx])
    }

    /// Declared models in registration order.
    pub fn models(&self) -> &[Arc<ModelDescriptor>] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn loaded_extensions(&self) -> &[&'static str] {
        &self.loaded_extensions
    }

    pub fn unavailable_extensions(&self) -> &[&'static str] {
        &self.unavailable_extensions
    }

    /// DDL for every model, in registration order.
    pub fn ddl_statements(&self) -> Vec<String> {
        self.models.iter().flat_map(|m| m.ddl_statements()).collect()
    }
}

/// Mutable declaration phase of an [`EntityRegistry`].
pub struct RegistryBuilder {
    registry: EntityRegistry,
}

impl RegistryBuilder {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let extensions = if config.load_extensions {
            default_extensions()
        } else {
            Vec::new()
        };
        Self::with_extensions(config, extensions)
    }

    /// Builds the type map from the base mapping plus whichever `extensions`
    /// are available. An unavailable extension only narrows the mapping; any
    /// other extension failure aborts construction.
    pub fn with_extensions(
        config: RegistryConfig,
        extensions: Vec<Box<dyn TypeExtension>>,
    ) -> Result<Self> {
        let mut type_map = TypeMap::base();
        let mut loaded = Vec::new();
        let mut unavailable = Vec::new();

        for extension in extensions {
            match extension.load() {
                Ok(entries) => {
                    event!(
                        Level::DEBUG,
                        extension = extension.name(),
                        entries = entries.len(),
                        "type extension loaded"
                    );
                    type_map.extend(entries);
                    loaded.push(extension.name());
                }
                Err(ExtensionError::Unavailable(name)) => {
                    event!(Level::DEBUG, extension = name, "type extension unavailable");
                    unavailable.push(name);
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Self {
            registry: EntityRegistry {
                naming: config.naming,
                type_map,
                models: Vec::new(),
                by_table: HashMap::new(),
                by_type: HashMap::new(),
                loaded_extensions: loaded,
                unavailable_extensions: unavailable,
            },
        })
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.registry.naming
    }

    pub fn type_map(&self) -> &TypeMap {
        &self.registry.type_map
    }

    /// Declares a model. Every declaration problem surfaces here.
    pub fn register(&mut self, model: ModelBuilder) -> Result<Arc<ModelDescriptor>> {
        let type_name = model.type_name().to_string();
        if self.registry.by_type.contains_key(&type_name) {
            return Err(ModelError::invalid_declaration(format!(
                "type '{}' declared twice",
                type_name
            )));
        }

        let descriptor = model.resolve(&self.registry.naming, &self.registry.type_map)?;
        let table = descriptor.table_name().to_string();
        if self.registry.by_table.contains_key(&table) {
            return Err(ModelError::DuplicateTable(table));
        }

        let descriptor = Arc::new(descriptor);
        let idx = self.registry.models.len();
        self.registry.models.push(descriptor.clone());
        self.registry.by_table.insert(table.clone(), idx);
        self.registry.by_type.insert(type_name.clone(), idx);

        event!(
            Level::DEBUG,
            table = %table,
            type_name = %type_name,
            columns = descriptor.columns().len(),
            "model registered"
        );
        Ok(descriptor)
    }

    /// Closes the declaration phase after checking that every foreign key
    /// points at a declared table and column.
    pub fn finish(self) -> Result<Arc<EntityRegistry>> {
        for model in &self.registry.models {
            for col in model.columns() {
                let Some(target) = &col.foreign_key else {
                    continue;
                };
                let referenced = self.registry.model(&target.table).ok_or_else(|| {
                    ModelError::invalid_declaration(format!(
                        "foreign key {}.{} references undeclared table '{}'",
                        model.table_name(),
                        col.name,
                        target.table
                    ))
                })?;
                if !referenced.has_column(&target.column) {
                    return Err(ModelError::unknown_column(
                        target.table.clone(),
                        target.column.clone(),
                    ));
                }
            }
        }

        event!(
            Level::INFO,
            models = self.registry.models.len(),
            type_entries = self.registry.type_map.len(),
            "entity registry ready"
        );
        Ok(Arc::new(self.registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ColumnSpec;

    struct BrokenExtension;

    impl TypeExtension for BrokenExtension {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn load(&self) -> std::result::Result<Vec<(SemanticType, ColumnType)>, ExtensionError> {
            Err(ExtensionError::Failed {
                name: "broken",
                reason: "bad table".into(),
            })
        }
    }

    struct MissingExtension;

    impl TypeExtension for MissingExtension {
        fn name(&self) -> &'static str {
            "missing"
        }

        fn load(&self) -> std::result::Result<Vec<(SemanticType, ColumnType)>, ExtensionError> {
            Err(ExtensionError::Unavailable("missing"))
        }
    }

    #[test]
    fn test_unavailable_extension_is_skipped() {
        let builder =
            RegistryBuilder::with_extensions(RegistryConfig::new(), vec![Box::new(MissingExtension)])
                .unwrap();
        let registry = builder.finish().unwrap();
        assert_eq!(registry.unavailable_extensions(), &["missing"]);
        assert_eq!(registry.type_map(), &TypeMap::base());
    }

    #[test]
    fn test_failing_extension_is_not_swallowed() {
        let result =
            RegistryBuilder::with_extensions(RegistryConfig::new(), vec![Box::new(BrokenExtension)]);
        assert!(matches!(result, Err(ModelError::InvalidDeclaration(_))));
    }

    #[cfg(not(feature = "validated-types"))]
    #[test]
    fn test_default_extensions_without_feature() {
        let registry = EntityRegistry::builder(RegistryConfig::new())
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(registry.resolve_type(SemanticType::Email), None);
        assert_eq!(registry.unavailable_extensions(), &["validated-types"]);
    }

    #[cfg(feature = "validated-types")]
    #[test]
    fn test_default_extensions_with_feature() {
        let registry = EntityRegistry::builder(RegistryConfig::new())
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(registry.resolve_type(SemanticType::Email), Some(ColumnType::String(None)));
        assert_eq!(registry.loaded_extensions(), &["validated-types"]);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
        builder.register(ModelBuilder::new("EventLog")).unwrap();
        let err = builder
            .register(ModelBuilder::new("OtherLog").table("event_log"))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateTable(_)));
    }

    #[test]
    fn test_dangling_foreign_key_rejected_on_finish() {
        let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
        builder
            .register(
                ModelBuilder::new("UUIDBook")
                    .column(ColumnSpec::new("author_id", SemanticType::Uuid).references("uuid_author.id")),
            )
            .unwrap();
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_forward_reference_resolves() {
        let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
        builder
            .register(
                ModelBuilder::new("UUIDBook")
                    .column(ColumnSpec::new("author_id", SemanticType::Uuid).references("uuid_author.id")),
            )
            .unwrap();
        builder.register(ModelBuilder::new("UUIDAuthor")).unwrap();
        let registry = builder.finish().unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.model_for_type("UUIDAuthor").is_some());
        assert!(registry.model("uuid_book").is_some());
    }
}
