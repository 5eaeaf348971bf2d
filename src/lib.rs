// ============================================================================
// modelbase: declarative entity base layer
// ============================================================================

//! Building blocks for declaring persistent entities: surrogate identity
//! strategies, audit timestamps, deterministic table and constraint naming,
//! a semantic → column type map, mapping projection and a small unit of work
//! that keeps `updated_at` current on flush.
//!
//! # Examples
//!
//! ```
//! use modelbase::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> modelbase::Result<()> {
//! let mut registry = EntityRegistry::builder(RegistryConfig::new())?;
//! registry.register(
//!     ModelBuilder::new("UUIDAuthor")
//!         .audited()
//!         .column(ColumnSpec::new("name", SemanticType::Text).length(100)),
//! )?;
//! let engine = Engine::in_memory(registry.finish()?);
//!
//! let mut session = engine.session();
//! let author = engine.new_record("uuid_author")?.with("name", "Agatha Christie")?;
//! session.add(author)?;
//! session.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod core;
pub mod entity;
pub mod identity;
pub mod model;
pub mod naming;
pub mod prelude;
pub mod projection;
pub mod registry;
pub mod session;

pub use crate::core::{ColumnSpec, ColumnType, ModelError, Result, SemanticType, Value};
pub use crate::entity::{Entity, Record};
pub use crate::identity::{Identity, IdentityStrategy};
pub use crate::model::{ModelBuilder, ModelDescriptor};
pub use crate::naming::{ConstraintRole, NamingConvention, table_name_for};
pub use crate::projection::{Mapping, to_mapping};
pub use crate::registry::{EntityRegistry, RegistryBuilder, RegistryConfig};
pub use crate::session::{Engine, EngineConfig, Session};
