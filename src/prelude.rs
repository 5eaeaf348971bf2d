//! Everything needed to declare models and run a session.

pub use crate::audit::{AuditStamps, Clock, ManualClock, SystemClock};
pub use crate::core::{ColumnSpec, ColumnType, ModelError, Result, SemanticType, Value};
pub use crate::entity::{Entity, Record};
pub use crate::identity::{Identity, IdentityStrategy};
pub use crate::model::{ModelBuilder, ModelDescriptor};
pub use crate::naming::{ConstraintRole, NamingConvention};
pub use crate::projection::{Mapping, to_mapping};
pub use crate::registry::{EntityRegistry, RegistryConfig};
pub use crate::session::{
    Engine, EngineConfig, EntityKey, FlushListener, FlushReport, MemoryBackend, Session,
};
