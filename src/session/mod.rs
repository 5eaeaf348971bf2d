// ============================================================================
// Unit of Work
// ============================================================================
//
// Engine    - registry + backend + flush listeners, shared by all sessions
// Session   - tracks pending / modified / deleted entities, flushes them
// Backend   - async row store seam; MemoryBackend is the in-process store
// Listeners - synchronous before-flush hooks (updated_at touch)
//
// ============================================================================

pub mod backend;
pub mod config;
pub mod engine;
pub mod listener;
pub mod memory;
pub mod unit_of_work;

pub use backend::{Backend, InsertOutcome};
pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use listener::{DirtySet, FlushListener, TouchUpdatedTimestamp};
pub use memory::MemoryBackend;
pub use unit_of_work::{EntityKey, EntityState, FlushReport, Session};
