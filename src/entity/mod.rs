pub mod record;

pub use record::Record;

use crate::audit::AuditStamps;
use crate::core::{Result, Value};
use crate::identity::Identity;
use crate::model::ModelDescriptor;
use crate::projection::{Mapping, to_mapping};
use std::any::Any;
use std::sync::Arc;

/// An instance of a declared model, as seen by the unit of work.
///
/// Typed application structs implement this by hand; [`Record`] is the
/// dynamic implementation used for rows loaded without a typed counterpart.
pub trait Entity: Send + Sync + 'static {
    fn descriptor(&self) -> &Arc<ModelDescriptor>;

    fn identity(&self) -> Identity;

    /// Called by the unit of work once the backend has assigned a sequential id.
    fn assign_identity(&mut self, identity: Identity);

    /// Current value of a declared column, `None` when it is not loaded.
    fn attribute(&self, column: &str) -> Option<Value>;

    fn set_attribute(&mut self, column: &str, value: Value) -> Result<()>;

    /// Audit stamps, if this entity carries them. Each stamp may be unloaded
    /// on its own.
    fn audit(&self) -> Option<&AuditStamps> {
        None
    }

    fn audit_mut(&mut self) -> Option<&mut AuditStamps> {
        None
    }

    /// Receives the server-assigned insertion order marker.
    fn record_insert_sentinel(&mut self, _marker: i64) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn to_mapping(&self, exclude: Option<&[&str]>) -> Mapping
    where
        Self: Sized,
    {
        to_mapping(self, exclude)
    }
}
