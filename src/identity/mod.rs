// ============================================================================
// Identity Strategies
// ============================================================================
//
// Random surrogate: a v4 UUID generated client-side at construction time.
// Sequential surrogate: a BIGINT drawn from a table-scoped sequence by the
// backend at insert time; unset until then.
//
// ============================================================================

use crate::core::{ColumnType, Value};
use std::fmt;
use uuid::Uuid;

/// Name of the primary key column every strategy contributes.
pub const ID_COLUMN: &str = "id";

/// Hidden column holding the server-assigned insertion order marker.
pub const INSERT_SENTINEL_COLUMN: &str = "orm_insert_sentinel";

/// Primary key strategy attached to a model at declaration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    Random { insert_sentinel: bool },
    Sequential,
}

impl IdentityStrategy {
    /// Random UUID identity without an insertion marker.
    pub fn random() -> Self {
        Self::Random {
            insert_sentinel: false,
        }
    }

    /// Random UUID identity plus a server-populated insertion order marker,
    /// for models whose rows are ordered within a relationship.
    pub fn random_with_insert_sentinel() -> Self {
        Self::Random {
            insert_sentinel: true,
        }
    }

    pub fn sequential() -> Self {
        Self::Sequential
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Random { .. } => ColumnType::Guid,
            Self::Sequential => ColumnType::BigIntIdentity,
        }
    }

    pub fn has_insert_sentinel(&self) -> bool {
        matches!(
            self,
            Self::Random {
                insert_sentinel: true
            }
        )
    }

    /// Identity a freshly constructed entity starts with.
    pub fn generate(&self) -> Identity {
        match self {
            Self::Random { .. } => Identity::Random(Uuid::new_v4()),
            Self::Sequential => Identity::Sequence(None),
        }
    }
}

impl Default for IdentityStrategy {
    fn default() -> Self {
        Self::random()
    }
}

/// Sequence backing a sequential identity, named after its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDef {
    pub name: String,
    pub start: i64,
}

impl SequenceDef {
    pub fn for_table(table_name: &str) -> Self {
        Self {
            name: format!("{}_id_seq", table_name),
            start: 1,
        }
    }
}

/// Primary key value of an entity instance.
///
/// `Sequence(None)` is the normal state of a sequential entity that has not
/// been inserted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Random(Uuid),
    Sequence(Option<i64>),
}

impl Identity {
    pub fn is_assigned(&self) -> bool {
        !matches!(self, Self::Sequence(None))
    }

    pub fn value(&self) -> Option<Value> {
        match self {
            Self::Random(id) => Some(Value::Uuid(*id)),
            Self::Sequence(Some(id)) => Some(Value::Integer(*id)),
            Self::Sequence(None) => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Random(id) => Some(*id),
            Self::Sequence(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Sequence(id) => *id,
            Self::Random(_) => None,
        }
    }

    /// Rebuilds an identity from a stored primary key value.
    pub fn from_value(strategy: &IdentityStrategy, value: &Value) -> Option<Self> {
        match (strategy, value) {
            (IdentityStrategy::Random { .. }, Value::Uuid(id)) => Some(Self::Random(*id)),
            (IdentityStrategy::Sequential, Value::Integer(id)) => Some(Self::Sequence(Some(*id))),
            (IdentityStrategy::Sequential, Value::Null) => Some(Self::Sequence(None)),
            _ => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random(id) => write!(f, "{}", id),
            Self::Sequence(Some(id)) => write!(f, "{}", id),
            Self::Sequence(None) => write!(f, "<unassigned>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_identities_do_not_collide() {
        let strategy = IdentityStrategy::random();
        let ids: HashSet<_> = (0..1000).map(|_| strategy.generate()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(Identity::is_assigned));
    }

    #[test]
    fn test_sequential_identity_starts_unassigned() {
        let id = IdentityStrategy::sequential().generate();
        assert!(!id.is_assigned());
        assert_eq!(id.value(), None);
        assert_eq!(id.to_string(), "<unassigned>");
    }

    #[test]
    fn test_sequence_named_after_table() {
        assert_eq!(SequenceDef::for_table("big_int_author").name, "big_int_author_id_seq");
    }

    #[test]
    fn test_from_value_respects_strategy() {
        let uuid = Uuid::new_v4();
        assert_eq!(
            Identity::from_value(&IdentityStrategy::random(), &Value::Uuid(uuid)),
            Some(Identity::Random(uuid))
        );
        assert_eq!(
            Identity::from_value(&IdentityStrategy::sequential(), &Value::Uuid(uuid)),
            None
        );
        assert_eq!(
            Identity::from_value(&IdentityStrategy::sequential(), &Value::Integer(7)),
            Some(Identity::Sequence(Some(7)))
        );
    }
}
