use crate::core::{ColumnType, SemanticType};
use std::collections::BTreeMap;

lazy_static::lazy_static! {
    static ref BASE_TYPE_MAP: BTreeMap<SemanticType, ColumnType> = BTreeMap::from([
        (SemanticType::Integer, ColumnType::Integer),
        (SemanticType::BigInt, ColumnType::BigInt),
        (SemanticType::Float, ColumnType::Float),
        (SemanticType::Text, ColumnType::String(None)),
        (SemanticType::Boolean, ColumnType::Boolean),
        (SemanticType::Uuid, ColumnType::Guid),
        (SemanticType::Timestamp, ColumnType::TimestampUtc),
        (SemanticType::Date, ColumnType::Date),
        (SemanticType::Document, ColumnType::JsonB),
    ]);
}

/// Semantic type → physical column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    entries: BTreeMap<SemanticType, ColumnType>,
}

impl TypeMap {
    /// The mapping every registry starts from.
    pub fn base() -> Self {
        Self {
            entries: BASE_TYPE_MAP.clone(),
        }
    }

    pub fn resolve(&self, semantic: SemanticType) -> Option<ColumnType> {
        self.entries.get(&semantic).copied()
    }

    pub fn contains(&self, semantic: SemanticType) -> bool {
        self.entries.contains_key(&semantic)
    }

    pub fn insert(&mut self, semantic: SemanticType, column_type: ColumnType) -> Option<ColumnType> {
        self.entries.insert(semantic, column_type)
    }

    pub fn remove(&mut self, semantic: SemanticType) -> Option<ColumnType> {
        self.entries.remove(&semantic)
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (SemanticType, ColumnType)>) {
        self.entries.extend(entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (SemanticType, ColumnType)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::base()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_mapping() {
        let map = TypeMap::base();
        assert_eq!(map.resolve(SemanticType::Uuid), Some(ColumnType::Guid));
        assert_eq!(map.resolve(SemanticType::Timestamp), Some(ColumnType::TimestampUtc));
        assert_eq!(map.resolve(SemanticType::Document), Some(ColumnType::JsonB));
        assert_eq!(map.resolve(SemanticType::Email), None);
        assert_eq!(map.len(), 9);
    }
}
