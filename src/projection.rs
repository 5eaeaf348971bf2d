use crate::core::Value;
use crate::entity::Entity;
use crate::identity::INSERT_SENTINEL_COLUMN;
use crate::model::ColumnOrigin;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Bookkeeping attribute names that never leave the entity layer.
pub const INTERNAL_ATTRIBUTES: [&str; 2] = [INSERT_SENTINEL_COLUMN, "_sentinel"];

/// Column name → value pairs in column declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, keeping its original position when it is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object of the mapping. Key order is only kept by the serde
    /// `Serialize` impl, not by `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

/// Projects an entity onto its columns.
///
/// Keys follow the model's column order. Left out: internal bookkeeping
/// columns, attributes that are not loaded (an unassigned sequential id
/// counts as not loaded) and anything named in `exclude`. Unloaded
/// attributes are skipped, never fetched.
pub fn to_mapping(entity: &dyn Entity, exclude: Option<&[&str]>) -> Mapping {
    let exclude = exclude.unwrap_or(&[]);
    let mut mapping = Mapping::new();

    for col in entity.descriptor().columns() {
        let name = col.name.as_str();
        if INTERNAL_ATTRIBUTES.contains(&name) || exclude.contains(&name) {
            continue;
        }
        let value = match col.origin {
            ColumnOrigin::Sentinel => None,
            ColumnOrigin::Identity => entity.identity().value(),
            ColumnOrigin::Audit => entity
                .audit()
                .and_then(|stamps| match name {
                    crate::audit::CREATED_AT_COLUMN => stamps.created_at(),
                    crate::audit::UPDATED_AT_COLUMN => stamps.updated_at(),
                    _ => None,
                })
                .map(Value::Timestamp),
            ColumnOrigin::Declared => entity.attribute(name),
        };
        if let Some(value) = value {
            mapping.insert(name, value);
        }
    }

    mapping
}
