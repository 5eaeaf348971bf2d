use crate::audit::Clock;
use crate::entity::Entity;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{Level, event};

/// Modified persistent entities handed to listeners before a flush.
pub struct DirtySet<'a> {
    entities: Vec<&'a mut dyn Entity>,
}

impl<'a> DirtySet<'a> {
    pub(crate) fn new(entities: Vec<&'a mut dyn Entity>) -> Self {
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut dyn Entity> {
        self.entities.iter_mut().map(|entity| &mut **entity)
    }
}

/// Hook run synchronously at the start of every flush.
///
/// Listeners are registered once per [`Engine`](super::Engine) and identified
/// by name; registering the same name twice keeps the first.
pub trait FlushListener: Send + Sync {
    fn name(&self) -> &'static str;

    fn before_flush(&self, dirty: &mut DirtySet<'_>);
}

/// Advances `updated_at` on every modified entity whose model is audited.
///
/// Other entities are skipped. An unloaded `updated_at` is set and becomes
/// loaded. A failure on one entity is
/// logged and does not stop the others or the flush.
pub struct TouchUpdatedTimestamp {
    clock: Arc<dyn Clock>,
}

impl TouchUpdatedTimestamp {
    pub const NAME: &'static str = "touch_updated_timestamp";

    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl FlushListener for TouchUpdatedTimestamp {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn before_flush(&self, dirty: &mut DirtySet<'_>) {
        for entity in dirty.iter_mut() {
            if !entity.descriptor().is_audited() {
                continue;
            }
            let table = entity.descriptor().table_name().to_string();
            let identity = entity.identity();
            let touched = catch_unwind(AssertUnwindSafe(|| {
                let now = self.clock.now();
                entity.audit_mut().map(|stamps| stamps.touch(now))
            }));
            match touched {
                Ok(Some(updated_at)) => {
                    event!(
                        Level::TRACE,
                        table = %table,
                        id = %identity,
                        updated_at = %updated_at,
                        "updated_at touched"
                    );
                }
                Ok(None) => {
                    event!(
                        Level::DEBUG,
                        table = %table,
                        id = %identity,
                        "audited entity exposes no stamps"
                    );
                }
                Err(_) => {
                    event!(
                        Level::WARN,
                        table = %table,
                        id = %identity,
                        "failed to touch updated_at"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ManualClock;
    use crate::core::{ColumnSpec, SemanticType, Value};
    use crate::entity::Record;
    use crate::model::ModelBuilder;
    use crate::projection::Mapping;
    use crate::registry::{EntityRegistry, RegistryConfig};
    use chrono::{TimeZone, Utc};

    struct PanickingClock;

    impl Clock for PanickingClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            panic!("clock unavailable")
        }
    }

    fn records() -> (Record, Record) {
        let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
        let audited = builder
            .register(
                ModelBuilder::new("UUIDEventLog")
                    .audited()
                    .column(ColumnSpec::new("message", SemanticType::Text)),
            )
            .unwrap();
        let plain = builder.register(ModelBuilder::new("UUIDRule")).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (Record::new_at(audited, start), Record::new_at(plain, start))
    }

    #[test]
    fn test_touch_skips_unaudited_entities() {
        let (mut log, mut rule) = records();
        let before = log.audit().unwrap().updated_at().unwrap();
        let clock = Arc::new(ManualClock::new(before));
        let listener = TouchUpdatedTimestamp::new(clock);

        let mut dirty = DirtySet::new(vec![&mut log as &mut dyn Entity, &mut rule]);
        listener.before_flush(&mut dirty);

        assert!(log.audit().unwrap().updated_at().unwrap() > before);
        assert!(rule.audit().is_none());
    }

    #[test]
    fn test_touch_survives_failing_clock() {
        let (mut log, _) = records();
        let before = log.audit().unwrap().updated_at();
        let listener = TouchUpdatedTimestamp::new(Arc::new(PanickingClock));

        let mut dirty = DirtySet::new(vec![&mut log as &mut dyn Entity]);
        listener.before_flush(&mut dirty);
        assert_eq!(log.audit().unwrap().updated_at(), before);
    }

    #[test]
    fn test_touch_on_empty_set_is_noop() {
        let listener = TouchUpdatedTimestamp::new(Arc::new(PanickingClock));
        let mut dirty = DirtySet::new(Vec::new());
        assert!(dirty.is_empty());
        listener.before_flush(&mut dirty);
        assert_eq!(dirty.len(), 0);
    }

    #[test]
    fn test_touch_sets_unloaded_updated_at() {
        let (log, _) = records();
        let created = log.audit().unwrap().created_at().unwrap();
        let row: Mapping = vec![
            ("id", log.identity().value().unwrap()),
            ("message", Value::from("partial")),
        ]
        .into_iter()
        .collect();
        let mut partial = Record::from_row(log.descriptor().clone(), &row).unwrap();
        let now = created + chrono::Duration::hours(2);
        let listener = TouchUpdatedTimestamp::new(Arc::new(ManualClock::new(now)));

        let mut dirty = DirtySet::new(vec![&mut partial as &mut dyn Entity]);
        listener.before_flush(&mut dirty);

        let stamps = partial.audit().unwrap();
        assert_eq!(stamps.updated_at(), Some(now));
        assert_eq!(stamps.created_at(), None);
        assert_eq!(partial.unloaded(), vec!["created_at"]);
    }
}
