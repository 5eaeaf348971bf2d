use chrono::NaiveDate;
use modelbase::identity::{INSERT_SENTINEL_COLUMN, IdentityStrategy};
use modelbase::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn engine() -> Engine {
    let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
    builder
        .register(
            ModelBuilder::new("UUIDAuthor")
                .audited()
                .column(ColumnSpec::new("name", SemanticType::Text).length(100))
                .column(ColumnSpec::new("dob", SemanticType::Date).nullable()),
        )
        .unwrap();
    builder
        .register(
            ModelBuilder::new("UUIDItem")
                .identity(IdentityStrategy::random_with_insert_sentinel())
                .column(ColumnSpec::new("name", SemanticType::Text))
                .column(ColumnSpec::new("attributes", SemanticType::Document).nullable()),
        )
        .unwrap();
    Engine::in_memory(builder.finish().unwrap())
}

fn author(engine: &Engine) -> Record {
    engine
        .new_record("uuid_author")
        .unwrap()
        .with("name", "Leo Tolstoy")
        .unwrap()
        .with("dob", NaiveDate::from_ymd_opt(1828, 9, 9).unwrap())
        .unwrap()
}

#[test]
fn test_mapping_follows_column_order() {
    let engine = engine();
    let record = author(&engine);
    let mapping = record.to_mapping(None);
    assert_eq!(
        mapping.keys().collect::<Vec<_>>(),
        vec!["id", "name", "dob", "created_at", "updated_at"]
    );
    assert_eq!(mapping.get("name"), Some(&Value::from("Leo Tolstoy")));
}

#[test]
fn test_exclude_removes_exactly_the_named_keys() {
    let engine = engine();
    let record = author(&engine);
    let mapping = record.to_mapping(Some(&["created_at", "updated_at"][..]));
    assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["id", "name", "dob"]);
}

#[test]
fn test_excluding_unknown_names_is_harmless() {
    let engine = engine();
    let record = author(&engine);
    let mapping = record.to_mapping(Some(&["does_not_exist"][..]));
    assert_eq!(mapping.len(), 5);
}

#[test]
fn test_unset_attributes_are_not_projected() {
    let engine = engine();
    let record = engine.new_record("uuid_author").unwrap();
    let mapping = record.to_mapping(None);
    assert_eq!(
        mapping.keys().collect::<Vec<_>>(),
        vec!["id", "created_at", "updated_at"]
    );
}

#[tokio::test]
async fn test_insert_sentinel_never_projected() {
    let engine = engine();
    let mut session = engine.session();
    let item = engine
        .new_record("uuid_item")
        .unwrap()
        .with("name", "lamp")
        .unwrap()
        .with("attributes", json!({"watts": 40}))
        .unwrap();
    let key = session.add(item).unwrap();
    session.flush().await.unwrap();

    let stored = session.get_as::<Record>(key).unwrap();
    assert!(stored.insert_sentinel().is_some());
    let mapping = to_mapping(stored, None);
    assert!(!mapping.contains_key(INSERT_SENTINEL_COLUMN));
    assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["id", "name", "attributes"]);

    let model = engine.registry().model("uuid_item").unwrap();
    let row = engine
        .backend()
        .fetch(model, &stored.identity().value().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(row.get(INSERT_SENTINEL_COLUMN).and_then(Value::as_i64).is_some());
}

#[tokio::test]
async fn test_loaded_stamp_projected_without_the_other() {
    let engine = engine();
    let mut writer = engine.session();
    let record = author(&engine);
    let id = record.identity().value().unwrap();
    writer.add(record).unwrap();
    writer.commit().await.unwrap();

    let mut reader = engine.session();
    let key = reader
        .load_only("uuid_author", id, &["name", "created_at"])
        .await
        .unwrap()
        .unwrap();
    let mapping = reader.get_as::<Record>(key).unwrap().to_mapping(None);
    assert_eq!(
        mapping.keys().collect::<Vec<_>>(),
        vec!["id", "name", "created_at"]
    );
}

#[test]
fn test_mapping_serializes_as_ordered_json() {
    let engine = engine();
    let record = author(&engine);
    let json = serde_json::to_value(record.to_mapping(Some(&["created_at", "updated_at"][..]))).unwrap();
    assert_eq!(json["name"], json!("Leo Tolstoy"));
    assert_eq!(json["dob"], json!("1828-09-09"));
    assert_eq!(
        json["id"],
        json!(record.identity().as_uuid().unwrap().to_string())
    );
}

#[test]
fn test_records_from_shared_descriptor() {
    let engine = engine();
    let model = engine.registry().model("uuid_author").unwrap().clone();
    let a = Record::new(Arc::clone(&model));
    let b = Record::new(model);
    assert_ne!(a.identity(), b.identity());
    assert!(Arc::ptr_eq(a.descriptor(), b.descriptor()));
}
