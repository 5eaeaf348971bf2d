use modelbase::naming::{ConstraintRole, NamingConvention, table_name_for};
use modelbase::{ColumnSpec, EntityRegistry, ModelBuilder, ModelError, RegistryConfig, SemanticType};

#[test]
fn test_table_names_from_type_names() {
    assert_eq!(table_name_for("UUIDAuthor"), "uuid_author");
    assert_eq!(table_name_for("EventLog"), "event_log");
    assert_eq!(table_name_for("BigIntAuthor"), "big_int_author");
    assert_eq!(table_name_for("ModelWithFetchedValue"), "model_with_fetched_value");
    assert_eq!(table_name_for("Tag"), "tag");
}

#[test]
fn test_table_name_is_idempotent_on_snake_case() {
    for name in ["uuid_author", "event_log", "tag"] {
        assert_eq!(table_name_for(name), name);
    }
}

#[test]
fn test_registered_models_get_derived_table_names() {
    let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
    let author = builder.register(ModelBuilder::new("UUIDAuthor")).unwrap();
    let log = builder
        .register(ModelBuilder::new("UUIDEventLog").table("event_log"))
        .unwrap();
    assert_eq!(author.table_name(), "uuid_author");
    assert_eq!(log.table_name(), "event_log");
}

#[test]
fn test_constraint_names_follow_templates() {
    let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
    builder
        .register(
            ModelBuilder::new("UUIDAuthor")
                .column(ColumnSpec::new("name", SemanticType::Text).length(100).unique()),
        )
        .unwrap();
    let book = builder
        .register(
            ModelBuilder::new("UUIDBook")
                .column(ColumnSpec::new("title", SemanticType::Text).length(250).index())
                .column(
                    ColumnSpec::new("author_id", SemanticType::Uuid).references("uuid_author.id"),
                ),
        )
        .unwrap();
    let registry = builder.finish().unwrap();

    let author = registry.model("uuid_author").unwrap();
    assert_eq!(author.primary_key_name(), "pk_uuid_author");
    assert_eq!(
        author.constraint_name(ConstraintRole::Unique, "name"),
        Some("uq_uuid_author_name")
    );
    assert_eq!(
        book.constraint_name(ConstraintRole::Index, "title"),
        Some("ix_uuid_book_title")
    );
    assert_eq!(
        book.constraint_name(ConstraintRole::ForeignKey, "author_id"),
        Some("fk_uuid_book_author_id_uuid_author")
    );
}

#[test]
fn test_same_column_name_on_two_tables_gets_distinct_names() {
    let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
    let tag = builder
        .register(
            ModelBuilder::new("UUIDTag")
                .column(ColumnSpec::new("name", SemanticType::Text).unique()),
        )
        .unwrap();
    let rule = builder
        .register(
            ModelBuilder::new("UUIDRule")
                .column(ColumnSpec::new("name", SemanticType::Text).unique()),
        )
        .unwrap();
    assert_ne!(
        tag.constraint_name(ConstraintRole::Unique, "name"),
        rule.constraint_name(ConstraintRole::Unique, "name")
    );
}

#[test]
fn test_check_constraints_are_named_per_table() {
    let mut builder = EntityRegistry::builder(RegistryConfig::new()).unwrap();
    let rule = builder
        .register(
            ModelBuilder::new("UUIDRule")
                .column(ColumnSpec::new("name", SemanticType::Text))
                .check("name_not_empty", "length(name) > 0"),
        )
        .unwrap();
    let sql = rule.create_table_sql();
    assert!(sql.contains("CONSTRAINT ck_uuid_rule_name_not_empty CHECK (length(name) > 0)"));
}

#[test]
fn test_custom_template_applies_registry_wide() {
    let naming = NamingConvention::default()
        .with_template(ConstraintRole::Unique, "unique_{table_name}_{column_0_n_name}")
        .unwrap();
    let mut builder =
        EntityRegistry::builder(RegistryConfig::new().naming(naming)).unwrap();
    let tag = builder
        .register(
            ModelBuilder::new("UUIDTag")
                .column(ColumnSpec::new("name", SemanticType::Text).unique()),
        )
        .unwrap();
    assert_eq!(
        tag.constraint_name(ConstraintRole::Unique, "name"),
        Some("unique_uuid_tag_name")
    );
}

#[test]
fn test_template_with_unknown_placeholder_is_rejected() {
    let result = NamingConvention::default()
        .with_template(ConstraintRole::Index, "ix_{table_name}_{nonsense}");
    assert!(matches!(result, Err(ModelError::InvalidDeclaration(_))));
}

#[test]
fn test_generated_names_respect_identifier_limit() {
    let mut builder =
        EntityRegistry::builder(RegistryConfig::new().max_identifier_length(30)).unwrap();
    builder
        .register(ModelBuilder::new("ExtraordinarilyVerboseParentRecord"))
        .unwrap();
    let child = builder
        .register(
            ModelBuilder::new("ExtraordinarilyVerboseChildRecord").column(
                ColumnSpec::new("parent_identifier", SemanticType::Uuid)
                    .references("extraordinarily_verbose_parent_record.id"),
            ),
        )
        .unwrap();
    let registry = builder.finish().unwrap();

    for model in registry.models() {
        for constraint in model.constraints() {
            assert!(constraint.name.len() <= 30, "{} is too long", constraint.name);
        }
    }
    assert!(child
        .constraint_name(ConstraintRole::ForeignKey, "parent_identifier")
        .is_some());
}
