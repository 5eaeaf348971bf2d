use super::descriptor::ModelDescriptor;
use crate::naming::ConstraintRole;

impl ModelDescriptor {
    /// Renders `CREATE TABLE` with every constraint named explicitly.
    /// Indexes are separate statements, see [`ModelDescriptor::create_index_sql`].
    pub fn create_table_sql(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.columns.len() + self.constraints.len());

        for col in &self.columns {
            let mut def = format!("{} {}", col.name, col.column_type.sql_name());
            if col.primary_key {
                if let Some(seq) = &self.sequence {
                    def.push_str(&format!(" DEFAULT nextval('{}')", seq.name));
                }
            }
            if !col.nullable {
                def.push_str(" NOT NULL");
            }
            parts.push(def);
        }

        for constraint in &self.constraints {
            let clause = match constraint.role {
                ConstraintRole::PrimaryKey => {
                    format!("PRIMARY KEY ({})", constraint.columns.join(", "))
                }
                ConstraintRole::Unique => format!("UNIQUE ({})", constraint.columns.join(", ")),
                ConstraintRole::ForeignKey => match &constraint.references {
                    Some(target) => format!(
                        "FOREIGN KEY ({}) REFERENCES {} ({})",
                        constraint.columns.join(", "),
                        target.table,
                        target.column
                    ),
                    None => continue,
                },
                ConstraintRole::Check => match &constraint.expression {
                    Some(expr) => format!("CHECK ({})", expr),
                    None => continue,
                },
                ConstraintRole::Index => continue,
            };
            parts.push(format!("CONSTRAINT {} {}", constraint.name, clause));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table_name,
            parts.join(", ")
        )
    }

    pub fn create_index_sql(&self) -> Vec<String> {
        self.constraints
            .iter()
            .filter(|c| c.role == ConstraintRole::Index)
            .map(|c| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    c.name,
                    self.table_name,
                    c.columns.join(", ")
                )
            })
            .collect()
    }

    pub fn create_sequence_sql(&self) -> Option<String> {
        self.sequence.as_ref().map(|seq| {
            format!(
                "CREATE SEQUENCE IF NOT EXISTS {} START WITH {}",
                seq.name, seq.start
            )
        })
    }

    /// Sequence, table and index statements in dependency order.
    pub fn ddl_statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        statements.extend(self.create_sequence_sql());
        statements.push(self.create_table_sql());
        statements.extend(self.create_index_sql());
        statements
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{ColumnSpec, SemanticType};
    use crate::identity::IdentityStrategy;
    use crate::model::ModelBuilder;
    use crate::naming::NamingConvention;
    use crate::registry::TypeMap;

    #[test]
    fn test_create_table_names_constraints() {
        let model = ModelBuilder::new("UUIDBook")
            .column(ColumnSpec::new("title", SemanticType::Text).length(250).index())
            .column(ColumnSpec::new("author_id", SemanticType::Uuid).references("uuid_author.id"))
            .resolve(&NamingConvention::default(), &TypeMap::base())
            .unwrap();

        let sql = model.create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS uuid_book (id UUID NOT NULL"));
        assert!(sql.contains("CONSTRAINT pk_uuid_book PRIMARY KEY (id)"));
        assert!(sql.contains(
            "CONSTRAINT fk_uuid_book_author_id_uuid_author FOREIGN KEY (author_id) REFERENCES uuid_author (id)"
        ));
        assert_eq!(
            model.create_index_sql(),
            vec!["CREATE INDEX IF NOT EXISTS ix_uuid_book_title ON uuid_book (title)".to_string()]
        );
        assert!(model.create_sequence_sql().is_none());
    }

    #[test]
    fn test_sequential_ddl_creates_sequence_first() {
        let model = ModelBuilder::new("BigIntAuthor")
            .identity(IdentityStrategy::sequential())
            .audited()
            .resolve(&NamingConvention::default(), &TypeMap::base())
            .unwrap();

        let statements = model.ddl_statements();
        assert_eq!(
            statements[0],
            "CREATE SEQUENCE IF NOT EXISTS big_int_author_id_seq START WITH 1"
        );
        assert!(statements[1].contains("id BIGINT DEFAULT nextval('big_int_author_id_seq') NOT NULL"));
        assert!(statements[1].contains("created_at TIMESTAMP WITH TIME ZONE NOT NULL"));
    }
}
