use crate::core::{ModelError, Result};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;

lazy_static::lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([a-z0-9_]+)\}").expect("static regex");
}

/// PostgreSQL truncates identifiers past 63 bytes.
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 63;

const TABLE_NAME: &str = "table_name";
const COLUMN_0_NAME: &str = "column_0_name";
const COLUMN_0_LABEL: &str = "column_0_label";
const COLUMN_0_N_NAME: &str = "column_0_n_name";
const REFERRED_TABLE_NAME: &str = "referred_table_name";
const CONSTRAINT_NAME: &str = "constraint_name";

const KNOWN_PLACEHOLDERS: [&str; 6] = [
    TABLE_NAME,
    COLUMN_0_NAME,
    COLUMN_0_LABEL,
    COLUMN_0_N_NAME,
    REFERRED_TABLE_NAME,
    CONSTRAINT_NAME,
];

/// Kind of schema object a generated name is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintRole {
    Index,
    Unique,
    Check,
    ForeignKey,
    PrimaryKey,
}

impl ConstraintRole {
    pub const ALL: [ConstraintRole; 5] = [
        ConstraintRole::Index,
        ConstraintRole::Unique,
        ConstraintRole::Check,
        ConstraintRole::ForeignKey,
        ConstraintRole::PrimaryKey,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Index => "ix",
            Self::Unique => "uq",
            Self::Check => "ck",
            Self::ForeignKey => "fk",
            Self::PrimaryKey => "pk",
        }
    }

    fn default_template(&self) -> &'static str {
        match self {
            Self::Index => "ix_{column_0_label}",
            Self::Unique => "uq_{table_name}_{column_0_name}",
            Self::Check => "ck_{table_name}_{constraint_name}",
            Self::ForeignKey => "fk_{table_name}_{column_0_name}_{referred_table_name}",
            Self::PrimaryKey => "pk_{table_name}",
        }
    }
}

impl fmt::Display for ConstraintRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Inputs to a single name generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameParts<'a> {
    pub table: &'a str,
    pub columns: &'a [&'a str],
    pub referred_table: Option<&'a str>,
    pub label: Option<&'a str>,
}

/// Fixed role → template mapping shared by every table of a registry.
///
/// Templates use `{placeholder}` slots: `table_name`, `column_0_name`,
/// `column_0_label` (`<table>_<column>`), `column_0_n_name` (all columns
/// joined with `_`), `referred_table_name` and `constraint_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    templates: BTreeMap<ConstraintRole, String>,
    max_identifier_length: usize,
}

impl Default for NamingConvention {
    fn default() -> Self {
        let templates = ConstraintRole::ALL
            .iter()
            .map(|role| (*role, role.default_template().to_string()))
            .collect();
        Self {
            templates,
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
        }
    }
}

impl NamingConvention {
    /// Replaces the template for one role.
    ///
    /// Every template must embed the table name, directly or through
    /// `column_0_label`, so names from unrelated tables cannot collide.
    pub fn with_template(mut self, role: ConstraintRole, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let mut embeds_table = false;
        for caps in PLACEHOLDER.captures_iter(&template) {
            let slot = &caps[1];
            if !KNOWN_PLACEHOLDERS.contains(&slot) {
                return Err(ModelError::invalid_declaration(format!(
                    "unknown placeholder '{{{}}}' in {} template",
                    slot, role
                )));
            }
            embeds_table |= slot == TABLE_NAME || slot == COLUMN_0_LABEL;
        }
        if !embeds_table {
            return Err(ModelError::invalid_declaration(format!(
                "{} template '{}' must reference {{table_name}} or {{column_0_label}}",
                role, template
            )));
        }
        self.templates.insert(role, template);
        Ok(self)
    }

    pub fn with_max_identifier_length(mut self, max: usize) -> Self {
        // Room for the "_xxxx" hash suffix plus at least one character.
        self.max_identifier_length = max.max(6);
        self
    }

    pub fn template(&self, role: ConstraintRole) -> &str {
        self.templates
            .get(&role)
            .map(String::as_str)
            .unwrap_or_else(|| role.default_template())
    }

    pub fn max_identifier_length(&self) -> usize {
        self.max_identifier_length
    }

    /// Generates the name of a schema object.
    ///
    /// Missing inputs the role's template needs (a foreign key without a
    /// referred table, a check without a label, an index without columns) are
    /// reported as an invalid declaration.
    pub fn name_for(
        &self,
        role: ConstraintRole,
        table: &str,
        columns: &[&str],
        referred_table: Option<&str>,
        label: Option<&str>,
    ) -> Result<String> {
        self.render(
            role,
            NameParts {
                table,
                columns,
                referred_table,
                label,
            },
        )
    }

    pub fn render(&self, role: ConstraintRole, parts: NameParts<'_>) -> Result<String> {
        if parts.table.is_empty() {
            return Err(ModelError::invalid_declaration(format!(
                "{} constraint requires a table name",
                role
            )));
        }
        match role {
            ConstraintRole::ForeignKey if parts.referred_table.is_none() => {
                return Err(missing(role, parts.table, "a referred table"));
            }
            ConstraintRole::Check if parts.label.is_none() => {
                return Err(missing(role, parts.table, "a constraint label"));
            }
            ConstraintRole::Index | ConstraintRole::Unique | ConstraintRole::ForeignKey
                if parts.columns.is_empty() =>
            {
                return Err(missing(role, parts.table, "at least one column"));
            }
            _ => {}
        }

        let mut failure = None;
        let rendered = PLACEHOLDER.replace_all(self.template(role), |caps: &Captures<'_>| {
            match slot_value(&caps[1], &parts) {
                Some(value) => value,
                None => {
                    if failure.is_none() {
                        failure = Some(caps[1].to_string());
                    }
                    String::new()
                }
            }
        });
        if let Some(slot) = failure {
            return Err(missing(role, parts.table, &format!("a value for '{{{}}}'", slot)));
        }

        Ok(self.shorten(rendered.into_owned()))
    }

    fn shorten(&self, name: String) -> String {
        if name.len() <= self.max_identifier_length {
            return name;
        }
        let keep = self.max_identifier_length - 5;
        let mut cut = keep;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}_{:04x}", &name[..cut], fnv1a(&name) & 0xffff)
    }
}

fn slot_value(slot: &str, parts: &NameParts<'_>) -> Option<String> {
    match slot {
        TABLE_NAME => Some(parts.table.to_string()),
        COLUMN_0_NAME => parts.columns.first().map(|c| c.to_string()),
        COLUMN_0_LABEL => parts
            .columns
            .first()
            .map(|c| format!("{}_{}", parts.table, c)),
        COLUMN_0_N_NAME => (!parts.columns.is_empty()).then(|| parts.columns.join("_")),
        REFERRED_TABLE_NAME => parts.referred_table.map(str::to_string),
        CONSTRAINT_NAME => parts.label.map(str::to_string),
        _ => None,
    }
}

fn missing(role: ConstraintRole, table: &str, what: &str) -> ModelError {
    ModelError::invalid_declaration(format!(
        "{} constraint on '{}' requires {}",
        role, table, what
    ))
}

fn fnv1a(input: &str) -> u64 {
    let mut hash = 14695981039346656037u64;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates() {
        let conv = NamingConvention::default();
        assert_eq!(
            conv.name_for(ConstraintRole::PrimaryKey, "uuid_author", &["id"], None, None)
                .unwrap(),
            "pk_uuid_author"
        );
        assert_eq!(
            conv.name_for(ConstraintRole::Index, "uuid_book", &["title"], None, None)
                .unwrap(),
            "ix_uuid_book_title"
        );
        assert_eq!(
            conv.name_for(ConstraintRole::Unique, "uuid_tag", &["name"], None, None)
                .unwrap(),
            "uq_uuid_tag_name"
        );
        assert_eq!(
            conv.name_for(ConstraintRole::Check, "uuid_rule", &[], None, Some("name_len"))
                .unwrap(),
            "ck_uuid_rule_name_len"
        );
        assert_eq!(
            conv.name_for(
                ConstraintRole::ForeignKey,
                "uuid_book",
                &["author_id"],
                Some("uuid_author"),
                None
            )
            .unwrap(),
            "fk_uuid_book_author_id_uuid_author"
        );
    }

    #[test]
    fn test_missing_inputs_are_declaration_faults() {
        let conv = NamingConvention::default();
        let err = conv
            .name_for(ConstraintRole::ForeignKey, "uuid_book", &["author_id"], None, None)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidDeclaration(_)));
        assert!(conv.name_for(ConstraintRole::Check, "t", &[], None, None).is_err());
        assert!(conv.name_for(ConstraintRole::Index, "t", &[], None, None).is_err());
        assert!(conv.name_for(ConstraintRole::PrimaryKey, "", &[], None, None).is_err());
    }

    #[test]
    fn test_same_column_different_tables() {
        let conv = NamingConvention::default();
        let a = conv.name_for(ConstraintRole::Unique, "author", &["name"], None, None).unwrap();
        let b = conv.name_for(ConstraintRole::Unique, "tag", &["name"], None, None).unwrap();
        assert_ne!(a, b);
        let again = conv.name_for(ConstraintRole::Unique, "author", &["name"], None, None).unwrap();
        assert_eq!(a, again);
    }

    #[test]
    fn test_long_names_are_shortened_deterministically() {
        let conv = NamingConvention::default().with_max_identifier_length(30);
        let table = "a_really_long_table_name_for_testing";
        let name = conv
            .name_for(ConstraintRole::ForeignKey, table, &["owner_id"], Some("owners"), None)
            .unwrap();
        assert_eq!(name.len(), 30);
        assert!(name.starts_with("fk_a_really_long_table_na"));
        let again = conv
            .name_for(ConstraintRole::ForeignKey, table, &["owner_id"], Some("owners"), None)
            .unwrap();
        assert_eq!(name, again);
        let other = conv
            .name_for(ConstraintRole::ForeignKey, table, &["owner_id"], Some("teams"), None)
            .unwrap();
        assert_ne!(name, other);
    }

    #[test]
    fn test_custom_template_validation() {
        let conv = NamingConvention::default()
            .with_template(ConstraintRole::Unique, "uq_{table_name}_{column_0_n_name}")
            .unwrap();
        assert_eq!(
            conv.name_for(ConstraintRole::Unique, "item_tag", &["item_id", "tag_id"], None, None)
                .unwrap(),
            "uq_item_tag_item_id_tag_id"
        );
        assert!(NamingConvention::default()
            .with_template(ConstraintRole::Unique, "uq_{column_0_name}")
            .is_err());
        assert!(NamingConvention::default()
            .with_template(ConstraintRole::Unique, "uq_{table_name}_{bogus}")
            .is_err());
    }
}
