use crate::core::{ModelError, Result};
use regex::Regex;

lazy_static::lazy_static! {
    static ref SQL_IDENTIFIER: Regex = Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static regex");
    static ref TYPE_IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex");
}

/// Derives a snake_case table identifier from a declared type name.
///
/// A separator goes before every uppercase letter that follows a lowercase
/// letter or digit, and before every uppercase letter (other than the first
/// character) that is followed by a lowercase letter. The result is lowercased.
///
/// ```
/// use modelbase::naming::table_name_for;
///
/// assert_eq!(table_name_for("UUIDAuthor"), "uuid_author");
/// assert_eq!(table_name_for("EventLog"), "event_log");
/// ```
pub fn table_name_for(type_name: &str) -> String {
    let chars: Vec<char> = type_name.chars().collect();
    let mut table = String::with_capacity(type_name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let after_lower = i > 0 && {
                let prev = chars[i - 1];
                prev.is_ascii_lowercase() || prev.is_ascii_digit()
            };
            let before_lower = i > 0
                && chars
                    .get(i + 1)
                    .is_some_and(|next| next.is_ascii_lowercase());
            if after_lower || before_lower {
                table.push('_');
            }
        }
        table.push(ch.to_ascii_lowercase());
    }

    table
}

/// Checks that `name` can be used unquoted as a table, column or constraint name.
pub fn validate_identifier(name: &str, kind: &str) -> Result<()> {
    if SQL_IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(ModelError::invalid_declaration(format!(
            "{} '{}' is not a valid lowercase SQL identifier",
            kind, name
        )))
    }
}

pub fn validate_type_name(type_name: &str) -> Result<()> {
    if TYPE_IDENTIFIER.is_match(type_name) {
        Ok(())
    } else {
        Err(ModelError::invalid_declaration(format!(
            "type name '{}' cannot be mapped to a table",
            type_name
        )))
    }
}
