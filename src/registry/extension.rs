use crate::core::{ColumnType, ExtensionError, SemanticType, Value};
#[cfg(feature = "validated-types")]
use crate::core::ModelError;

/// Optional contribution to the type map, loaded once at registry construction.
pub trait TypeExtension: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the entries to add, or [`ExtensionError::Unavailable`] when the
    /// extension is not compiled in.
    fn load(&self) -> Result<Vec<(SemanticType, ColumnType)>, ExtensionError>;
}

/// Email and URL types stored as plain strings. Built with the
/// `validated-types` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedStringTypes;

impl TypeExtension for ValidatedStringTypes {
    fn name(&self) -> &'static str {
        "validated-types"
    }

    #[cfg(feature = "validated-types")]
    fn load(&self) -> Result<Vec<(SemanticType, ColumnType)>, ExtensionError> {
        Ok(vec![
            (SemanticType::Email, ColumnType::String(None)),
            (SemanticType::Url, ColumnType::String(None)),
            (SemanticType::HttpUrl, ColumnType::String(None)),
        ])
    }

    #[cfg(not(feature = "validated-types"))]
    fn load(&self) -> Result<Vec<(SemanticType, ColumnType)>, ExtensionError> {
        Err(ExtensionError::Unavailable(self.name()))
    }
}

#[cfg(feature = "validated-types")]
#[derive(garde::Validate)]
struct EmailAddress(#[garde(email)] String);

/// Rejects text that does not match the format of an email or URL column.
/// Other semantic types and non-text values pass through.
#[cfg(feature = "validated-types")]
pub(crate) fn check_format(
    column: &str,
    semantic: SemanticType,
    value: &Value,
) -> crate::core::Result<()> {
    use garde::Validate;

    let Some(text) = value.as_str() else {
        return Ok(());
    };
    let reason = match semantic {
        SemanticType::Email => EmailAddress(text.to_string())
            .validate()
            .err()
            .map(|report| report.to_string()),
        SemanticType::Url | SemanticType::HttpUrl => match url::Url::parse(text) {
            Ok(parsed)
                if semantic == SemanticType::HttpUrl
                    && !matches!(parsed.scheme(), "http" | "https") =>
            {
                Some(format!("scheme '{}' is not http or https", parsed.scheme()))
            }
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        },
        _ => None,
    };
    match reason {
        Some(reason) => Err(ModelError::ConstraintViolation(format!(
            "Column '{}' is not a valid {}: {}",
            column, semantic, reason
        ))),
        None => Ok(()),
    }
}

#[cfg(not(feature = "validated-types"))]
pub(crate) fn check_format(
    _column: &str,
    _semantic: SemanticType,
    _value: &Value,
) -> crate::core::Result<()> {
    Ok(())
}

pub fn default_extensions() -> Vec<Box<dyn TypeExtension>> {
    vec![Box::new(ValidatedStringTypes)]
}

#[cfg(all(test, feature = "validated-types"))]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_email_is_rejected() {
        let bad = check_format("contact", SemanticType::Email, &Value::from("not-an-email"));
        assert!(matches!(bad, Err(ModelError::ConstraintViolation(_))));
        check_format("contact", SemanticType::Email, &Value::from("agatha@example.com")).unwrap();
    }

    #[test]
    fn test_http_url_requires_http_scheme() {
        let ftp = Value::from("ftp://files.example.com/book.pdf");
        check_format("homepage", SemanticType::Url, &ftp).unwrap();
        assert!(check_format("homepage", SemanticType::HttpUrl, &ftp).is_err());
        assert!(check_format("homepage", SemanticType::Url, &Value::from("no scheme")).is_err());
        check_format("homepage", SemanticType::HttpUrl, &Value::from("https://example.com")).unwrap();
    }

    #[test]
    fn test_null_and_plain_text_pass() {
        check_format("contact", SemanticType::Email, &Value::Null).unwrap();
        check_format("name", SemanticType::Text, &Value::from("not-an-email")).unwrap();
    }
}
