use super::{ModelError, Result, Value};
use std::fmt;

/// Abstract data kind declared on a column, resolved to a [`ColumnType`]
/// through the registry's type map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticType {
    Integer,
    BigInt,
    Float,
    Text,
    Boolean,
    Uuid,
    Timestamp,
    Date,
    Document,
    Email,
    Url,
    HttpUrl,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Float => "float",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Uuid => "uuid",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Document => "document",
            Self::Email => "email",
            Self::Url => "url",
            Self::HttpUrl => "http_url",
        };
        write!(f, "{}", name)
    }
}

/// Physical column representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    BigInt,
    /// BIGINT fed from a table-scoped sequence.
    BigIntIdentity,
    Float,
    String(Option<u32>),
    Boolean,
    /// Native UUID.
    Guid,
    /// Timezone-aware timestamp normalized to UTC.
    TimestampUtc,
    Date,
    /// Binary JSON document.
    JsonB,
}

impl ColumnType {
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer | Self::BigInt | Self::BigIntIdentity, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_) | Value::Integer(_)) => true,
            (Self::String(None), Value::Text(_)) => true,
            (Self::String(Some(max)), Value::Text(s)) => s.chars().count() <= *max as usize,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Guid, Value::Uuid(_)) => true,
            (Self::TimestampUtc, Value::Timestamp(_)) => true,
            (Self::Date, Value::Date(_)) => true,
            (Self::JsonB, Value::Json(_)) => true,
            _ => false,
        }
    }

    pub fn sql_name(&self) -> String {
        match self {
            Self::Integer => "INTEGER".to_string(),
            Self::BigInt | Self::BigIntIdentity => "BIGINT".to_string(),
            Self::Float => "FLOAT".to_string(),
            Self::String(Some(len)) => format!("VARCHAR({})", len),
            Self::String(None) => "VARCHAR".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Guid => "UUID".to_string(),
            Self::TimestampUtc => "TIMESTAMP WITH TIME ZONE".to_string(),
            Self::Date => "DATE".to_string(),
            Self::JsonB => "JSONB".to_string(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_name())
    }
}

/// Target of a foreign key, written `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl ForeignKeyRef {
    pub fn parse(target: &str) -> Result<Self> {
        match target.split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok(Self {
                table: table.to_string(),
                column: column.to_string(),
            }),
            _ => Err(ModelError::invalid_declaration(format!(
                "foreign key target '{}' must be written as 'table.column'",
                target
            ))),
        }
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// A consumer-declared data column, before the registry resolves it.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub semantic: SemanticType,
    pub column_type: Option<ColumnType>,
    pub length: Option<u32>,
    pub nullable: bool,
    pub unique: bool,
    pub index: bool,
    pub foreign_key: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, semantic: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic,
            column_type: None,
            length: None,
            nullable: false,
            unique: false,
            index: false,
            foreign_key: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Maximum character length, only meaningful for string columns.
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// References `table.column`.
    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.foreign_key = Some(target.into());
        self
    }

    /// Bypasses the type map with an explicit physical type.
    pub fn column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = Some(column_type);
        self
    }
}
