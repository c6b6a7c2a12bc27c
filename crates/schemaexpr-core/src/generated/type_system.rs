//! SQL Type System for cross-dialect type normalization and compatibility.
//!
//! Generated from type_system.toml
//!
//! This module provides canonical SQL types, type normalization from dialect-specific
//! names to canonical types, and implicit cast checking.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical SQL types for cross-dialect type system.
///
/// These represent the fundamental SQL type categories that can be mapped
/// from various dialect-specific type names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
    Date,
    Time,
    Binary,
    Json,
    Array,
}

impl CanonicalType {
    /// Returns the canonical type name as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CanonicalType::Integer => "integer",
            CanonicalType::Float => "float",
            CanonicalType::Text => "text",
            CanonicalType::Boolean => "boolean",
            CanonicalType::Timestamp => "timestamp",
            CanonicalType::Date => "date",
            CanonicalType::Time => "time",
            CanonicalType::Binary => "binary",
            CanonicalType::Json => "json",
            CanonicalType::Array => "array",
        }
    }

    /// Whether values of this type take part in arithmetic.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, CanonicalType::Integer | CanonicalType::Float)
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Normalize a type name to its canonical type.
///
/// This function maps any dialect-specific type alias (e.g., "INT64", "VARCHAR",
/// "TIMESTAMPTZ") to its canonical type category.
///
/// # Example
///
/// ```
/// use schemaexpr_core::generated::{normalize_type_name, CanonicalType};
///
/// assert_eq!(normalize_type_name("INT64"), Some(CanonicalType::Integer));
/// assert_eq!(normalize_type_name("varchar"), Some(CanonicalType::Text));
/// assert_eq!(normalize_type_name("UNKNOWN_TYPE"), None);
/// ```
pub fn normalize_type_name(type_name: &str) -> Option<CanonicalType> {
    let lower = type_name.to_ascii_lowercase();
    match lower.as_str() {
        "array" => Some(CanonicalType::Array),
        "binary" | "varbinary" | "bytea" | "blob" | "bytes" => Some(CanonicalType::Binary),
        "bool" | "boolean" => Some(CanonicalType::Boolean),
        "date" => Some(CanonicalType::Date),
        "float" | "float4" | "float8" | "double" | "real" | "decimal" | "numeric" | "number"
        | "double precision" => Some(CanonicalType::Float),
        "int" | "int4" | "integer" | "int64" | "bigint" | "smallint" | "tinyint" | "int2"
        | "int8" | "serial" | "bigserial" => Some(CanonicalType::Integer),
        "json" | "jsonb" | "variant" | "object" => Some(CanonicalType::Json),
        "varchar" | "char" | "text" | "string" | "nvarchar" | "nchar" | "character"
        | "character varying" => Some(CanonicalType::Text),
        "time" | "timetz" => Some(CanonicalType::Time),
        "timestamp" | "timestamptz" | "datetime" | "timestamp_ntz" | "timestamp_ltz"
        | "timestamp_tz" => Some(CanonicalType::Timestamp),
        _ => None,
    }
}

/// Parse a declared column type (as written in DDL) into its canonical type.
///
/// Type modifiers and array suffixes are handled: `VARCHAR(20)` is text,
/// `NUMERIC(10, 2)` is float, `INT[]` is an array, and multi-word names such as
/// `TIMESTAMP WITH TIME ZONE` fall back to their leading word.
///
/// ```
/// use schemaexpr_core::generated::{parse_declared_type, CanonicalType};
///
/// assert_eq!(parse_declared_type("VARCHAR(20)"), Some(CanonicalType::Text));
/// assert_eq!(parse_declared_type("int[]"), Some(CanonicalType::Array));
/// assert_eq!(parse_declared_type("timestamp with time zone"), Some(CanonicalType::Timestamp));
/// ```
pub fn parse_declared_type(declared: &str) -> Option<CanonicalType> {
    let trimmed = declared.trim();
    if trimmed.ends_with("[]") {
        return Some(CanonicalType::Array);
    }
    let base = match trimmed.find('(') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    let words: Vec<&str> = base.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    normalize_type_name(&words.join(" ")).or_else(|| normalize_type_name(words[0]))
}

/// Check if a type can be implicitly cast to another type.
///
/// Implicit casts are automatic type conversions that SQL engines perform
/// without requiring explicit CAST expressions. This function returns true
/// if the source type can be implicitly converted to the target type.
///
/// Note: A type can always be implicitly cast to itself (identity cast).
///
/// # Example
///
/// ```
/// use schemaexpr_core::generated::{can_implicitly_cast, CanonicalType};
///
/// // Integer can be cast to Float
/// assert!(can_implicitly_cast(CanonicalType::Integer, CanonicalType::Float));
/// // Float cannot be cast to Integer implicitly
/// assert!(!can_implicitly_cast(CanonicalType::Float, CanonicalType::Integer));
/// // Any type can be cast to itself
/// assert!(can_implicitly_cast(CanonicalType::Text, CanonicalType::Text));
/// ```
pub fn can_implicitly_cast(from: CanonicalType, to: CanonicalType) -> bool {
    if from == to {
        return true;
    }
    match from {
        CanonicalType::Boolean => matches!(to, CanonicalType::Text | CanonicalType::Integer),
        CanonicalType::Date => matches!(to, CanonicalType::Timestamp | CanonicalType::Text),
        CanonicalType::Float => matches!(to, CanonicalType::Text),
        CanonicalType::Integer => matches!(to, CanonicalType::Float | CanonicalType::Text),
        CanonicalType::Json => matches!(to, CanonicalType::Text),
        CanonicalType::Time => matches!(to, CanonicalType::Text),
        CanonicalType::Timestamp => matches!(to, CanonicalType::Text),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_with_modifiers() {
        assert_eq!(
            parse_declared_type("NUMERIC(10, 2)"),
            Some(CanonicalType::Float)
        );
        assert_eq!(
            parse_declared_type("character varying(255)"),
            Some(CanonicalType::Text)
        );
        assert_eq!(
            parse_declared_type("DOUBLE PRECISION"),
            Some(CanonicalType::Float)
        );
    }

    #[test]
    fn test_declared_type_unknown() {
        assert_eq!(parse_declared_type("geography"), None);
        assert_eq!(parse_declared_type("   "), None);
    }

    #[test]
    fn test_integer_to_boolean_is_not_implicit() {
        assert!(!can_implicitly_cast(
            CanonicalType::Integer,
            CanonicalType::Boolean
        ));
        assert!(can_implicitly_cast(
            CanonicalType::Boolean,
            CanonicalType::Integer
        ));
    }

    #[test]
    fn test_display_is_uppercase() {
        assert_eq!(CanonicalType::Timestamp.to_string(), "TIMESTAMP");
    }
}
