//! Case sensitivity rules per dialect.
//!
//! Generated from dialects.json and normalization_overrides.toml

use std::borrow::Cow;

use crate::Dialect;

/// Normalization strategy for identifier handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationStrategy {
    /// Fold to lowercase (Postgres, Redshift)
    Lowercase,
    /// Fold to uppercase (Snowflake, Oracle)
    Uppercase,
    /// Case-insensitive comparison without folding
    CaseInsensitive,
    /// Case-sensitive, preserve exactly
    CaseSensitive,
}

impl NormalizationStrategy {
    /// Folds an unquoted identifier according to this strategy.
    ///
    /// `CaseInsensitive` folds to lowercase so that folded values can be compared
    /// with plain string equality.
    pub fn apply<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            Self::Lowercase | Self::CaseInsensitive => Cow::Owned(name.to_lowercase()),
            Self::Uppercase => Cow::Owned(name.to_uppercase()),
            Self::CaseSensitive => Cow::Borrowed(name),
        }
    }

    /// Whether an unquoted reference `reference` names the catalog identifier `stored`.
    ///
    /// Folding strategies fold the reference only: the catalog keeps the folded
    /// spelling, so `"Foo"` created with quotes is not reachable as `foo`.
    pub fn matches(&self, reference: &str, stored: &str) -> bool {
        match self {
            Self::Lowercase | Self::Uppercase => self.apply(reference) == stored,
            Self::CaseInsensitive => reference.to_lowercase() == stored.to_lowercase(),
            Self::CaseSensitive => reference == stored,
        }
    }
}

impl Dialect {
    /// Get the normalization strategy for this dialect.
    pub const fn normalization_strategy(&self) -> NormalizationStrategy {
        match self {
            Dialect::Bigquery => NormalizationStrategy::CaseInsensitive,
            Dialect::Clickhouse => NormalizationStrategy::CaseSensitive,
            Dialect::Databricks => NormalizationStrategy::CaseInsensitive,
            Dialect::Duckdb => NormalizationStrategy::CaseInsensitive,
            Dialect::Hive => NormalizationStrategy::CaseInsensitive,
            Dialect::Mssql => NormalizationStrategy::CaseInsensitive,
            Dialect::Mysql => NormalizationStrategy::CaseSensitive,
            Dialect::Postgres => NormalizationStrategy::Lowercase,
            Dialect::Redshift => NormalizationStrategy::CaseInsensitive,
            Dialect::Snowflake => NormalizationStrategy::Uppercase,
            Dialect::Sqlite => NormalizationStrategy::CaseInsensitive,
            Dialect::Generic => NormalizationStrategy::CaseInsensitive,
            Dialect::Ansi => NormalizationStrategy::Uppercase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_folds_reference_only() {
        let strategy = NormalizationStrategy::Lowercase;
        assert!(strategy.matches("Price", "price"));
        assert!(!strategy.matches("price", "Price"));
    }

    #[test]
    fn test_uppercase_folds_reference() {
        let strategy = NormalizationStrategy::Uppercase;
        assert!(strategy.matches("price", "PRICE"));
        assert_eq!(strategy.apply("price"), "PRICE");
    }

    #[test]
    fn test_case_insensitive_matches_any_spelling() {
        let strategy = NormalizationStrategy::CaseInsensitive;
        assert!(strategy.matches("PRICE", "Price"));
        assert!(strategy.matches("price", "PRICE"));
    }

    #[test]
    fn test_case_sensitive_requires_exact_spelling() {
        let strategy = NormalizationStrategy::CaseSensitive;
        assert!(strategy.matches("Price", "Price"));
        assert!(!strategy.matches("price", "Price"));
    }
}
