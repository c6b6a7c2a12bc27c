//! Common types shared between the schema model and the validators.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Case sensitivity for identifier normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    /// Use dialect default
    #[default]
    Dialect,
    /// Lowercase normalization (Postgres)
    Lower,
    /// Uppercase normalization (Snowflake)
    Upper,
    /// Case-sensitive as-is (BigQuery)
    Exact,
}

impl CaseSensitivity {
    /// Resolves this case sensitivity setting to a concrete normalization strategy.
    ///
    /// When `self` is `Dialect`, uses the dialect's default strategy.
    /// Otherwise, returns the explicit strategy requested.
    pub fn resolve(&self, dialect: crate::Dialect) -> crate::generated::NormalizationStrategy {
        use crate::generated::NormalizationStrategy;
        match self {
            Self::Dialect => dialect.normalization_strategy(),
            Self::Lower => NormalizationStrategy::Lowercase,
            Self::Upper => NormalizationStrategy::Uppercase,
            Self::Exact => NormalizationStrategy::CaseSensitive,
        }
    }
}

/// How much a function's result may vary between evaluations.
///
/// Ordered from least to most volatile, so policies can compare against a ceiling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    /// Same arguments always produce the same result.
    Immutable,
    /// Constant within a statement (e.g. `now()`).
    Stable,
    /// May change on every call (e.g. `random()`).
    Volatile,
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volatility::Immutable => write!(f, "immutable"),
            Volatility::Stable => write!(f, "stable"),
            Volatility::Volatile => write!(f, "volatile"),
        }
    }
}
