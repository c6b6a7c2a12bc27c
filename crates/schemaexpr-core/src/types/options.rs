//! Validation options and SQL dialect selection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::CaseSensitivity;
use crate::generated::NormalizationStrategy;

/// SQL dialect used for identifier normalization and for re-parsing stored
/// expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Generic,
    Ansi,
    Bigquery,
    Clickhouse,
    Databricks,
    Duckdb,
    Hive,
    Mssql,
    Mysql,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
}

impl Dialect {
    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{
            AnsiDialect, BigQueryDialect, ClickHouseDialect, DatabricksDialect, DuckDbDialect,
            GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
            RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
        };
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::Ansi => Box::new(AnsiDialect {}),
            Self::Bigquery => Box::new(BigQueryDialect {}),
            Self::Clickhouse => Box::new(ClickHouseDialect {}),
            Self::Databricks => Box::new(DatabricksDialect {}),
            Self::Duckdb => Box::new(DuckDbDialect {}),
            Self::Hive => Box::new(HiveDialect {}),
            Self::Mssql => Box::new(MsSqlDialect {}),
            Self::Mysql => Box::new(MySqlDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Redshift => Box::new(RedshiftSqlDialect {}),
            Self::Snowflake => Box::new(SnowflakeDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    /// Get the case sensitivity behavior for this dialect.
    pub fn default_case_sensitivity(&self) -> CaseSensitivity {
        match self.normalization_strategy() {
            NormalizationStrategy::Lowercase => CaseSensitivity::Lower,
            NormalizationStrategy::Uppercase => CaseSensitivity::Upper,
            NormalizationStrategy::CaseSensitive => CaseSensitivity::Exact,
            // CaseInsensitive dialects use lowercase folding for comparison
            NormalizationStrategy::CaseInsensitive => CaseSensitivity::Lower,
        }
    }
}

/// Options shared by every validator.
///
/// The defaults (generic dialect, dialect case sensitivity) suit catalogs whose
/// identifiers are compared case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Dialect for identifier folding and for parsing stored expressions
    #[serde(default)]
    pub dialect: Dialect,

    /// Override for identifier normalization (default 'dialect')
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitivity: Option<CaseSensitivity>,
}

impl ValidationOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            case_sensitivity: None,
        }
    }

    pub fn with_case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = Some(case_sensitivity);
        self
    }

    /// The effective identifier normalization strategy.
    pub fn normalization_strategy(&self) -> NormalizationStrategy {
        self.case_sensitivity
            .unwrap_or_default()
            .resolve(self.dialect)
    }
}
