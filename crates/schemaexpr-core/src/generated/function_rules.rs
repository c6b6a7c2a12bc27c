//! Function argument handling rules per dialect.
//!
//! Generated from dialect_behavior.toml
//!
//! Some date/time functions take a unit keyword (`YEAR`, `day`, ...) as an argument.
//! The parser hands those over as plain identifiers, so without these rules the
//! column resolver would report them as unknown columns.

use crate::Dialect;

/// Returns argument indices that hold unit keywords rather than expressions.
///
/// The match is case-insensitive and underscore-insensitive, so `DATEADD` and
/// `DATE_ADD` share their rules. Unknown functions have no keyword arguments.
///
/// ```
/// use schemaexpr_core::generated::skip_args_for_function;
/// use schemaexpr_core::Dialect;
///
/// assert_eq!(skip_args_for_function(Dialect::Snowflake, "DATEDIFF"), &[0]);
/// assert_eq!(skip_args_for_function(Dialect::Postgres, "lower"), &[] as &[usize]);
/// ```
pub fn skip_args_for_function(dialect: Dialect, func_name: &str) -> &'static [usize] {
    // Normalize: lowercase and remove underscores to handle both DATEADD and DATE_ADD variants
    let func_normalized: String = func_name
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match func_normalized.as_str() {
        "datediff" => match dialect {
            Dialect::Bigquery => &[],
            Dialect::Databricks => &[],
            Dialect::Duckdb => &[],
            Dialect::Hive => &[],
            Dialect::Mssql => &[0],
            Dialect::Mysql => &[],
            Dialect::Redshift => &[0],
            Dialect::Snowflake => &[0],
            _ => &[],
        },
        "dateadd" => match dialect {
            Dialect::Bigquery => &[],
            Dialect::Hive => &[],
            Dialect::Mssql => &[0],
            Dialect::Mysql => &[],
            Dialect::Postgres => &[],
            Dialect::Snowflake => &[0],
            _ => &[],
        },
        "datepart" => match dialect {
            Dialect::Postgres => &[0],
            Dialect::Redshift => &[0],
            Dialect::Snowflake => &[0],
            _ => &[],
        },
        "datetrunc" => match dialect {
            Dialect::Bigquery => &[1],
            Dialect::Databricks => &[0],
            Dialect::Duckdb => &[0],
            Dialect::Postgres => &[0],
            Dialect::Redshift => &[0],
            Dialect::Snowflake => &[0],
            _ => &[],
        },
        "extract" => &[0],
        "timestampadd" => match dialect {
            Dialect::Bigquery => &[1],
            Dialect::Snowflake => &[0],
            _ => &[],
        },
        "timestampsub" => match dialect {
            Dialect::Bigquery => &[1],
            _ => &[],
        },
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_variants_share_rules() {
        assert_eq!(
            skip_args_for_function(Dialect::Snowflake, "DATEADD"),
            skip_args_for_function(Dialect::Snowflake, "date_add")
        );
    }

    #[test]
    fn test_extract_skips_unit_in_every_dialect() {
        assert_eq!(skip_args_for_function(Dialect::Generic, "extract"), &[0]);
        assert_eq!(skip_args_for_function(Dialect::Duckdb, "EXTRACT"), &[0]);
    }

    #[test]
    fn test_bigquery_date_trunc_unit_is_last() {
        assert_eq!(skip_args_for_function(Dialect::Bigquery, "DATE_TRUNC"), &[1]);
        assert_eq!(skip_args_for_function(Dialect::Postgres, "DATE_TRUNC"), &[0]);
    }
}
