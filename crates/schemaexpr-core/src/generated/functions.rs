//! Function classification sets.
//!
//! Generated from functions.json
//!
//! This module provides sets of SQL function names categorized by their behavior
//! (aggregate, window, table-generating) and by volatility. Schema expressions are
//! evaluated row by row long after they are declared, so the validators use these
//! classifications to reject functions that depend on other rows or on the moment
//! of evaluation.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::types::Volatility;

/// Aggregate functions (51 total).
pub static AGGREGATE_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = HashSet::new();
    set.insert("any_value");
    set.insert("approx_distinct");
    set.insert("approx_quantile");
    set.insert("approx_quantiles");
    set.insert("approx_top_k");
    set.insert("approx_top_k_accumulate");
    set.insert("approx_top_k_combine");
    set.insert("approx_top_sum");
    set.insert("approximate_similarity");
    set.insert("arg_max");
    set.insert("arg_min");
    set.insert("array_agg");
    set.insert("array_concat_agg");
    set.insert("array_union_agg");
    set.insert("array_unique_agg");
    set.insert("avg");
    set.insert("bitmap_construct_agg");
    set.insert("bitmap_or_agg");
    set.insert("bitwise_and_agg");
    set.insert("bitwise_or_agg");
    set.insert("bitwise_xor_agg");
    set.insert("boolxor_agg");
    set.insert("corr");
    set.insert("count");
    set.insert("count_if");
    set.insert("covar_pop");
    set.insert("covar_samp");
    set.insert("first");
    set.insert("group_concat");
    set.insert("grouping");
    set.insert("grouping_id");
    set.insert("hll");
    set.insert("json_object_agg");
    set.insert("jsonb_object_agg");
    set.insert("last");
    set.insert("logical_and");
    set.insert("logical_or");
    set.insert("max");
    set.insert("median");
    set.insert("min");
    set.insert("minhash");
    set.insert("minhash_combine");
    set.insert("object_agg");
    set.insert("quantile");
    set.insert("skewness");
    set.insert("stddev");
    set.insert("stddev_pop");
    set.insert("stddev_samp");
    set.insert("sum");
    set.insert("variance");
    set.insert("variance_pop");
    set
});

/// Window functions (13 total).
pub static WINDOW_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = HashSet::new();
    set.insert("cume_dist");
    set.insert("dense_rank");
    set.insert("first_value");
    set.insert("lag");
    set.insert("last_value");
    set.insert("lead");
    set.insert("nth_value");
    set.insert("ntile");
    set.insert("percent_rank");
    set.insert("percentile_cont");
    set.insert("percentile_disc");
    set.insert("rank");
    set.insert("row_number");
    set
});

/// Table-generating functions / UDTFs (9 total).
pub static UDTF_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = HashSet::new();
    set.insert("explode");
    set.insert("explode_outer");
    set.insert("generate_series");
    set.insert("json_array_elements");
    set.insert("jsonb_array_elements");
    set.insert("posexplode");
    set.insert("posexplode_outer");
    set.insert("regexp_split_to_table");
    set.insert("unnest");
    set
});

/// Volatile functions (19 total): results may differ between calls with identical
/// arguments.
pub static VOLATILE_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = HashSet::new();
    set.insert("clock_timestamp");
    set.insert("currval");
    set.insert("gen_random_uuid");
    set.insert("lastval");
    set.insert("newid");
    set.insert("nextval");
    set.insert("rand");
    set.insert("random");
    set.insert("random_uuid");
    set.insert("setseed");
    set.insert("setval");
    set.insert("timeofday");
    set.insert("txid_current");
    set.insert("unique_rowid");
    set.insert("uuid");
    set.insert("uuid_generate_v1");
    set.insert("uuid_generate_v4");
    set.insert("uuid_v4");
    set.insert("uuid_string");
    set
});

/// Stable functions (17 total): constant within a statement, but dependent on
/// session or transaction state.
pub static STABLE_FUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = HashSet::new();
    set.insert("curdate");
    set.insert("current_database");
    set.insert("current_date");
    set.insert("current_schema");
    set.insert("current_setting");
    set.insert("current_time");
    set.insert("current_timestamp");
    set.insert("current_user");
    set.insert("getdate");
    set.insert("localtime");
    set.insert("localtimestamp");
    set.insert("now");
    set.insert("session_user");
    set.insert("statement_timestamp");
    set.insert("sysdate");
    set.insert("today");
    set.insert("transaction_timestamp");
    set
});

/// Checks if a function is an aggregate function (e.g., SUM, COUNT, AVG).
///
/// Aggregate functions combine multiple input rows into a single output value,
/// which a per-row schema expression can never observe.
///
/// The check is case-insensitive. Uses ASCII lowercase for performance since
/// SQL function names are always ASCII.
pub fn is_aggregate_function(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    AGGREGATE_FUNCTIONS.contains(lower.as_str())
}

/// Checks if a function is a window function (e.g., ROW_NUMBER, RANK, LAG).
///
/// The check is case-insensitive.
pub fn is_window_function(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    WINDOW_FUNCTIONS.contains(lower.as_str())
}

/// Checks if a function is a table-generating function / UDTF (e.g., UNNEST, EXPLODE).
///
/// The check is case-insensitive.
pub fn is_udtf_function(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    UDTF_FUNCTIONS.contains(lower.as_str())
}

/// Returns the builtin volatility of a function.
///
/// Functions absent from both the volatile and the stable set are immutable.
/// Type checkers that know about user-defined functions override this through
/// [`crate::TypeChecker::function_volatility`].
///
/// # Example
///
/// ```
/// use schemaexpr_core::generated::function_volatility;
/// use schemaexpr_core::Volatility;
///
/// assert_eq!(function_volatility("RANDOM"), Volatility::Volatile);
/// assert_eq!(function_volatility("now"), Volatility::Stable);
/// assert_eq!(function_volatility("lower"), Volatility::Immutable);
/// ```
pub fn function_volatility(name: &str) -> Volatility {
    let lower = name.to_ascii_lowercase();
    if VOLATILE_FUNCTIONS.contains(lower.as_str()) {
        Volatility::Volatile
    } else if STABLE_FUNCTIONS.contains(lower.as_str()) {
        Volatility::Stable
    } else {
        Volatility::Immutable
    }
}

/// Return type rule for function type inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnTypeRule {
    /// Returns Integer (e.g., COUNT, LENGTH)
    Integer,
    /// Returns Float (e.g., SUM, AVG, ROUND)
    Numeric,
    /// Returns Text (e.g., CONCAT, SUBSTRING)
    Text,
    /// Returns Timestamp (e.g., NOW, CURRENT_TIMESTAMP)
    Timestamp,
    /// Returns Boolean
    Boolean,
    /// Returns Date (e.g., CURRENT_DATE)
    Date,
    /// Returns same type as first argument (e.g., ABS, COALESCE)
    MatchFirstArg,
}

/// Infers the return type rule for a SQL function.
///
/// Returns `None` for functions without a known rule; callers treat the result
/// type as unknown.
///
/// ```
/// use schemaexpr_core::generated::{infer_function_return_type, ReturnTypeRule};
///
/// assert_eq!(infer_function_return_type("LENGTH"), Some(ReturnTypeRule::Integer));
/// assert_eq!(infer_function_return_type("coalesce"), Some(ReturnTypeRule::MatchFirstArg));
/// assert_eq!(infer_function_return_type("my_udf"), None);
/// ```
pub fn infer_function_return_type(name: &str) -> Option<ReturnTypeRule> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "abs" => Some(ReturnTypeRule::MatchFirstArg),
        "any_value" => Some(ReturnTypeRule::MatchFirstArg),
        "avg" => Some(ReturnTypeRule::Numeric),
        "ceil" | "ceiling" | "floor" => Some(ReturnTypeRule::MatchFirstArg),
        "char_length" | "character_length" | "length" | "octet_length" => {
            Some(ReturnTypeRule::Integer)
        }
        "coalesce" | "greatest" | "least" | "nullif" | "ifnull" | "nvl" => {
            Some(ReturnTypeRule::MatchFirstArg)
        }
        "concat" | "concat_ws" => Some(ReturnTypeRule::Text),
        "count" => Some(ReturnTypeRule::Integer),
        "current_date" | "curdate" | "today" => Some(ReturnTypeRule::Date),
        "current_timestamp" | "now" | "getdate" | "sysdate" | "clock_timestamp" => {
            Some(ReturnTypeRule::Timestamp)
        }
        "date_trunc" => Some(ReturnTypeRule::Timestamp),
        "ends_with" | "starts_with" | "isfinite" => Some(ReturnTypeRule::Boolean),
        "initcap" | "left" | "lower" | "lpad" | "ltrim" | "md5" | "replace" | "right"
        | "rpad" | "rtrim" | "substr" | "substring" | "trim" | "upper" => {
            Some(ReturnTypeRule::Text)
        }
        "max" | "min" => Some(ReturnTypeRule::MatchFirstArg),
        "mod" => Some(ReturnTypeRule::MatchFirstArg),
        "random" | "round" | "sqrt" | "power" | "exp" | "ln" | "log" => {
            Some(ReturnTypeRule::Numeric)
        }
        "sum" => Some(ReturnTypeRule::Numeric),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_case_insensitive() {
        assert!(is_aggregate_function("SUM"));
        assert!(is_window_function("Row_Number"));
        assert!(is_udtf_function("UNNEST"));
        assert!(!is_aggregate_function("lower"));
    }

    #[test]
    fn test_volatility_ordering_of_builtins() {
        assert!(function_volatility("random") > function_volatility("now"));
        assert!(function_volatility("now") > function_volatility("abs"));
    }

    #[test]
    fn test_volatile_and_stable_sets_are_disjoint() {
        assert!(VOLATILE_FUNCTIONS.is_disjoint(&STABLE_FUNCTIONS));
    }
}
