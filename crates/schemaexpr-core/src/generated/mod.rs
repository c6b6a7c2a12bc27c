//! Dialect semantics tables.
//!
//! These modules were generated from the dialect semantics specs and are committed
//! to version control. They hold the data-driven parts of the validators: identifier
//! normalization, function classification and volatility, keyword arguments of
//! date/time functions, and the canonical type system.

mod case_sensitivity;
mod function_rules;
mod functions;
mod type_system;

pub use case_sensitivity::NormalizationStrategy;
pub use function_rules::skip_args_for_function;
pub use functions::{
    function_volatility, is_aggregate_function, is_udtf_function, is_window_function,
    infer_function_return_type, ReturnTypeRule, AGGREGATE_FUNCTIONS, STABLE_FUNCTIONS,
    UDTF_FUNCTIONS, VOLATILE_FUNCTIONS, WINDOW_FUNCTIONS,
};
pub use type_system::{can_implicitly_cast, normalize_type_name, parse_declared_type, CanonicalType};
