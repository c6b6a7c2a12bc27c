//! Type inference for schema expressions.
//!
//! The validators consume type information through the [`TypeChecker`] trait so
//! a catalog with its own type engine can plug it in. [`SchemaTypeChecker`] is
//! the default implementation: it infers canonical types from literals, casts,
//! known functions and the declared types of the table's columns, and rejects
//! operators applied to incompatible operands.
//!
//! ## Limitations
//!
//! - `NULL` and expressions of unknown type infer to `None`; callers accept them.
//! - Functions without a return type rule infer to `None`.
//! - Array elements, struct fields and JSON paths infer to `None`.
//! - Expressions nested deeper than the recursion limit are not type checked.

use sqlparser::ast::{self as ast, BinaryOperator, Expr, FunctionArg, FunctionArgExpr};

use super::column_ref::ColumnRef;
use super::resolver::ColumnResolver;
use super::walk::function_name;
use crate::error::{Result, SchemaExprError};
use crate::generated::{
    can_implicitly_cast, function_volatility, infer_function_return_type, parse_declared_type,
    skip_args_for_function, CanonicalType, ReturnTypeRule,
};
use crate::types::{Dialect, TableSchema, ValidationOptions, Volatility};

/// Maximum recursion depth for expression traversal to prevent stack overflow.
const MAX_RECURSION_DEPTH: usize = 100;

/// Type information the validators need about an expression.
pub trait TypeChecker: Send + Sync {
    /// Result type of `expr` evaluated against rows of `table`.
    ///
    /// `Ok(None)` means the type could not be determined.
    fn infer_type(&self, expr: &Expr, table: &TableSchema) -> Result<Option<CanonicalType>>;

    /// Whether values of `from` are implicitly converted to `to`.
    fn can_cast(&self, from: CanonicalType, to: CanonicalType) -> bool {
        can_implicitly_cast(from, to)
    }

    fn function_volatility(&self, name: &str) -> Volatility {
        function_volatility(name)
    }
}

/// Schema-aware [`TypeChecker`] built on the canonical type system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaTypeChecker {
    options: ValidationOptions,
}

impl SchemaTypeChecker {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }
}

impl TypeChecker for SchemaTypeChecker {
    fn infer_type(&self, expr: &Expr, table: &TableSchema) -> Result<Option<CanonicalType>> {
        let inference = Inference {
            resolver: ColumnResolver::new(table, &self.options),
            dialect: self.options.dialect,
        };
        inference.infer(expr, 0)
    }
}

struct Inference<'a> {
    resolver: ColumnResolver<'a>,
    dialect: Dialect,
}

impl Inference<'_> {
    fn infer(&self, expr: &Expr, depth: usize) -> Result<Option<CanonicalType>> {
        if depth > MAX_RECURSION_DEPTH {
            return Ok(None);
        }
        let next_depth = depth + 1;

        match expr {
            Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
                let Some(column_ref) = ColumnRef::from_expr(expr)? else {
                    return Ok(None);
                };
                let column = self.resolver.resolve_descriptor(&column_ref)?;
                parse_declared_type(&column.data_type)
                    .map(Some)
                    .ok_or_else(|| SchemaExprError::UnsupportedType(column.data_type.clone()))
            }
            Expr::Value(ast::ValueWithSpan { value, .. }) => Ok(literal_type(value)),
            Expr::Cast {
                expr: inner,
                data_type,
                ..
            } => {
                self.infer(inner, next_depth)?;
                let name = data_type.to_string();
                parse_declared_type(&name)
                    .map(Some)
                    .ok_or(SchemaExprError::UnsupportedType(name))
            }
            Expr::Nested(inner) | Expr::Collate { expr: inner, .. } => {
                self.infer(inner, next_depth)
            }
            Expr::UnaryOp { op, expr: inner } => {
                let inner_type = self.infer(inner, next_depth)?;
                match op {
                    ast::UnaryOperator::Not => {
                        self.expect_boolean(inner, inner_type)?;
                        Ok(Some(CanonicalType::Boolean))
                    }
                    ast::UnaryOperator::Plus | ast::UnaryOperator::Minus => {
                        if let Some(t) = inner_type.filter(|t| !t.is_numeric()) {
                            return Err(mismatch("numeric", t, expr));
                        }
                        Ok(inner_type)
                    }
                    _ => Ok(None),
                }
            }
            Expr::BinaryOp { left, op, right } => {
                let l_type = self.infer(left, next_depth)?;
                let r_type = self.infer(right, next_depth)?;
                self.binary_op_type(expr, left, op, right, l_type, r_type)
            }
            Expr::IsNull(inner)
            | Expr::IsNotNull(inner)
            | Expr::IsUnknown(inner)
            | Expr::IsNotUnknown(inner) => {
                self.infer(inner, next_depth)?;
                Ok(Some(CanonicalType::Boolean))
            }
            Expr::IsTrue(inner)
            | Expr::IsNotTrue(inner)
            | Expr::IsFalse(inner)
            | Expr::IsNotFalse(inner) => {
                let inner_type = self.infer(inner, next_depth)?;
                self.expect_boolean(inner, inner_type)?;
                Ok(Some(CanonicalType::Boolean))
            }
            Expr::IsDistinctFrom(left, right) | Expr::IsNotDistinctFrom(left, right) => {
                let l_type = self.infer(left, next_depth)?;
                let r_type = self.infer(right, next_depth)?;
                self.expect_comparable(expr, l_type, r_type)?;
                Ok(Some(CanonicalType::Boolean))
            }
            Expr::Between {
                expr: inner,
                low,
                high,
                ..
            } => {
                let value_type = self.infer(inner, next_depth)?;
                let low_type = self.infer(low, next_depth)?;
                let high_type = self.infer(high, next_depth)?;
                self.expect_comparable(expr, value_type, low_type)?;
                self.expect_comparable(expr, value_type, high_type)?;
                Ok(Some(CanonicalType::Boolean))
            }
            Expr::InList {
                expr: inner, list, ..
            } => {
                let value_type = self.infer(inner, next_depth)?;
                for item in list {
                    let item_type = self.infer(item, next_depth)?;
                    self.expect_comparable(expr, value_type, item_type)?;
                }
                Ok(Some(CanonicalType::Boolean))
            }
            Expr::Like {
                expr: inner,
                pattern,
                ..
            }
            | Expr::ILike {
                expr: inner,
                pattern,
                ..
            }
            | Expr::SimilarTo {
                expr: inner,
                pattern,
                ..
            }
            | Expr::RLike {
                expr: inner,
                pattern,
                ..
            } => {
                self.infer(inner, next_depth)?;
                self.infer(pattern, next_depth)?;
                Ok(Some(CanonicalType::Boolean))
            }
            Expr::InSubquery { .. }
            | Expr::Exists { .. }
            | Expr::AnyOp { .. }
            | Expr::AllOp { .. } => Ok(Some(CanonicalType::Boolean)),
            Expr::Case {
                operand,
                conditions,
                else_result,
                ..
            } => {
                let operand_type = match operand {
                    Some(op) => self.infer(op, next_depth)?,
                    None => None,
                };
                let mut result_type = None;
                for case_when in conditions {
                    let condition_type = self.infer(&case_when.condition, next_depth)?;
                    if operand.is_some() {
                        self.expect_comparable(expr, operand_type, condition_type)?;
                    } else {
                        self.expect_boolean(&case_when.condition, condition_type)?;
                    }
                    let branch = self.infer(&case_when.result, next_depth)?;
                    result_type = self.unify_branches(expr, result_type, branch)?;
                }
                if let Some(el) = else_result {
                    let branch = self.infer(el, next_depth)?;
                    result_type = self.unify_branches(expr, result_type, branch)?;
                }
                Ok(result_type)
            }
            Expr::Function(func) => {
                let name = function_name(func);
                let skip = skip_args_for_function(self.dialect, &name);
                let mut arg_types = Vec::new();
                if let ast::FunctionArguments::List(args) = &func.args {
                    for (index, arg) in args.args.iter().enumerate() {
                        match arg {
                            FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                            | FunctionArg::Named {
                                arg: FunctionArgExpr::Expr(e),
                                ..
                            } if !skip.contains(&index) => {
                                arg_types.push(self.infer(e, next_depth)?);
                            }
                            _ => arg_types.push(None),
                        }
                    }
                }
                Ok(match infer_function_return_type(&name) {
                    Some(ReturnTypeRule::Integer) => Some(CanonicalType::Integer),
                    Some(ReturnTypeRule::Numeric) => Some(CanonicalType::Float),
                    Some(ReturnTypeRule::Text) => Some(CanonicalType::Text),
                    Some(ReturnTypeRule::Timestamp) => Some(CanonicalType::Timestamp),
                    Some(ReturnTypeRule::Boolean) => Some(CanonicalType::Boolean),
                    Some(ReturnTypeRule::Date) => Some(CanonicalType::Date),
                    Some(ReturnTypeRule::MatchFirstArg) => arg_types.into_iter().flatten().next(),
                    None => None,
                })
            }
            Expr::Ceil { expr: inner, .. } | Expr::Floor { expr: inner, .. } => {
                self.infer(inner, next_depth)
            }
            Expr::Extract { expr: inner, .. } => {
                self.infer(inner, next_depth)?;
                Ok(Some(CanonicalType::Integer))
            }
            Expr::Position { expr: inner, r#in } => {
                self.infer(inner, next_depth)?;
                self.infer(r#in, next_depth)?;
                Ok(Some(CanonicalType::Integer))
            }
            Expr::Substring { expr: inner, .. }
            | Expr::Trim { expr: inner, .. }
            | Expr::Overlay { expr: inner, .. } => {
                self.infer(inner, next_depth)?;
                Ok(Some(CanonicalType::Text))
            }
            Expr::AtTimeZone { timestamp, .. } => {
                self.infer(timestamp, next_depth)?;
                Ok(Some(CanonicalType::Timestamp))
            }
            Expr::Array(_) => Ok(Some(CanonicalType::Array)),
            Expr::Convert {
                expr: inner,
                data_type,
                ..
            } => {
                self.infer(inner, next_depth)?;
                let Some(data_type) = data_type else {
                    // CONVERT(x USING charset)
                    return Ok(Some(CanonicalType::Text));
                };
                let name = data_type.to_string();
                parse_declared_type(&name)
                    .map(Some)
                    .ok_or(SchemaExprError::UnsupportedType(name))
            }
            Expr::IsNormalized { expr: inner, .. } => {
                self.infer(inner, next_depth)?;
                Ok(Some(CanonicalType::Boolean))
            }
            Expr::MemberOf(member_of) => {
                self.infer(&member_of.value, next_depth)?;
                self.infer(&member_of.array, next_depth)?;
                Ok(Some(CanonicalType::Boolean))
            }
            // Element and field types are not tracked; only the base is resolved.
            Expr::CompoundFieldAccess { root, .. } => {
                match ColumnRef::from_expr(expr)? {
                    Some(column_ref) => {
                        self.resolver.resolve_descriptor(&column_ref)?;
                    }
                    None => {
                        self.infer(root, next_depth)?;
                    }
                }
                Ok(None)
            }
            Expr::JsonAccess { value, .. } => {
                self.infer(value, next_depth)?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn binary_op_type(
        &self,
        expr: &Expr,
        left: &Expr,
        op: &BinaryOperator,
        right: &Expr,
        l_type: Option<CanonicalType>,
        r_type: Option<CanonicalType>,
    ) -> Result<Option<CanonicalType>> {
        match op {
            BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq => {
                self.expect_comparable(expr, l_type, r_type)?;
                Ok(Some(CanonicalType::Boolean))
            }
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Xor => {
                self.expect_boolean(left, l_type)?;
                self.expect_boolean(right, r_type)?;
                Ok(Some(CanonicalType::Boolean))
            }
            BinaryOperator::Plus
            | BinaryOperator::Minus
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Modulo => arithmetic_type(expr, op, l_type, r_type),
            BinaryOperator::StringConcat => Ok(Some(CanonicalType::Text)),
            _ => Ok(None),
        }
    }

    fn expect_boolean(&self, expr: &Expr, actual: Option<CanonicalType>) -> Result<()> {
        match actual {
            Some(t) if t != CanonicalType::Boolean && !self.lenient_boolean(t) => {
                Err(mismatch(CanonicalType::Boolean.to_string(), t, expr))
            }
            _ => Ok(()),
        }
    }

    /// Integer-as-boolean dialects accept `WHERE flag AND 1`.
    fn lenient_boolean(&self, t: CanonicalType) -> bool {
        t == CanonicalType::Integer && boolean_integer_dialect(self.dialect)
    }

    fn expect_comparable(
        &self,
        expr: &Expr,
        left: Option<CanonicalType>,
        right: Option<CanonicalType>,
    ) -> Result<()> {
        let (Some(l_type), Some(r_type)) = (left, right) else {
            return Ok(());
        };
        if are_types_comparable(l_type, r_type, self.dialect) {
            Ok(())
        } else {
            Err(mismatch(l_type.to_string(), r_type, expr))
        }
    }

    fn unify_branches(
        &self,
        expr: &Expr,
        current: Option<CanonicalType>,
        branch: Option<CanonicalType>,
    ) -> Result<Option<CanonicalType>> {
        match (current, branch) {
            (Some(c), Some(b)) if c == b => Ok(Some(c)),
            (Some(c), Some(b)) if c.is_numeric() && b.is_numeric() => {
                Ok(Some(CanonicalType::Float))
            }
            (Some(c), Some(b)) if is_temporal(c) && is_temporal(b) => {
                Ok(Some(CanonicalType::Timestamp))
            }
            (Some(c), Some(b)) => Err(mismatch(c.to_string(), b, expr)),
            (current, branch) => Ok(current.or(branch)),
        }
    }
}

fn literal_type(value: &ast::Value) -> Option<CanonicalType> {
    match value {
        ast::Value::Number(text, _) => {
            if text.contains(['.', 'e', 'E']) {
                Some(CanonicalType::Float)
            } else {
                Some(CanonicalType::Integer)
            }
        }
        ast::Value::SingleQuotedString(_)
        | ast::Value::DoubleQuotedString(_)
        | ast::Value::DollarQuotedString(_)
        | ast::Value::EscapedStringLiteral(_)
        | ast::Value::NationalStringLiteral(_)
        | ast::Value::UnicodeStringLiteral(_) => Some(CanonicalType::Text),
        ast::Value::HexStringLiteral(_) => Some(CanonicalType::Binary),
        ast::Value::Boolean(_) => Some(CanonicalType::Boolean),
        _ => None,
    }
}

fn arithmetic_type(
    expr: &Expr,
    op: &BinaryOperator,
    l_type: Option<CanonicalType>,
    r_type: Option<CanonicalType>,
) -> Result<Option<CanonicalType>> {
    let (Some(l), Some(r)) = (l_type, r_type) else {
        return Ok(l_type.or(r_type));
    };

    if l.is_numeric() && r.is_numeric() {
        return Ok(Some(if l == r { l } else { CanonicalType::Float }));
    }
    // Text + text is concatenation in some dialects.
    if *op == BinaryOperator::Plus && l == CanonicalType::Text && r == CanonicalType::Text {
        return Ok(Some(CanonicalType::Text));
    }
    // Date/timestamp shifted by a number of days.
    if matches!(op, BinaryOperator::Plus | BinaryOperator::Minus)
        && is_temporal(l)
        && r == CanonicalType::Integer
    {
        return Ok(Some(l));
    }

    let l_can_be_numeric = l.is_numeric() || can_implicitly_cast(l, CanonicalType::Float);
    let r_can_be_numeric = r.is_numeric() || can_implicitly_cast(r, CanonicalType::Float);
    if l_can_be_numeric && r_can_be_numeric {
        return Ok(Some(CanonicalType::Float));
    }

    let offending = if l_can_be_numeric { r } else { l };
    Err(mismatch("numeric", offending, expr))
}

fn is_temporal(t: CanonicalType) -> bool {
    matches!(t, CanonicalType::Date | CanonicalType::Timestamp)
}

/// Checks if two types are comparable (can be used in comparison operators).
///
/// This is stricter than implicit casting: comparing a number to a string is
/// rejected even though numbers can be cast to strings.
///
/// Boolean/Integer comparison is allowed in dialects that represent booleans as
/// integers 0/1, but not in dialects with strict boolean types.
fn are_types_comparable(left: CanonicalType, right: CanonicalType, dialect: Dialect) -> bool {
    if left == right {
        return true;
    }

    if left.is_numeric() && right.is_numeric() {
        return true;
    }

    if is_temporal(left) && is_temporal(right) {
        return true;
    }

    if (left == CanonicalType::Boolean && right == CanonicalType::Integer)
        || (left == CanonicalType::Integer && right == CanonicalType::Boolean)
    {
        return boolean_integer_dialect(dialect);
    }

    false
}

fn boolean_integer_dialect(dialect: Dialect) -> bool {
    matches!(
        dialect,
        Dialect::Mysql | Dialect::Mssql | Dialect::Sqlite | Dialect::Generic
    )
}

fn mismatch(expected: impl Into<String>, actual: CanonicalType, expr: &Expr) -> SchemaExprError {
    SchemaExprError::TypeMismatch {
        expected: expected.into(),
        actual: actual.to_string(),
        expr: expr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr_with_dialect;
    use crate::types::ColumnDescriptor;

    fn table() -> TableSchema {
        TableSchema::new("t")
            .with_column(ColumnDescriptor::new(1, "id", "bigint"))
            .with_column(ColumnDescriptor::new(2, "price", "numeric(10, 2)"))
            .with_column(ColumnDescriptor::new(3, "name", "varchar(40)"))
            .with_column(ColumnDescriptor::new(4, "active", "boolean"))
            .with_column(ColumnDescriptor::new(5, "created", "date"))
            .with_column(ColumnDescriptor::new(6, "shape", "geometry"))
            .with_column(ColumnDescriptor::new(7, "tags", "text[]"))
    }

    fn infer_with(dialect: Dialect, sql: &str) -> Result<Option<CanonicalType>> {
        let expr = parse_expr_with_dialect(sql, dialect).unwrap();
        SchemaTypeChecker::new(ValidationOptions::new(dialect)).infer_type(&expr, &table())
    }

    fn infer(sql: &str) -> Result<Option<CanonicalType>> {
        infer_with(Dialect::Postgres, sql)
    }

    #[test]
    fn test_infer_literals() {
        assert_eq!(infer("123").unwrap(), Some(CanonicalType::Integer));
        assert_eq!(infer("1.5").unwrap(), Some(CanonicalType::Float));
        assert_eq!(infer("'abc'").unwrap(), Some(CanonicalType::Text));
        assert_eq!(infer("true").unwrap(), Some(CanonicalType::Boolean));
        assert_eq!(infer("NULL").unwrap(), None);
    }

    #[test]
    fn test_infer_column_types() {
        assert_eq!(infer("id").unwrap(), Some(CanonicalType::Integer));
        assert_eq!(infer("t.price").unwrap(), Some(CanonicalType::Float));
        assert_eq!(infer("id + 1").unwrap(), Some(CanonicalType::Integer));
        assert_eq!(infer("id * price").unwrap(), Some(CanonicalType::Float));
        assert_eq!(infer("name || '!'").unwrap(), Some(CanonicalType::Text));
    }

    #[test]
    fn test_unsupported_column_type() {
        assert!(matches!(
            infer("shape IS NULL"),
            Err(SchemaExprError::UnsupportedType(t)) if t == "geometry"
        ));
    }

    #[test]
    fn test_comparison_mismatch() {
        let err = infer("price > name").unwrap_err();
        match err {
            SchemaExprError::TypeMismatch {
                expected,
                actual,
                expr,
            } => {
                assert_eq!(expected, "FLOAT");
                assert_eq!(actual, "TEXT");
                assert_eq!(expr, "price > name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_arithmetic_mismatch() {
        assert!(matches!(infer("name * 2"), Err(SchemaExprError::TypeMismatch { .. })));
        assert_eq!(infer("created + 7").unwrap(), Some(CanonicalType::Date));
    }

    #[test]
    fn test_boolean_integer_comparison_is_dialect_aware() {
        assert!(infer_with(Dialect::Mysql, "active = 1").is_ok());
        assert!(matches!(
            infer_with(Dialect::Postgres, "active = 1"),
            Err(SchemaExprError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_logical_operands_must_be_boolean() {
        assert!(matches!(
            infer("active AND name"),
            Err(SchemaExprError::TypeMismatch { .. })
        ));
        assert_eq!(
            infer("active AND id > 0").unwrap(),
            Some(CanonicalType::Boolean)
        );
    }

    #[test]
    fn test_cast_and_functions() {
        assert_eq!(infer("CAST(id AS TEXT)").unwrap(), Some(CanonicalType::Text));
        assert_eq!(infer("length(name)").unwrap(), Some(CanonicalType::Integer));
        assert_eq!(infer("coalesce(price, 0)").unwrap(), Some(CanonicalType::Float));
        assert_eq!(infer("my_udf(id)").unwrap(), None);
    }

    #[test]
    fn test_convert_and_field_access() {
        assert_eq!(
            infer_with(Dialect::Mysql, "CONVERT(price, INT)").unwrap(),
            Some(CanonicalType::Integer)
        );
        assert_eq!(
            infer_with(Dialect::Mysql, "CONVERT(name USING utf8mb4)").unwrap(),
            Some(CanonicalType::Text)
        );
        assert_eq!(infer("tags[1]").unwrap(), None);
        assert!(matches!(
            infer("labels[1] = 'x'"),
            Err(SchemaExprError::UnknownColumn { name }) if name == "labels"
        ));
    }

    #[test]
    fn test_case_branches_unify() {
        assert_eq!(
            infer("CASE WHEN active THEN id ELSE price END").unwrap(),
            Some(CanonicalType::Float)
        );
        assert!(matches!(
            infer("CASE WHEN active THEN id ELSE name END"),
            Err(SchemaExprError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_default_trait_methods() {
        let checker = SchemaTypeChecker::default();
        assert!(checker.can_cast(CanonicalType::Integer, CanonicalType::Float));
        assert_eq!(checker.function_volatility("random"), Volatility::Volatile);
    }
}
