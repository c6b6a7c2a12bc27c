use crate::error::{ParseError, ParseErrorKind, Position};
use crate::types::Dialect;
use sqlparser::ast::Expr;
use sqlparser::dialect::{Dialect as SqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

/// Parse a single SQL expression using the specified dialect.
///
/// This is how stored expression texts are turned back into trees. The whole
/// input must form one expression; anything after it is a [`ParseErrorKind::TrailingInput`]
/// error.
pub fn parse_expr_with_dialect(sql: &str, dialect: Dialect) -> Result<Expr, ParseError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    match parse_single_expr(sqlparser_dialect.as_ref(), sql) {
        Ok(expr) => Ok(expr),
        Err(primary_err) => {
            // Generic dialect rejects a few Postgres operators (`?`, `->>`) that
            // show up in CHECK constraints over JSON columns.
            if matches!(dialect, Dialect::Generic) && looks_like_postgres_syntax(sql) {
                let postgres = PostgreSqlDialect {};
                if let Ok(expr) = parse_single_expr(&postgres, sql) {
                    return Ok(expr);
                }
            }
            Err(primary_err.with_dialect(dialect))
        }
    }
}

fn parse_single_expr(dialect: &dyn SqlDialect, sql: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(dialect).try_with_sql(sql)?;
    let expr = parser.parse_expr()?;

    let next = parser.peek_token();
    if next.token != Token::EOF {
        let mut err = ParseError::new(format!(
            "Expected end of expression, found: {}",
            next.token
        ))
        .with_kind(ParseErrorKind::TrailingInput);
        err.position = Some(Position {
            line: next.span.start.line as usize,
            column: next.span.start.column as usize,
        });
        return Err(err);
    }

    Ok(expr)
}

fn looks_like_postgres_syntax(sql: &str) -> bool {
    sql.contains("::")
        || sql.contains("->")
        || sql.contains("?|")
        || sql.contains("?&")
        || sql.contains(" ? ")
        || sql.contains("? '")
}

/// Parse a single SQL expression using the generic dialect.
pub fn parse_expr(sql: &str) -> Result<Expr, ParseError> {
    parse_expr_with_dialect(sql, Dialect::Generic)
}
