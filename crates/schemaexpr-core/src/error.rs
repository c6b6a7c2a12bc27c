//! Error types for schema expression validation.
//!
//! # Error Handling Strategy
//!
//! Every failure here comes from invalid user input, so all errors are terminal:
//!
//! - [`ParseError`]: a stored expression text could not be parsed back into a tree.
//!   Keeps the position and category recovered from the `sqlparser` message.
//!
//! - [`SchemaExprError`]: the semantic errors surfaced to whoever issued the DDL
//!   statement (unknown or ambiguous columns, cross-table references, policy
//!   violations, type mismatches).
//!
//! Validators return the first error they meet and never downgrade or retry it.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::trace;

use crate::expr::{ForbiddenConstruct, NodePath};
use crate::types::{Dialect, ExpressionKind};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SchemaExprError>;

/// Semantic validation error.
#[derive(Debug, Clone, Error)]
pub enum SchemaExprError {
    /// The reference names no visible column of the table.
    #[error("column \"{name}\" does not exist")]
    UnknownColumn { name: String },

    /// More than one visible column matches the reference.
    #[error("column reference \"{name}\" is ambiguous (candidates: {})", candidates.join(", "))]
    AmbiguousReference {
        name: String,
        candidates: Vec<String>,
    },

    /// A qualified reference names another table or database.
    #[error("column reference \"{reference}\" does not belong to table \"{table}\"")]
    CrossTableReference { reference: String, table: String },

    /// A construct the expression kind forbids.
    #[error("{} is not allowed in {context} (at {path})", describe_violation(*construct, subject.as_deref()))]
    PolicyViolation {
        construct: ForbiddenConstruct,
        /// Function or column name involved, when there is one.
        subject: Option<String>,
        context: ExpressionKind,
        path: NodePath,
    },

    /// A construct no schema expression may contain, whatever its kind.
    #[error("{construct} is not supported in schema expressions (at {path})")]
    UnsupportedExpression { construct: String, path: NodePath },

    /// The result type is incompatible with the required type.
    #[error("expected {expected} expression, but \"{expr}\" has type {actual}")]
    TypeMismatch {
        expected: String,
        actual: String,
        expr: String,
    },

    #[error("type \"{0}\" is not supported")]
    UnsupportedType(String),

    #[error("duplicate constraint name: \"{0}\"")]
    DuplicateConstraintName(String),

    #[error("column \"{column}\" is referenced by computed column(s) {}", dependents.join(", "))]
    ColumnHasDependents {
        column: String,
        dependents: Vec<String>,
    },

    #[error("computed columns reference each other in a cycle: {}", columns.join(" -> "))]
    DependencyCycle { columns: Vec<String> },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SchemaExprError {
    /// Node path of a policy violation or unsupported construct.
    pub fn node_path(&self) -> Option<&NodePath> {
        match self {
            SchemaExprError::PolicyViolation { path, .. }
            | SchemaExprError::UnsupportedExpression { path, .. } => Some(path),
            _ => None,
        }
    }
}

fn describe_violation(construct: ForbiddenConstruct, subject: Option<&str>) -> String {
    match subject {
        Some(subject) => format!("{construct} \"{subject}\""),
        None => construct.to_string(),
    }
}

/// Error encountered while parsing expression text.
///
/// This error preserves structured information from the underlying parser
/// including position information when available.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Line and column where the error occurred, if available.
    pub position: Option<Position>,
    /// The SQL dialect being parsed when the error occurred.
    pub dialect: Option<Dialect>,
    /// The specific category of parse error.
    pub kind: ParseErrorKind,
}

/// Position information for a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

/// Category of parse error for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorKind {
    /// Unexpected token or character in input.
    #[default]
    SyntaxError,
    /// Input continues after a complete expression.
    TrailingInput,
    /// Invalid or unexpected end of input.
    UnexpectedEof,
    /// Lexer/tokenization error.
    LexerError,
}

impl ParseError {
    /// Creates a new parse error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
            kind: ParseErrorKind::SyntaxError,
        }
    }

    /// Adds dialect context to the error.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Sets the error kind.
    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Parses position from sqlparser error message format.
    ///
    /// sqlparser uses format like "Expected ..., found ... at Line: X, Column: Y".
    /// This is coupled to the `sqlparser` message format and returns `None` when
    /// the format is not found.
    fn parse_position_from_message(message: &str) -> Option<Position> {
        static POSITION_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = POSITION_REGEX.get_or_init(|| {
            Regex::new(r"Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").expect("Invalid regex pattern")
        });

        let result = re.captures(message).and_then(|caps| {
            let line: usize = caps.get(1)?.as_str().parse().ok()?;
            let column: usize = caps.get(2)?.as_str().parse().ok()?;
            Some(Position { line, column })
        });

        #[cfg(feature = "tracing")]
        if result.is_none() && (message.contains("Line") || message.contains("Column")) {
            trace!(
                "Failed to parse position from error message that appears to contain position info: {}",
                message
            );
        }

        result
    }

    fn infer_kind_from_message(message: &str) -> ParseErrorKind {
        let lower = message.to_lowercase();
        if lower.contains("unexpected end") || lower.contains("eof") {
            ParseErrorKind::UnexpectedEof
        } else if lower.contains("lexer") || lower.contains("tokeniz") {
            ParseErrorKind::LexerError
        } else {
            ParseErrorKind::SyntaxError
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error")?;

        if let Some(dialect) = self.dialect {
            write!(f, " ({dialect:?})")?;
        }

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }

        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        let message = err.to_string();
        let position = Self::parse_position_from_message(&message);
        let kind = Self::infer_kind_from_message(&message);

        Self {
            message,
            position,
            dialect: None,
            kind,
        }
    }
}
