//! Error types for filter compilation with actionable messages.
//!
//! Every error carries:
//! - An error code for programmatic handling
//! - The field being compiled, when known
//! - Suggestions and help text for fixing the declaration
//!
//! # Error Codes
//!
//! Error codes follow a pattern: S{category}{number}
//! - 1xxx: Filter errors (invalid filter construction)
//! - 7xxx: Configuration errors (declarations that do not fit the entity model)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use sieve_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::invalid_relation_path("account..status", "empty segment");
//! assert_eq!(err.code, ErrorCode::InvalidRelationPath);
//! assert!(err.is_configuration_error());
//! assert_eq!(err.code.code(), "S7002");
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for compilation operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Filter errors (1xxx)
    /// Invalid filter or where clause (S1003).
    InvalidFilter = 1003,

    // Configuration errors (7xxx)
    /// Invalid configuration (S7001).
    InvalidConfiguration = 7001,
    /// Relation path cannot be resolved (S7002).
    InvalidRelationPath = 7002,
    /// Value shape not supported by the operator (S7003).
    InvalidFilterValue = 7003,
    /// Size operator applied to a non-collection attribute (S7004).
    NotACollection = 7004,
    /// Reading a declared field failed (S7005).
    FieldAccess = 7005,

    // Internal errors (9xxx)
    /// Internal error (S9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S7002").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidFilter => "Invalid filter condition",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::InvalidRelationPath => "Invalid relation path",
            Self::InvalidFilterValue => "Invalid filter value",
            Self::NotACollection => "Attribute is not a collection",
            Self::FieldAccess => "Field access failed",
            Self::Internal => "Internal error",
        }
    }

    /// Whether this code denotes a mismatch between filter declarations and the entity model.
    pub fn is_configuration(&self) -> bool {
        (*self as u16) / 1000 == 7
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The filter type being compiled.
    pub filter: Option<String>,
    /// The declared field involved.
    pub field: Option<String>,
    /// The operator involved.
    pub operation: Option<String>,
    /// The relation path involved.
    pub relation_path: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while compiling a filter specification.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the filter type.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.context.filter = Some(filter.into());
        self
    }

    /// Set the field. An already recorded field is kept.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        if self.context.field.is_none() {
            self.context.field = Some(field.into());
        }
        self
    }

    /// Set the operator.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the relation path.
    pub fn with_relation_path(mut self, path: impl Into<String>) -> Self {
        self.context.relation_path = Some(path.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(mut self, text: impl Into<String>, code: impl Into<String>) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an invalid relation path error.
    pub fn invalid_relation_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::InvalidRelationPath,
            format!("Cannot resolve relation path '{}': {}", path, reason.into()),
        )
        .with_relation_path(&path)
        .with_suggestion("Relation paths are dot-separated relation names ending in an attribute")
        .with_code_suggestion("Declare a joined attribute", "status => Equal @ \"account.status\"")
    }

    /// Create an invalid filter value error.
    pub fn invalid_value(operation: impl Into<String>, expected: &str, found: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(
            ErrorCode::InvalidFilterValue,
            format!(
                "Operator {} expects {}, found {}",
                operation,
                expected,
                found.into()
            ),
        )
        .with_operation(&operation)
        .with_help("The field type does not fit its declared operator")
    }

    /// Create a not-a-collection error.
    pub fn not_a_collection(attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        Self::new(
            ErrorCode::NotACollection,
            format!("Attribute '{}' is not a collection", attribute),
        )
        .with_suggestion("Size operators only apply to collection-valued attributes")
    }

    /// Create a field access error.
    pub fn field_access(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::FieldAccess,
            format!("Failed to read field '{}': {}", field, message.into()),
        )
        .with_field(&field)
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
            .with_help("This is likely a bug in sieve - please report it")
    }

    // ============== Error Checks ==============

    /// Check if this error comes from a declaration that does not fit the entity model.
    ///
    /// The orchestration boundary surfaces these as internal errors, not bad input.
    pub fn is_configuration_error(&self) -> bool {
        self.code.is_configuration()
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref filter) = self.context.filter {
            output.push_str(&format!("  → Filter: {}\n", filter));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → Operator: {}\n", op));
        }
        if let Some(ref path) = self.context.relation_path {
            output.push_str(&format!("  → Relation: {}\n", path));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!(
                        "     ```\n     {}\n     ```\n",
                        code.replace('\n', "\n     ")
                    ));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! query_error {
    ($code:expr, $msg:expr) => {
        $crate::error::QueryError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::QueryError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}
