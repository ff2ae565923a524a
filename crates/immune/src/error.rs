use thiserror::Error;

// ─── Violation ────────────────────────────────────────────────────────────────

/// One field that failed validation during record or union construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Field name for records, position (`"0"`, `"1"`, …) for union cases.
    pub field:    String,
    /// Rendered descriptor the field was declared with.
    pub expected: String,
    /// Rendered value that was supplied.
    pub actual:   String,
}

impl Violation {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self { field: field.into(), expected: expected.into(), actual: actual.into() }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field: {} - expected value of type {} but got: {}", self.field, self.expected, self.actual)
    }
}

// ─── Error ────────────────────────────────────────────────────────────────────

/// Every synchronous failure the runtime can report.
///
/// Task failures are not represented here: they are plain `Value`s delivered
/// to the failure callback of whoever forks the task.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid values passed into the {constructor} constructor:\n{}", list_violations(.violations))]
    Construction {
        constructor: String,
        violations:  Vec<Violation>,
    },

    #[error("no implementation of required function '{method}({})' of protocol '{protocol}' found for type '{type_name}'", .params.join(", "))]
    MissingImplementation {
        protocol:  String,
        method:    String,
        params:    Vec<String>,
        type_name: String,
    },

    #[error("non-exhaustive pattern matching on {type_name}, missing: {}. Provide all cases or use a wildcard", .missing.join(", "))]
    NonExhaustiveMatch {
        type_name: String,
        missing:   Vec<String>,
    },

    #[error("'{operation}' expects {expected} but was called with {got}")]
    TypeMismatch {
        operation: String,
        expected:  String,
        got:       String,
    },

    #[error("couldn't find a matching handler for argument(s): {args}")]
    NoMatchingHandler { args: String },

    #[error("{type_name} has no case named '{case}'")]
    UnknownCase { type_name: String, case: String },

    #[error("`{function}`: {message}")]
    InvalidArgument { function: String, message: String },
}

impl Error {
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument { function: function.into(), message: message.into() }
    }

    pub fn type_mismatch(operation: impl Into<String>, expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::TypeMismatch { operation: operation.into(), expected: expected.into(), got: got.into() }
    }
}

fn list_violations(violations: &[Violation]) -> String {
    violations.iter()
        .map(|v| format!("  * {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
