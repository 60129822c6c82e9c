use thiserror::Error;

use crate::value::Category;

/// A test-authoring error: the table itself is malformed, so running it would
/// produce meaningless results. Hosts treat these as fatal.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("the number of in params doesn't match function parameters: got {got}, function takes {expected}")]
    InputArity { expected: usize, got: usize },
    #[error("the number of expect params doesn't match function results: got {got}, function returns {expected}")]
    OutputArity { expected: usize, got: usize },
    #[error("function declared {declared} results but returned {returned}")]
    ResultArity { declared: usize, returned: usize },
    #[error("argument {position}{} cannot be passed to the function: {source}", label(.name))]
    Argument {
        position: usize,
        name: Option<String>,
        #[source]
        source: ConversionError,
    },
    #[error("{which} is not a sequence (found {found})")]
    NotASequence {
        which: &'static str,
        found: Category,
    },
    #[error("number of input tests ({inputs}) doesn't match number of expected results ({expected})")]
    CaseCountMismatch { inputs: usize, expected: usize },
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

fn label(name: &Option<String>) -> String {
    name.as_ref()
        .map(|name| format!(" ({name})"))
        .unwrap_or_default()
}

/// Failure to turn a [`Value`](crate::Value) back into a Rust type.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("expected a {expected} value, found {found}")]
    Category { expected: Category, found: Category },
    #[error("expected {expected}, found {found}")]
    Type {
        expected: &'static str,
        found: String,
    },
    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<ConversionError>,
    },
    #[error("missing field `{0}`")]
    Missing(String),
}
