//! CLI support for the expression language
//!
//! Provides programmatic access to the `expr` commands for embedding in
//! other tools.

mod compile;
mod evaluate;

pub use compile::{CompileOptions, execute_compile, execute_lint};
pub use evaluate::{EvaluateOptions, execute_evaluate};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Syntax error in the expression
    #[error("Syntax error: {0}")]
    Syntax(#[from] crate::SyntaxError),

    /// Evaluation error
    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Bindings were valid JSON but not an object
    #[error("Input must be a JSON object mapping variable names to values.")]
    NotAnObject,
}

impl From<crate::Error> for CliError {
    fn from(e: crate::Error) -> Self {
        match e {
            crate::Error::Syntax(e) => CliError::Syntax(e),
            crate::Error::Eval(e) => CliError::Eval(e),
        }
    }
}
