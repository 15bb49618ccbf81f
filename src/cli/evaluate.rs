//! Evaluate an expression against JSON bindings

use super::CliError;
use crate::{
    ExpressionLanguage, Values,
    convert::{json_to_values, value_to_json},
};

/// Options for the evaluate command
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON object whose keys become variables
    pub input: Option<String>,
    /// Turn JSON objects into objects (`a.b`) instead of arrays (`a["b"]`)
    pub objects: bool,
}

/// Execute an evaluate operation, returning the result as JSON
pub fn execute_evaluate(
    language: &ExpressionLanguage,
    options: &EvaluateOptions,
) -> Result<serde_json::Value, CliError> {
    let values = match options.input.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => {
            let json_value: serde_json::Value = serde_json::from_str(json)?;
            json_to_values(json_value, options.objects).ok_or(CliError::NotAnObject)?
        }
        _ => Values::new(),
    };

    let result = language.evaluate(options.expression.as_str(), &values)?;
    Ok(value_to_json(result))
}
