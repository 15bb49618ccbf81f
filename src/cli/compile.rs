//! Compile and lint expressions

use super::CliError;
use crate::{ExpressionLanguage, Name, ParseFlags};

/// Options shared by the compile and lint commands
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// The expression to compile or lint
    pub expression: String,
    /// Permitted variable names, `name` or `alias=name`
    pub names: Vec<String>,
}

impl CompileOptions {
    fn names(&self) -> Vec<Name> {
        self.names.iter().map(|n| parse_name(n)).collect()
    }
}

/// `alias=variable` gives an aliased name, anything else a plain one
fn parse_name(arg: &str) -> Name {
    match arg.split_once('=') {
        Some((alias, variable)) => Name::aliased(alias, variable),
        None => Name::new(arg),
    }
}

/// Execute a compile operation, returning the compiled source
pub fn execute_compile(language: &ExpressionLanguage, options: &CompileOptions) -> Result<String, CliError> {
    Ok(language.compile(options.expression.as_str(), options.names())?)
}

/// Execute a lint operation
///
/// Without names any variable is accepted.
pub fn execute_lint(language: &ExpressionLanguage, options: &CompileOptions) -> Result<(), CliError> {
    if options.names.is_empty() {
        language.lint_syntax(options.expression.as_str())?;
    } else {
        language.lint_with(
            options.expression.as_str(),
            Some(options.names().as_slice()),
            ParseFlags::default(),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name() {
        assert_eq!(parse_name("a"), Name::new("a"));
        assert_eq!(parse_name("B=b"), Name::aliased("B", "b"));
        assert_eq!(parse_name("x=y=z"), Name::aliased("x", "y=z"));
    }
}
