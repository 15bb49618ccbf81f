//! A safe, side-effect-free expression language.
//!
//! Expressions are evaluated against variable bindings, or compiled into
//! equivalent PHP source for embedding in generated code.
//!
//! ```
//! use expression_language::{ExpressionLanguage, Value, Values};
//!
//! let language = ExpressionLanguage::new();
//! let values = Values::from([("price".to_string(), Value::from(120))]);
//!
//! assert_eq!(
//!     language.evaluate("price > 100 ? \"expensive\" : \"cheap\"", &values).unwrap(),
//!     Value::from("expensive")
//! );
//! assert_eq!(
//!     language.compile("price > 100", ["price"]).unwrap(),
//!     "($price > 100)"
//! );
//! ```
pub mod ast;
pub mod cache;
pub mod compiler;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod language;
pub mod lexer;
pub mod parser;
pub mod stream;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{AccessKind, ArrayElement, BinaryOperator, Node, Token, TokenKind, TokenValue, UnaryOperator};
pub use cache::{MemoryCache, ParseCache, cache_key};
pub use compiler::Compiler;
pub use convert::{json_to_value, value_to_json};
pub use error::SyntaxError;
pub use evaluator::{EvalError, Evaluator, evaluate};
pub use functions::{Constants, ExpressionFunction, FunctionProvider, FunctionRegistry};
pub use language::{Builder, Error, Expression, ExpressionLanguage, ParsedExpression, Source};
pub use lexer::{Lexer, tokenize};
pub use parser::{NO_NAMES, Name, ParseFlags, Parser};
pub use stream::TokenStream;
pub use value::{Array, EnumCase, Key, Object, Record, Value, Values};
