//! # Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens, operators and tree nodes shared by the
//! lexer, the parser, the evaluator and the compiler.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Unary and binary operators with precedence and associativity
//! - **[nodes]** - The closed [`Node`] tree produced by the parser
//!
//! ## Quick Start
//!
//! ```text
//! user.age >= 18 and user.country in ["FR", "BE"]
//! ```
//!
//! parses into a binary `and` node whose children are a comparison and a
//! membership test over property reads.
//!
//! ## Core Concepts
//!
//! ### Operator Precedence
//!
//! From loosest to tightest binding:
//!
//! ```text
//! or ||                      10
//! xor                        12
//! and &&                     15
//! |                          16
//! ^                          17
//! &                          18
//! == === != !== < > >= <=
//! not in in matches
//! contains starts with
//! ends with                  20
//! .. << >>                   25
//! + -                        30
//! ~                          40
//! * / %                      60
//! **                         200 (right associative)
//! ```
//!
//! Unary `not`/`!` bind at 50, unary `-`/`+` at 500.
//!
//! ### Conditionals and Null Handling
//!
//! ```text
//! a ? b : c       // ternary
//! a ?: b          // a if truthy, else b
//! a ? b           // b if a is truthy, else null
//! a ?? b          // a unless it is null or missing
//! a?.b            // null when a is null, skipping the rest of the chain
//! ```
//!
//! ### Member Access
//!
//! ```text
//! user.name            // property
//! user.getName()       // method call
//! items[0]             // array index
//! foo.not              // operator words are valid member names after `.`
//! ```
pub mod nodes;
pub mod operators;
pub mod tokens;

pub use nodes::{AccessKind, ArrayElement, Node};
pub use operators::{Associativity, BinaryOperator, UnaryOperator};
pub use tokens::{Token, TokenKind, TokenValue};
