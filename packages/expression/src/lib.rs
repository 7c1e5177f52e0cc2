//! # Formcraft Expression
//!
//! Scanner and minimal parser for form condition expressions
//! (`"{question2} = 1"`, `"{age} >= 18 and {consent} notempty"`).
//!
//! The editor core treats the expression language as a black box: it never
//! evaluates or rewrites expressions, it only needs to know which question
//! names an expression references so that deletions can repair dangling
//! references. `referenced_names` is that entry point; `parse` is available
//! for callers that want the full tree.

pub mod ast;
pub mod error;
pub mod parser;
pub mod tokenizer;

pub use ast::{Ast, BinaryOp, UnaryOp};
pub use error::{ParseError, ParseResult};
pub use parser::parse;
pub use tokenizer::{tokenize, Token};

/// The question/variable names an expression references, in order of first
/// appearance, deduplicated.
///
/// Tolerant by design: unlexable stretches of input are skipped rather than
/// reported, because deletion-repair must cope with half-typed expressions.
pub fn referenced_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in tokenize(text) {
        if let Token::Variable(name) = token {
            if !names.iter().any(|n| n.as_str() == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}
