use logos::Logos;
use std::fmt;
use std::ops::Range;

use crate::error::{ParseError, ParseResult};

/// Token types for the condition-expression language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token<'src> {
    // Keywords (case matters in the observed expression dialect)
    #[token("and")]
    #[token("And")]
    And,

    #[token("or")]
    #[token("Or")]
    Or,

    #[token("not")]
    Not,

    #[token("empty")]
    Empty,

    #[token("notempty")]
    NotEmpty,

    #[token("contains")]
    Contains,

    #[token("anyof")]
    AnyOf,

    #[token("allof")]
    AllOf,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // Question references: `{name}`, `{matrix.col}` (member access is cut at
    // the first separator; repair only cares about the owning question)
    #[regex(r"\{[^{}]+\}", |lex| variable_name(lex.slice()))]
    Variable(&'src str),

    // Bare identifiers (function names etc.)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    // String literals, single or double quoted
    #[regex(r#"'[^']*'"#, |lex| trim_quotes(lex.slice()))]
    #[regex(r#""[^"]*""#, |lex| trim_quotes(lex.slice()))]
    String(&'src str),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    // Comparison operators
    #[token("=")]
    #[token("==")]
    Equal,

    #[token("<>")]
    #[token("!=")]
    NotEqual,

    #[token("<=")]
    LessEqual,

    #[token(">=")]
    GreaterEqual,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,
}

fn variable_name(slice: &str) -> &str {
    let inner = slice[1..slice.len() - 1].trim();
    let end = inner
        .find(|c| c == '.' || c == '[')
        .unwrap_or(inner.len());
    &inner[..end]
}

fn trim_quotes(slice: &str) -> &str {
    &slice[1..slice.len() - 1]
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Lenient tokenization: unrecognized input is skipped.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    Token::lexer(source).flatten().collect()
}

/// Strict tokenization with source spans, for the parser.
pub fn tokenize_spanned(source: &str) -> ParseResult<Vec<(Token<'_>, Range<usize>)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(_) => return Err(ParseError::lexer_error(lexer.span().start)),
        }
    }
    Ok(tokens)
}
