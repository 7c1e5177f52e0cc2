//! Recursive-descent parser for condition expressions.
//!
//! Precedence, loosest first: `or`, `and`, comparisons, postfix
//! `empty`/`notempty`, primaries.

use std::ops::Range;

use crate::ast::{Ast, BinaryOp, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize_spanned, Token};

pub fn parse(source: &str) -> ParseResult<Ast> {
    let tokens = tokenize_spanned(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        source_len: source.len(),
    };
    let ast = parser.parse_or()?;
    if let Some((token, span)) = parser.peek() {
        return Err(ParseError::unexpected_token(
            span.start,
            "end of expression",
            format!("{}", token),
        ));
    }
    Ok(ast)
}

struct Parser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
    source_len: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<(&Token<'src>, &Range<usize>)> {
        self.tokens.get(self.pos).map(|(t, s)| (t, s))
    }

    fn next(&mut self) -> ParseResult<(Token<'src>, Range<usize>)> {
        let item = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(item)
    }

    fn eat(&mut self, expected: &Token<'src>) -> bool {
        if self.peek().map(|(t, _)| t == expected).unwrap_or(false) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> ParseResult<Ast> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Ast::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Ast> {
        let mut left = self.parse_comparison()?;
        while self.eat(&Token::And) {
            let right = self.parse_comparison()?;
            left = Ast::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParseResult<Ast> {
        let left = self.parse_postfix()?;
        let op = match self.peek() {
            Some((Token::Equal, _)) => BinaryOp::Equal,
            Some((Token::NotEqual, _)) => BinaryOp::NotEqual,
            Some((Token::Less, _)) => BinaryOp::Less,
            Some((Token::LessEqual, _)) => BinaryOp::LessEqual,
            Some((Token::Greater, _)) => BinaryOp::Greater,
            Some((Token::GreaterEqual, _)) => BinaryOp::GreaterEqual,
            Some((Token::Contains, _)) => BinaryOp::Contains,
            Some((Token::AnyOf, _)) => BinaryOp::AnyOf,
            Some((Token::AllOf, _)) => BinaryOp::AllOf,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_postfix()?;
        Ok(Ast::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_postfix(&mut self) -> ParseResult<Ast> {
        let operand = self.parse_primary()?;
        if self.eat(&Token::Empty) {
            return Ok(Ast::Unary {
                op: UnaryOp::Empty,
                operand: Box::new(operand),
            });
        }
        if self.eat(&Token::NotEmpty) {
            return Ok(Ast::Unary {
                op: UnaryOp::NotEmpty,
                operand: Box::new(operand),
            });
        }
        Ok(operand)
    }

    fn parse_primary(&mut self) -> ParseResult<Ast> {
        if self.eat(&Token::Not) {
            let operand = self.parse_primary()?;
            return Ok(Ast::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        let (token, span) = self.next().map_err(|_| ParseError::UnexpectedEnd)?;
        match token {
            Token::Variable(name) => Ok(Ast::Variable(name.to_string())),
            Token::Number(value) => Ok(Ast::Number(value)),
            Token::String(value) | Token::Ident(value) => Ok(Ast::String(value.to_string())),
            Token::True => Ok(Ast::Bool(true)),
            Token::False => Ok(Ast::Bool(false)),
            Token::LParen => {
                let inner = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    let pos = self
                        .peek()
                        .map(|(_, s)| s.start)
                        .unwrap_or(self.source_len);
                    return Err(ParseError::unexpected_token(pos, ")", "something else"));
                }
                Ok(inner)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.parse_or()?);
                        if self.eat(&Token::RBracket) {
                            break;
                        }
                        if !self.eat(&Token::Comma) {
                            let pos = self
                                .peek()
                                .map(|(_, s)| s.start)
                                .unwrap_or(self.source_len);
                            return Err(ParseError::unexpected_token(pos, ", or ]", "something else"));
                        }
                    }
                }
                Ok(Ast::List(items))
            }
            other => Err(ParseError::unexpected_token(
                span.start,
                "a value",
                format!("{}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_comparison() {
        let ast = parse("{question2} = 1").unwrap();
        assert_eq!(
            ast,
            Ast::Binary {
                op: BinaryOp::Equal,
                left: Box::new(Ast::Variable("question2".to_string())),
                right: Box::new(Ast::Number(1.0)),
            }
        );
    }

    #[test]
    fn test_parse_precedence() {
        let ast = parse("{a} = 1 or {b} = 2 and {c} = 3").unwrap();
        // `and` binds tighter than `or`
        match ast {
            Ast::Binary {
                op: BinaryOp::Or, ..
            } => {}
            other => panic!("expected top-level or, got {:?}", other),
        }
        assert_eq!(
            parse("{a} = 1 or {b} = 2 and {c} = 3").unwrap().variables(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_parse_postfix_and_lists() {
        let ast = parse("{q1} notempty and {q2} anyof [1, 2]").unwrap();
        assert_eq!(ast.variables(), vec!["q1", "q2"]);
    }

    #[test]
    fn test_parse_rejects_trailing_tokens() {
        assert!(parse("{q1} = 1 1").is_err());
        assert!(parse("").is_err());
    }
}
