//! Lexer for the constraint source language.
//!
//! The surface syntax is S-expressions, so the token set is tiny:
//! parentheses and symbols. Anything from `;` to the end of the line
//! is a comment.

use crate::error::Span;
use std::fmt;

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Opening parenthesis
    LParen,
    /// Closing parenthesis
    RParen,
    /// A bare symbol: identifier, keyword, operator or literal
    Symbol(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// Character-level lexer with line and column tracking
#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    /// Create a lexer over the given source text
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the whole input
    pub fn tokenize(mut self) -> Vec<(Token, Span)> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let span = Span::new(self.line, self.col);
            match self.current() {
                None => break,
                Some('(') => {
                    self.advance();
                    tokens.push((Token::LParen, span));
                }
                Some(')') => {
                    self.advance();
                    tokens.push((Token::RParen, span));
                }
                Some(_) => {
                    let symbol = self.read_symbol();
                    tokens.push((Token::Symbol(symbol), span));
                }
            }
        }
        tokens
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == ';' {
                // Comment until end of line
                while let Some(ch) = self.current() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_symbol(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == ';' {
                break;
            }
            result.push(ch);
            self.advance();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(source: &str) -> Vec<String> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .map(|(t, _)| t.to_string())
            .collect()
    }

    #[test]
    fn test_tokenize_form() {
        assert_eq!(
            symbols("(defcolumns X Y)"),
            vec!["(", "defcolumns", "X", "Y", ")"]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = ";; leading comment\n(vanish c X) ; trailing\n";
        assert_eq!(symbols(source), vec!["(", "vanish", "c", "X", ")"]);
    }

    #[test]
    fn test_operators_are_symbols() {
        assert_eq!(
            symbols("(- X (~ Y))"),
            vec!["(", "-", "X", "(", "~", "Y", ")", ")"]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Lexer::new("(a\n  b)").tokenize();
        let spans: Vec<(usize, usize)> =
            tokens.iter().map(|(_, s)| (s.line, s.column)).collect();
        assert_eq!(spans, vec![(1, 1), (1, 2), (2, 3), (2, 4)]);
    }

    #[test]
    fn test_attribute_tokens() {
        assert_eq!(
            symbols("(X :u16@prove :multiplier 2)"),
            vec!["(", "X", ":u16@prove", ":multiplier", "2", ")"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(Lexer::new("  ;; nothing here\n").tokenize().is_empty());
    }
}
