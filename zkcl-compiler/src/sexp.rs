//! S-expression reader.
//!
//! Builds the tree of symbols and lists the form parser consumes.
//! Every node keeps the span of its first token so later phases can
//! report errors against the source.

use crate::error::{Span, SyntaxError};
use crate::lexer::{Lexer, Token};

/// An S-expression node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExp {
    /// A bare symbol
    Symbol(String, Span),
    /// A parenthesised list
    List(Vec<SExp>, Span),
}

impl SExp {
    /// The source position of this node
    pub fn span(&self) -> Span {
        match self {
            SExp::Symbol(_, span) | SExp::List(_, span) => *span,
        }
    }

    /// The symbol text, if this node is a symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            SExp::Symbol(s, _) => Some(s),
            SExp::List(..) => None,
        }
    }

    /// The elements, if this node is a list
    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::Symbol(..) => None,
            SExp::List(elements, _) => Some(elements),
        }
    }
}

/// Parse a whole source file into its top-level forms
pub fn parse_all(source: &str) -> Result<Vec<SExp>, Vec<SyntaxError>> {
    let tokens = Lexer::new(source).tokenize();
    let mut forms = Vec::new();
    let mut errors = Vec::new();
    let mut pos = 0;

    while pos < tokens.len() {
        match parse_node(&tokens, pos) {
            Ok((node, next)) => {
                forms.push(node);
                pos = next;
            }
            Err(err) => {
                errors.push(err);
                break;
            }
        }
    }

    if errors.is_empty() {
        Ok(forms)
    } else {
        Err(errors)
    }
}

fn parse_node(tokens: &[(Token, Span)], pos: usize) -> Result<(SExp, usize), SyntaxError> {
    match &tokens[pos] {
        (Token::Symbol(s), span) => Ok((SExp::Symbol(s.clone(), *span), pos + 1)),
        (Token::RParen, span) => Err(SyntaxError::new(*span, "unexpected ')'")),
        (Token::LParen, span) => {
            let mut elements = Vec::new();
            let mut cursor = pos + 1;
            loop {
                match tokens.get(cursor) {
                    None => {
                        return Err(SyntaxError::new(*span, "unterminated list"));
                    }
                    Some((Token::RParen, _)) => {
                        return Ok((SExp::List(elements, *span), cursor + 1));
                    }
                    Some(_) => {
                        let (node, next) = parse_node(tokens, cursor)?;
                        elements.push(node);
                        cursor = next;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_lists() {
        let forms = parse_all("(a (b c) d)").unwrap();
        assert_eq!(forms.len(), 1);
        let elements = forms[0].as_list().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].as_symbol(), Some("a"));
        assert_eq!(elements[1].as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_multiple_forms() {
        let forms = parse_all("(a) (b)").unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn test_unterminated_list() {
        let errors = parse_all("(a (b)").unwrap_err();
        assert!(errors[0].message.contains("unterminated"));
        assert_eq!(errors[0].span.column, 1);
    }

    #[test]
    fn test_stray_close_paren() {
        let errors = parse_all(") (a)").unwrap_err();
        assert!(errors[0].message.contains("unexpected"));
    }

    #[test]
    fn test_spans_attach_to_nodes() {
        let forms = parse_all("(a\n (b))").unwrap();
        let elements = forms[0].as_list().unwrap();
        assert_eq!(elements[1].span().line, 2);
    }
}
