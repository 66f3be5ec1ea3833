//! Recursive-descent reader from tokens to located [`Node`]s

use super::lexer::Token;
use super::ParseError;
use crate::tree::{Child, Node, Range, SourceLocation};
use logos::Logos;
use std::ops::Range as ByteRange;

pub struct Reader<'a> {
    tokens: Vec<(Token, ByteRange<usize>)>,
    pos: usize,
    locations: SourceLocation,
    source: &'a str,
    file_path: &'a str,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str, file_path: &'a str) -> Result<Self, ParseError> {
        let locations = SourceLocation::new(source);
        let mut tokens = Vec::new();
        for (token, span) in Token::lexer(source).spanned() {
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    return Err(ParseError::new(
                        file_path,
                        Some(locations.byte_to_position(span.start)),
                        format!("unexpected character `{}`", &source[span]),
                    ))
                }
            }
        }
        Ok(Self {
            tokens,
            pos: 0,
            locations,
            source,
            file_path,
        })
    }

    /// Reads every top-level form. Several forms are wrapped in a `begin` spanning them.
    pub fn read_document(mut self) -> Result<Node, ParseError> {
        let mut forms = Vec::new();
        while self.pos < self.tokens.len() {
            forms.push(self.read_node()?);
        }
        if forms.len() == 1 {
            return Ok(forms.remove(0));
        }
        let location = match (forms.first(), forms.last()) {
            (Some(first), Some(last)) => first
                .location()
                .zip(last.location())
                .map(|(first, last)| first.cover(last)),
            _ => None,
        };
        let children = forms.into_iter().map(Child::Node).collect();
        Ok(Node::new("begin", children).at(location))
    }

    fn read_node(&mut self) -> Result<Node, ParseError> {
        let start = match self.advance() {
            Some((Token::OpenParen, span)) => span.start,
            Some((token, span)) => {
                let message = format!("expected '(' but found {}", token.describe());
                return Err(self.error_at(span.start, message));
            }
            None => return Err(self.error_at(self.source.len(), "expected '('".to_string())),
        };
        let tag = match self.advance() {
            Some((Token::Ident(tag), _)) => tag,
            Some((Token::Nil, _)) => "nil".to_string(),
            Some((token, span)) => {
                let message = format!("expected node tag but found {}", token.describe());
                return Err(self.error_at(span.start, message));
            }
            None => return Err(self.error_at(start, "unclosed node".to_string())),
        };

        let mut children = Vec::new();
        loop {
            let Some((token, span)) = self.peek() else {
                return Err(self.error_at(start, format!("unclosed node `{}`", tag)));
            };
            let child = match token {
                Token::CloseParen => {
                    let end = span.end;
                    self.pos += 1;
                    let location = self.range(start..end);
                    return Ok(Node::new(tag, children).at(Some(location)));
                }
                Token::OpenParen => Child::Node(self.read_node()?),
                Token::Nil => self.take(Child::Nil),
                Token::Symbol(name) => {
                    let name = name.clone();
                    self.take(Child::Symbol(name))
                }
                Token::Str(value) => {
                    let value = value.clone();
                    self.take(Child::Str(value))
                }
                Token::Int(value) => {
                    let value = *value;
                    self.take(Child::Int(value))
                }
                Token::Float(value) => {
                    let value = *value;
                    self.take(Child::Float(value))
                }
                Token::Ident(name) => {
                    let message = format!(
                        "bare identifier `{}` is not a value; nodes are written `({} ...)`",
                        name, name
                    );
                    return Err(self.error_at(span.start, message));
                }
            };
            children.push(child);
        }
    }

    fn peek(&self) -> Option<&(Token, ByteRange<usize>)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<(Token, ByteRange<usize>)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn take(&mut self, child: Child) -> Child {
        self.pos += 1;
        child
    }

    fn range(&self, span: ByteRange<usize>) -> Range {
        self.locations.byte_range_to_range(&span)
    }

    fn error_at(&self, offset: usize, message: String) -> ParseError {
        let offset = offset.min(self.source.len());
        ParseError::new(
            self.file_path,
            Some(self.locations.byte_to_position(offset)),
            message,
        )
    }
}
