use std::ops::Range;

use crate::expression::Expression;
use crate::expression::template::{TemplatePart, TemplateString};
use crate::parser::error::ParseError;
use crate::parser::lexer::{self, StrPiece, TokenKind};
use crate::parser::structural::ParseState;

impl ParseState {
    /// Parse a single attribute value expression.
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.enter(self.peek().span.clone())?;
        let expression = self.parse_operand();
        self.leave();
        expression
    }

    fn parse_operand(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();

        match token.kind {
            TokenKind::Number(n) => Ok(Expression::NumberLiteral(n, token.span)),

            TokenKind::Minus => {
                let operand = self.advance();
                match operand.kind {
                    TokenKind::Number(n) => Ok(Expression::NumberLiteral(
                        -n,
                        token.span.start..operand.span.end,
                    )),
                    other => Err(self.error(
                        format!("expected a number after `-`, found {}", other.describe()),
                        operand.span,
                    )),
                }
            }

            TokenKind::Str(pieces) => self.build_string(pieces, token.span),

            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(Expression::BooleanLiteral(true, token.span)),
                "false" => Ok(Expression::BooleanLiteral(false, token.span)),
                "null" => Ok(Expression::Null(token.span)),
                _ if self.at(&TokenKind::LParen) => self.parse_call(name, token.span),
                _ => self.parse_traversal(name, token.span),
            },

            // Parenthesized expression
            TokenKind::LParen => {
                self.skip_newlines();
                let inner = self.parse_expression()?;
                self.skip_newlines();
                self.expect(TokenKind::RParen, "to close parenthesized expression")?;
                Ok(inner)
            }

            other => Err(self.error(
                format!("expected an expression, found {}", other.describe()),
                token.span,
            )),
        }
    }

    /// `name(arg, arg, ...)`. Newlines are allowed between arguments and a
    /// trailing comma is accepted.
    fn parse_call(&mut self, name: String, name_span: Range<usize>) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LParen, "to open argument list")?;
        let mut arguments = Vec::new();

        loop {
            self.skip_newlines();
            if self.at(&TokenKind::RParen) {
                break;
            }
            arguments.push(self.parse_expression()?);
            self.skip_newlines();
            if self.at(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            if !self.at(&TokenKind::RParen) {
                let found = self.peek();
                return Err(self.error(
                    format!("expected `,` or `)` in call to `{}`, found {}", name, found.kind.describe()),
                    found.span.clone(),
                ));
            }
        }

        let close = self.expect(TokenKind::RParen, "to close argument list")?;
        Ok(Expression::FunctionCall {
            name,
            arguments,
            span: name_span.start..close.span.end,
        })
    }

    /// `root.step.step`
    fn parse_traversal(&mut self, root: String, root_span: Range<usize>) -> Result<Expression, ParseError> {
        let mut steps = Vec::new();
        let mut end = root_span.end;

        while self.at(&TokenKind::Dot) {
            self.advance();
            let token = self.advance();
            match token.kind {
                TokenKind::Ident(step) => {
                    steps.push(step);
                    end = token.span.end;
                }
                other => {
                    return Err(self.error(
                        format!("expected an attribute name after `.`, found {}", other.describe()),
                        token.span,
                    ));
                }
            }
        }

        Ok(Expression::Traversal {
            root,
            steps,
            span: root_span.start..end,
        })
    }

    /// Turn lexed string pieces into a literal or a template. Interpolation
    /// sources are tokenized and parsed with their original file offsets.
    fn build_string(&mut self, pieces: Vec<StrPiece>, span: Range<usize>) -> Result<Expression, ParseError> {
        if pieces.iter().all(|p| matches!(p, StrPiece::Text(_))) {
            let text: String = pieces
                .into_iter()
                .map(|p| match p {
                    StrPiece::Text(t) => t,
                    StrPiece::Interpolation { source, .. } => source,
                })
                .collect();
            return Ok(Expression::StringLiteral(text, span));
        }

        let mut parts = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match piece {
                StrPiece::Text(text) => parts.push(TemplatePart::Literal(text)),
                StrPiece::Interpolation { source, offset } => {
                    let tokens = lexer::tokenize(&source, offset, self.file_id)?;
                    let mut inner = ParseState::new(tokens, self.file_id);
                    inner.depth = self.depth;
                    inner.skip_newlines();
                    if inner.at(&TokenKind::Eof) {
                        return Err(self.error("empty interpolation", offset..offset + source.len()));
                    }
                    let expr = inner.parse_expression()?;
                    inner.skip_newlines();
                    if !inner.at(&TokenKind::Eof) {
                        let extra = inner.peek();
                        return Err(self.error(
                            format!("unexpected {} in interpolation", extra.kind.describe()),
                            extra.span.clone(),
                        ));
                    }
                    parts.push(TemplatePart::Interpolation(expr));
                }
            }
        }

        Ok(Expression::Template(TemplateString { parts }, span))
    }
}
