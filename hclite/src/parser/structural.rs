use std::collections::HashMap;
use std::ops::Range;

use crate::body::{Attribute, Block, Body, Label};
use crate::parser::error::ParseError;
use crate::parser::lexer::{StrPiece, Token, TokenKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a whole file's token stream into its top-level body.
pub(crate) fn parse_document_body(
    tokens: Vec<Token>,
    file_id: usize,
) -> Result<Body, Vec<ParseError>> {
    let mut state = ParseState::new(tokens, file_id);
    let body = state.parse_body(None);
    if state.errors.is_empty() {
        Ok(body)
    } else {
        Err(state.errors)
    }
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

/// Deepest allowed nesting of blocks and expressions combined.
pub(crate) const MAX_NESTING: usize = 64;

pub(crate) struct ParseState {
    tokens: Vec<Token>,
    pos: usize,
    pub(crate) file_id: usize,
    errors: Vec<ParseError>,
    /// Blocks and expressions currently open.
    pub(crate) depth: usize,
}

enum Item {
    Attribute(Attribute),
    Block(Block),
}

impl ParseState {
    pub(crate) fn new(tokens: Vec<Token>, file_id: usize) -> Self {
        ParseState {
            tokens,
            pos: 0,
            file_id,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Open one nesting level, failing at `span` past `MAX_NESTING`.
    /// Pair every successful call with `leave`.
    pub(crate) fn enter(&mut self, span: Range<usize>) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self
                .error("nested too deeply", span)
                .with_note(format!("at most {} levels of blocks and expressions", MAX_NESTING)));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    /// The stream always ends with Eof, and we never advance past it.
    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.at(&TokenKind::Newline) {
            self.advance();
        }
    }

    pub(crate) fn error(&self, msg: impl Into<String>, span: Range<usize>) -> ParseError {
        ParseError::error(msg, span, self.file_id)
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token, ParseError> {
        if self.at(&kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(self.error(
                format!(
                    "expected {} {}, found {}",
                    kind.describe(),
                    context,
                    found.kind.describe()
                ),
                found.span.clone(),
            ))
        }
    }

    /// Skip to the start of the next line at the current nesting depth, or
    /// to the `}` closing the current body.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Newline if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace => depth -= 1,
                TokenKind::LBrace => depth += 1,
                _ => {}
            }
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    /// Parse attributes and blocks until Eof (top level) or the closing
    /// brace of the block opened at `open` (not consumed).
    fn parse_body(&mut self, open: Option<&Range<usize>>) -> Body {
        let start = self.peek().span.start;
        let mut body = Body::empty(start..start);
        let mut seen: HashMap<String, Range<usize>> = HashMap::new();

        loop {
            self.skip_newlines();
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => {
                    if let Some(open) = open {
                        let err = self
                            .error("unclosed block, expected `}`", token.span.clone())
                            .with_related(open.clone(), "block opened here");
                        self.errors.push(err);
                    }
                    break;
                }
                TokenKind::RBrace if open.is_some() => break,
                TokenKind::RBrace => {
                    let err = self.error("unexpected `}`", token.span.clone());
                    self.errors.push(err);
                    self.advance();
                }
                TokenKind::Ident(_) => match self.parse_item() {
                    Ok(Item::Attribute(attribute)) => {
                        if let Some(first) = seen.get(&attribute.name) {
                            let err = self
                                .error(
                                    format!("attribute `{}` redefined", attribute.name),
                                    attribute.name_span.clone(),
                                )
                                .with_related(first.clone(), "first defined here")
                                .with_note("each attribute may only be set once per block");
                            self.errors.push(err);
                        } else {
                            seen.insert(attribute.name.clone(), attribute.name_span.clone());
                            body.attributes.push(attribute);
                        }
                    }
                    Ok(Item::Block(block)) => body.blocks.push(block),
                    Err(e) => {
                        self.errors.push(e);
                        self.synchronize();
                    }
                },
                other => {
                    let err = self.error(
                        format!("expected an attribute or block, found {}", other.describe()),
                        token.span.clone(),
                    );
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        body.span.end = self.peek().span.start;
        body
    }

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        let name_token = self.advance();
        let name = match &name_token.kind {
            TokenKind::Ident(name) => name.clone(),
            _ => return Err(self.error("expected identifier", name_token.span)),
        };

        match self.peek().kind {
            TokenKind::Eq => {
                self.advance();
                let expression = self.parse_expression()?;
                let span = name_token.span.start..expression.span().end;
                self.end_of_item("attribute value")?;
                Ok(Item::Attribute(Attribute {
                    name,
                    expression,
                    name_span: name_token.span,
                    span,
                }))
            }
            TokenKind::Str(_) | TokenKind::Ident(_) | TokenKind::LBrace => {
                let labels = self.parse_labels()?;
                let open = self.expect(TokenKind::LBrace, "to open block body")?;
                self.enter(open.span.clone())?;
                let body = self.parse_body(Some(&open.span));
                self.leave();
                let close = self.expect(TokenKind::RBrace, "to close block body")?;
                self.end_of_item("block")?;
                Ok(Item::Block(Block {
                    block_type: name,
                    labels,
                    body,
                    type_span: name_token.span.clone(),
                    span: name_token.span.start..close.span.end,
                }))
            }
            ref other => Err(self.error(
                format!("expected `=` or a block after `{}`, found {}", name, other.describe()),
                self.peek().span.clone(),
            )),
        }
    }

    fn parse_labels(&mut self) -> Result<Vec<Label>, ParseError> {
        let mut labels = Vec::new();
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Ident(value) => {
                    self.advance();
                    labels.push(Label {
                        value,
                        span: token.span,
                    });
                }
                TokenKind::Str(pieces) => {
                    self.advance();
                    let mut value = String::new();
                    for piece in pieces {
                        match piece {
                            StrPiece::Text(text) => value.push_str(&text),
                            StrPiece::Interpolation { .. } => {
                                return Err(self
                                    .error("block labels cannot contain interpolations", token.span)
                                    .with_note("use a plain quoted string"));
                            }
                        }
                    }
                    labels.push(Label {
                        value,
                        span: token.span,
                    });
                }
                _ => return Ok(labels),
            }
        }
    }

    /// An attribute or block ends at a newline, at the end of the file, or
    /// right before the `}` of a one-line block.
    fn end_of_item(&mut self, what: &str) -> Result<(), ParseError> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::RBrace => Ok(()),
            ref other => Err(self.error(
                format!("unexpected {} after {}", other.describe(), what),
                self.peek().span.clone(),
            )),
        }
    }
}
