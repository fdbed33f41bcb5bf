use std::ops::Range;

use crate::parser::error::ParseError;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    /// A quoted string, already split into text and `${...}` pieces.
    Str(Vec<StrPiece>),

    Eq,
    Minus,
    Comma,
    Dot,

    // Grouping
    LBrace,
    RBrace,
    LParen,
    RParen,

    Newline,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StrPiece {
    Text(String),
    /// Raw source of an interpolation and its byte offset in the file.
    Interpolation { source: String, offset: usize },
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl TokenKind {
    /// Short human-readable name for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Number(_) => "number".to_string(),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer: source text → Token stream
// ---------------------------------------------------------------------------

/// Tokenize `text`, whose first byte sits at `base_offset` in the file.
/// The returned stream always ends with an `Eof` token.
pub(crate) fn tokenize(
    text: &str,
    base_offset: usize,
    file_id: usize,
) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    // Map character indices to byte offsets within the text
    let byte_pos: Vec<usize> = {
        let mut bp = Vec::with_capacity(len + 1);
        let mut offset = 0;
        for c in &chars {
            bp.push(offset);
            offset += c.len_utf8();
        }
        bp.push(offset);
        bp
    };
    let span = |start: usize, end: usize| base_offset + byte_pos[start]..base_offset + byte_pos[end];

    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < len {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' => {
                i += 1;
            }

            '\n' => {
                // Consecutive blank lines collapse into one token
                if !matches!(tokens.last(), Some(Token { kind: TokenKind::Newline, .. })) {
                    tokens.push(Token {
                        kind: TokenKind::Newline,
                        span: span(i, i + 1),
                    });
                }
                i += 1;
            }

            // Line comments
            '#' => {
                while i < len && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if i + 1 < len && chars[i + 1] == '/' => {
                while i < len && chars[i] != '\n' {
                    i += 1;
                }
            }

            // Block comment
            '/' if i + 1 < len && chars[i + 1] == '*' => {
                let start = i;
                i += 2;
                loop {
                    if i + 1 >= len {
                        return Err(ParseError::error(
                            "unterminated block comment",
                            span(start, len),
                            file_id,
                        ));
                    }
                    if chars[i] == '*' && chars[i + 1] == '/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }

            '"' => {
                let start = i;
                let pieces = lex_string(&chars, &mut i, &span, base_offset, &byte_pos, file_id)?;
                tokens.push(Token {
                    kind: TokenKind::Str(pieces),
                    span: span(start, i),
                });
            }

            '0'..='9' => {
                let start = i;
                while i < len && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i + 1 < len && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                    i += 1;
                    while i < len && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                if i < len && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < len && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < len && chars[j].is_ascii_digit() {
                        i = j;
                        while i < len && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let num_str: String = chars[start..i].iter().collect();
                let n = num_str.parse::<f64>().map_err(|_| {
                    ParseError::error(
                        format!("invalid number literal `{}`", num_str),
                        span(start, i),
                        file_id,
                    )
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(n),
                    span: span(start, i),
                });
            }

            // Identifiers (HCL allows dashes after the first character)
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < len && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token {
                    kind: TokenKind::Ident(ident),
                    span: span(start, i),
                });
            }

            _ => {
                let kind = match c {
                    '=' => TokenKind::Eq,
                    '-' => TokenKind::Minus,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    other => {
                        return Err(ParseError::error(
                            format!("unexpected character `{}`", other),
                            span(i, i + 1),
                            file_id,
                        ));
                    }
                };
                tokens.push(Token {
                    kind,
                    span: span(i, i + 1),
                });
                i += 1;
            }
        }
    }

    let end = base_offset + byte_pos[len];
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: end..end,
    });
    Ok(tokens)
}

/// Lex a quoted string starting at the opening quote. Advances `i` past the
/// closing quote.
fn lex_string(
    chars: &[char],
    i: &mut usize,
    span: &dyn Fn(usize, usize) -> Range<usize>,
    base_offset: usize,
    byte_pos: &[usize],
    file_id: usize,
) -> Result<Vec<StrPiece>, ParseError> {
    let len = chars.len();
    let start = *i;
    *i += 1; // opening quote

    let mut pieces = Vec::new();
    let mut text = String::new();

    loop {
        if *i >= len || chars[*i] == '\n' {
            return Err(ParseError::error("unterminated string", span(start, *i), file_id)
                .with_note("strings must be closed on the line they start"));
        }
        match chars[*i] {
            '"' => {
                *i += 1;
                break;
            }
            '\\' => {
                let escaped = chars.get(*i + 1).copied();
                let ch = match escaped {
                    Some('"') => '"',
                    Some('\\') => '\\',
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    _ => {
                        return Err(ParseError::error(
                            "invalid escape sequence",
                            span(*i, (*i + 2).min(len)),
                            file_id,
                        ));
                    }
                };
                text.push(ch);
                *i += 2;
            }
            '$' if chars.get(*i + 1) == Some(&'$') && chars.get(*i + 2) == Some(&'{') => {
                text.push_str("${");
                *i += 3;
            }
            '$' if chars.get(*i + 1) == Some(&'{') => {
                let interp_start = *i;
                *i += 2;
                let body_start = *i;
                let body_end = find_interpolation_end(chars, i).ok_or_else(|| {
                    ParseError::error("unclosed `${` in string", span(interp_start, *i), file_id)
                })?;
                if !text.is_empty() {
                    pieces.push(StrPiece::Text(std::mem::take(&mut text)));
                }
                pieces.push(StrPiece::Interpolation {
                    source: chars[body_start..body_end].iter().collect(),
                    offset: base_offset + byte_pos[body_start],
                });
            }
            c => {
                text.push(c);
                *i += 1;
            }
        }
    }

    if !text.is_empty() || pieces.is_empty() {
        pieces.push(StrPiece::Text(text));
    }
    Ok(pieces)
}

/// Scan to the `}` closing an interpolation, skipping nested braces and
/// quoted strings. Returns the index of the closing brace and leaves `i`
/// just past it.
fn find_interpolation_end(chars: &[char], i: &mut usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;

    while *i < chars.len() {
        let c = chars[*i];
        if c == '\n' {
            return None;
        }
        if in_string {
            match c {
                '\\' => *i += 1,
                '"' => in_string = false,
                _ => {}
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' if depth == 0 => {
                    let end = *i;
                    *i += 1;
                    return Some(end);
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        *i += 1;
    }
    // A trailing `\` steps past the end
    *i = (*i).min(chars.len());
    None
}
