pub mod error;
mod expression;
mod lexer;
mod structural;

pub use error::ParseError;

use crate::Document;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source text into a Document. All recoverable errors are
    /// collected; the document is only returned if there were none.
    pub fn parse(&self) -> Result<Document, Vec<ParseError>> {
        let tokens = lexer::tokenize(&self.source, 0, self.file_id).map_err(|e| vec![e])?;
        let body = structural::parse_document_body(tokens, self.file_id)?;
        Ok(Document {
            body,
            source_id: self.file_id,
        })
    }
}
