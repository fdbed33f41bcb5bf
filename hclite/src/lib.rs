pub mod body;
pub mod expression;
pub mod parser;

use crate::body::Body;

/// A parsed configuration file.
#[derive(Debug, Clone)]
pub struct Document {
    /// The top-level body: attributes and blocks in source order.
    pub body: Body,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
