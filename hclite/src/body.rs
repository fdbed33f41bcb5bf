use std::ops::Range;

use crate::expression::Expression;

/// The contents of a file or of a block between its braces.
#[derive(Debug, Clone)]
pub struct Body {
    /// Attributes in source order. Names are unique within one body.
    pub attributes: Vec<Attribute>,
    /// Nested blocks in source order.
    pub blocks: Vec<Block>,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

impl Body {
    pub fn empty(span: Range<usize>) -> Self {
        Body {
            attributes: Vec::new(),
            blocks: Vec::new(),
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.blocks.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// All nested blocks of the given type, in source order.
    pub fn blocks_of_type<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |b| b.block_type == block_type)
    }
}

/// `name = expression`
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub expression: Expression,
    pub name_span: Range<usize>,
    pub span: Range<usize>,
}

/// A block label: `pet "Ink" { ... }` has the single label `Ink`.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub value: String,
    pub span: Range<usize>,
}

/// `type "label" ... { body }`
#[derive(Debug, Clone)]
pub struct Block {
    pub block_type: String,
    pub labels: Vec<Label>,
    pub body: Body,
    /// Span of the block type identifier.
    pub type_span: Range<usize>,
    /// Span of the whole block, closing brace included.
    pub span: Range<usize>,
}
