pub mod template;

use std::ops::Range;

use crate::expression::template::TemplateString;

/// An unresolved attribute value. Evaluation happens later, against whatever
/// variables and functions the consumer makes visible.
#[derive(Debug, Clone)]
pub enum Expression {
    // Literals
    StringLiteral(String, Range<usize>),
    NumberLiteral(f64, Range<usize>),
    BooleanLiteral(bool, Range<usize>),
    Null(Range<usize>),

    /// A quoted string containing `${...}` interpolations.
    Template(TemplateString, Range<usize>),

    /// `root.step.step`, e.g. `env.CAT_SOUND`
    Traversal {
        root: String,
        steps: Vec<String>,
        span: Range<usize>,
    },

    /// `name(arg, arg, ...)`
    FunctionCall {
        name: String,
        arguments: Vec<Expression>,
        span: Range<usize>,
    },
}

impl Expression {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Expression::StringLiteral(_, span)
            | Expression::NumberLiteral(_, span)
            | Expression::BooleanLiteral(_, span)
            | Expression::Null(span)
            | Expression::Template(_, span) => span,
            Expression::Traversal { span, .. } => span,
            Expression::FunctionCall { span, .. } => span,
        }
    }
}
