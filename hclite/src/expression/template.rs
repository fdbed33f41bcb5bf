use crate::expression::Expression;

/// A string that can contain interpolated expressions: `"${env.NAME} the cat"`.
#[derive(Debug, Clone)]
pub struct TemplateString {
    pub parts: Vec<TemplatePart>,
}

#[derive(Debug, Clone)]
pub enum TemplatePart {
    /// Literal text content.
    Literal(String),
    /// An embedded expression to be evaluated and rendered.
    Interpolation(Expression),
}
