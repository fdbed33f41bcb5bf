use std::ops::Range;

/// Failure while evaluating a single expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    #[error("`{path}` has no attribute `{attribute}`")]
    UnsupportedAttribute { path: String, attribute: String },

    #[error("call to unknown function `{0}`")]
    UndefinedFunction(String),

    #[error("function `{0}` cannot be called here; functions are only available in characteristics")]
    FunctionsUnavailable(String),

    /// Wrong number or shape of arguments for a function.
    #[error("invalid arguments for `{function}`: {message}")]
    Arity { function: String, message: String },

    #[error("argument {position} of `{function}` must be a {expected}, got {got}")]
    ArgumentType {
        function: String,
        position: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("`{function}` failed: {message}")]
    Function { function: String, message: String },

    #[error("cannot interpolate a {0} value into a string")]
    Interpolation(&'static str),

    #[error("expected a {expected} value, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

/// Failure of a whole decode run. Every variant carries the byte span of the
/// offending source so callers can point at it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// The generic `pet "<label>" { type = ... }` shape is malformed.
    #[error("malformed configuration: {message}")]
    Schema { message: String, span: Range<usize> },

    #[error("pet \"{label}\": unknown type `{discriminator}`")]
    UnknownVariant {
        label: String,
        discriminator: String,
        span: Range<usize>,
    },

    #[error("pet \"{label}\": unsupported {kind} `{name}` for type `{discriminator}`")]
    UnknownField {
        label: String,
        discriminator: String,
        name: String,
        kind: &'static str,
        span: Range<usize>,
    },

    #[error("pet \"{label}\": missing required attribute `{field}` for type `{discriminator}`")]
    MissingField {
        label: String,
        discriminator: String,
        field: String,
        span: Range<usize>,
    },

    #[error("pet \"{label}\": cannot evaluate `{field}`: {error}")]
    Evaluation {
        label: String,
        field: String,
        #[source]
        error: EvalError,
        span: Range<usize>,
    },
}

impl DecodeError {
    pub fn span(&self) -> &Range<usize> {
        match self {
            DecodeError::Schema { span, .. }
            | DecodeError::UnknownVariant { span, .. }
            | DecodeError::UnknownField { span, .. }
            | DecodeError::MissingField { span, .. }
            | DecodeError::Evaluation { span, .. } => span,
        }
    }

    /// True for a function invocation with invalid arguments.
    pub fn is_arity(&self) -> bool {
        matches!(
            self,
            DecodeError::Evaluation {
                error: EvalError::Arity { .. },
                ..
            }
        )
    }
}
