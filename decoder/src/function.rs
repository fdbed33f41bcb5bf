use crate::error::EvalError;
use crate::random::RandomSource;
use crate::schema::{FieldType, FieldValue};
use crate::value::Value;

/// Error reported by a function implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FunctionError {
    /// The arguments are well-typed but their number doesn't fit the request.
    #[error("{0}")]
    Arity(String),
    #[error("{0}")]
    Domain(String),
}

/// Implementation of a function. Arguments have already been checked against
/// the arity rule and converted to the declared parameter types.
pub type FunctionImpl = fn(&[FieldValue], &dyn RandomSource) -> Result<FieldValue, FunctionError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub ty: FieldType,
}

/// A callable visible to expressions.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    /// Positional parameters, all required.
    pub params: Vec<Parameter>,
    /// Type of trailing variadic arguments, if the function takes any.
    pub variadic: Option<Parameter>,
    /// Minimum number of variadic arguments.
    pub min_variadic: usize,
    pub return_type: FieldType,
    pub implementation: FunctionImpl,
}

impl FunctionSpec {
    /// Check arity, convert arguments, run the implementation and check the
    /// result type.
    pub fn call(
        &self,
        name: &str,
        args: &[Value],
        random: &dyn RandomSource,
    ) -> Result<Value, EvalError> {
        self.check_arity(name, args.len())?;

        let mut converted = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let param = self
                .params
                .get(index)
                .or(self.variadic.as_ref())
                .ok_or_else(|| arity(name, format!("unexpected argument {}", index + 1)))?;
            let type_error = || EvalError::ArgumentType {
                function: name.to_string(),
                position: index + 1,
                expected: param.ty.name(),
                got: arg.type_name(),
            };
            match arg.convert(param.ty) {
                Ok(Some(value)) => converted.push(value),
                Ok(None) | Err(_) => return Err(type_error()),
            }
        }

        let result = (self.implementation)(&converted, random).map_err(|e| match e {
            FunctionError::Arity(message) => arity(name, message),
            FunctionError::Domain(message) => EvalError::Function {
                function: name.to_string(),
                message,
            },
        })?;

        if result.field_type() != self.return_type {
            return Err(EvalError::Function {
                function: name.to_string(),
                message: format!(
                    "returned a {} instead of a {}",
                    result.field_type().name(),
                    self.return_type.name()
                ),
            });
        }
        Ok(result.into())
    }

    fn check_arity(&self, name: &str, given: usize) -> Result<(), EvalError> {
        let fixed = self.params.len();
        match &self.variadic {
            None if given != fixed => Err(arity(
                name,
                format!("expected {} argument(s), got {}", fixed, given),
            )),
            Some(_) if given < fixed + self.min_variadic => {
                if fixed == 0 && self.min_variadic == 1 {
                    Err(arity(name, "at least one argument required".to_string()))
                } else {
                    Err(arity(
                        name,
                        format!(
                            "expected at least {} argument(s), got {}",
                            fixed + self.min_variadic,
                            given
                        ),
                    ))
                }
            }
            _ => Ok(()),
        }
    }
}

fn arity(function: &str, message: String) -> EvalError {
    EvalError::Arity {
        function: function.to_string(),
        message,
    }
}
