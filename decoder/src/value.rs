use std::collections::BTreeMap;
use std::fmt;

use crate::error::EvalError;
use crate::schema::{FieldType, FieldValue};

/// A value produced by evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    /// A namespace of named values, e.g. `env`.
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Object(_) => "object",
        }
    }

    /// Convert to the given field type, the way attribute values are
    /// converted into record fields and function parameters.
    /// `Null` converts to `None`.
    pub fn convert(&self, ty: FieldType) -> Result<Option<FieldValue>, EvalError> {
        let mismatch = || EvalError::TypeMismatch {
            expected: ty.name(),
            got: self.type_name(),
        };
        let converted = match (ty, self) {
            (_, Value::Null) => return Ok(None),
            (FieldType::String, Value::String(s)) => FieldValue::String(s.clone()),
            (FieldType::String, Value::Number(_) | Value::Bool(_)) => {
                FieldValue::String(self.to_string())
            }
            (FieldType::Number, Value::Number(n)) => FieldValue::Number(*n),
            (FieldType::Number, Value::String(s)) => {
                FieldValue::Number(s.trim().parse::<f64>().map_err(|_| mismatch())?)
            }
            (FieldType::Bool, Value::Bool(b)) => FieldValue::Bool(*b),
            (FieldType::Bool, Value::String(s)) => match s.as_str() {
                "true" => FieldValue::Bool(true),
                "false" => FieldValue::Bool(false),
                _ => return Err(mismatch()),
            },
            _ => return Err(mismatch()),
        };
        Ok(Some(converted))
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::String(s) => Value::String(s),
            FieldValue::Number(n) => Value::Number(n),
            FieldValue::Bool(b) => Value::Bool(b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.is_finite() && *n == n.floor() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
            Value::Object(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
