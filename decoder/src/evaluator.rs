use hclite::expression::Expression;
use hclite::expression::template::{TemplatePart, TemplateString};

use crate::context::EvaluationContext;
use crate::error::EvalError;
use crate::value::Value;

/// Whether function calls may run during an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calls {
    Allowed,
    /// Variables only. Used for the generic block shape, which must not
    /// consume random draws.
    Denied,
}

/// Evaluate an expression against the context.
pub fn evaluate(
    expression: &Expression,
    context: &EvaluationContext,
    calls: Calls,
) -> Result<Value, EvalError> {
    match expression {
        Expression::StringLiteral(s, _) => Ok(Value::String(s.clone())),
        Expression::NumberLiteral(n, _) => Ok(Value::Number(*n)),
        Expression::BooleanLiteral(b, _) => Ok(Value::Bool(*b)),
        Expression::Null(_) => Ok(Value::Null),

        Expression::Template(template, _) => {
            render_template(template, context, calls).map(Value::String)
        }

        Expression::Traversal { root, steps, .. } => {
            let mut current = context
                .variable(root)
                .ok_or_else(|| EvalError::UndefinedVariable(root.clone()))?;
            let mut path = root.clone();
            for step in steps {
                current = match current {
                    Value::Object(fields) => fields.get(step),
                    _ => None,
                }
                .ok_or_else(|| EvalError::UnsupportedAttribute {
                    path: path.clone(),
                    attribute: step.clone(),
                })?;
                path.push('.');
                path.push_str(step);
            }
            Ok(current.clone())
        }

        Expression::FunctionCall { name, arguments, .. } => {
            if calls == Calls::Denied {
                return Err(EvalError::FunctionsUnavailable(name.clone()));
            }
            let function = context
                .function(name)
                .ok_or_else(|| EvalError::UndefinedFunction(name.clone()))?;
            let args = arguments
                .iter()
                .map(|arg| evaluate(arg, context, calls))
                .collect::<Result<Vec<_>, _>>()?;
            function.call(name, &args, context.random())
        }
    }
}

fn render_template(
    template: &TemplateString,
    context: &EvaluationContext,
    calls: Calls,
) -> Result<String, EvalError> {
    let mut out = String::new();
    for part in &template.parts {
        match part {
            TemplatePart::Literal(text) => out.push_str(text),
            TemplatePart::Interpolation(expr) => match evaluate(expr, context, calls)? {
                v @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => {
                    out.push_str(&v.to_string())
                }
                other => return Err(EvalError::Interpolation(other.type_name())),
            },
        }
    }
    Ok(out)
}
