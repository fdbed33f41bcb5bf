//! Built-in functions available inside `characteristics` attributes.

use std::collections::HashMap;

use crate::function::{FunctionError, FunctionSpec, Parameter};
use crate::random::RandomSource;
use crate::schema::{FieldType, FieldValue};

/// All built-in functions by name.
pub fn standard_library() -> HashMap<String, FunctionSpec> {
    let mut functions = HashMap::new();
    functions.insert("select".to_string(), select());
    functions.insert("random".to_string(), random());
    functions
}

/// `select(candidates...)`: one candidate, drawn uniformly.
pub fn select() -> FunctionSpec {
    FunctionSpec {
        params: Vec::new(),
        variadic: Some(Parameter {
            name: "candidates",
            ty: FieldType::String,
        }),
        min_variadic: 1,
        return_type: FieldType::String,
        implementation: select_impl,
    }
}

/// `random(count, separator, candidates...)`: `count` distinct draws without
/// replacement, joined by `separator` in draw order.
///
/// `random(3, ", ", "a", "b", "c")` may give `"c, a, b"`.
pub fn random() -> FunctionSpec {
    FunctionSpec {
        params: vec![
            Parameter {
                name: "count",
                ty: FieldType::Number,
            },
            Parameter {
                name: "separator",
                ty: FieldType::String,
            },
        ],
        variadic: Some(Parameter {
            name: "candidates",
            ty: FieldType::String,
        }),
        min_variadic: 0,
        return_type: FieldType::String,
        implementation: random_impl,
    }
}

fn select_impl(args: &[FieldValue], random: &dyn RandomSource) -> Result<FieldValue, FunctionError> {
    let candidates = strings(args);
    if candidates.is_empty() {
        return Err(FunctionError::Arity("at least one argument required".to_string()));
    }
    let picked = candidates[random.index(candidates.len())];
    Ok(FieldValue::String(picked.to_string()))
}

fn random_impl(args: &[FieldValue], random: &dyn RandomSource) -> Result<FieldValue, FunctionError> {
    let (count, separator, rest) = match args {
        [FieldValue::Number(count), FieldValue::String(separator), rest @ ..] => {
            (*count, separator.as_str(), rest)
        }
        _ => return Err(FunctionError::Arity("expected count and separator".to_string())),
    };

    if count < 0.0 || count.fract() != 0.0 || !count.is_finite() {
        return Err(FunctionError::Domain(format!(
            "count must be a non-negative whole number, got {}",
            count
        )));
    }
    let count = count as usize;

    let mut candidates = strings(rest);
    if count > candidates.len() {
        return Err(FunctionError::Arity(format!(
            "unable to select {} random elements from list of length {}",
            count,
            candidates.len()
        )));
    }

    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        let idx = random.index(candidates.len());
        picked.push(candidates.remove(idx));
    }
    Ok(FieldValue::String(picked.join(separator)))
}

fn strings(args: &[FieldValue]) -> Vec<&str> {
    args.iter()
        .filter_map(|a| match a {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}
