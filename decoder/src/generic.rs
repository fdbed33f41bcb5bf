use std::ops::Range;

use hclite::Document;
use hclite::body::{Block, Body};
use tracing::debug;

use crate::context::EvaluationContext;
use crate::error::{DecodeError, EvalError};
use crate::evaluator::{Calls, evaluate};
use crate::schema::{FieldType, FieldValue};

/// Type of the repeated top-level block.
pub const PET_BLOCK: &str = "pet";
/// Attribute selecting the variant schema.
pub const DISCRIMINATOR_ATTRIBUTE: &str = "type";
/// Block whose contents are decoded only once the variant is known.
pub const CHARACTERISTICS_BLOCK: &str = "characteristics";

/// The part of a block left undecoded by the first pass.
#[derive(Debug, Clone, Copy)]
pub struct DeferredBody<'doc> {
    body: Option<&'doc Body>,
}

impl<'doc> DeferredBody<'doc> {
    /// The `characteristics` body, or `None` if the block had none.
    pub fn body(&self) -> Option<&'doc Body> {
        self.body
    }
}

/// Result of the first pass over one block.
#[derive(Debug, Clone)]
pub struct GenericBlock<'doc> {
    pub label: String,
    pub discriminator: String,
    pub deferred: DeferredBody<'doc>,
    /// Span of the whole `pet` block.
    pub span: Range<usize>,
    /// Span of the discriminator's value.
    pub discriminator_span: Range<usize>,
}

/// First pass: read every `pet` block's label and discriminator, keeping the
/// characteristics body opaque. Fails on the first malformed block.
pub fn decode_generic<'doc>(
    document: &'doc Document,
    context: &EvaluationContext,
) -> Result<Vec<GenericBlock<'doc>>, DecodeError> {
    let body = &document.body;

    if let Some(attribute) = body.attributes.first() {
        return Err(schema_error(
            format!(
                "unexpected top-level attribute `{}`; only `{}` blocks are allowed",
                attribute.name, PET_BLOCK
            ),
            attribute.name_span.clone(),
        ));
    }

    let mut generic = Vec::with_capacity(body.blocks.len());
    for block in &body.blocks {
        if block.block_type != PET_BLOCK {
            return Err(schema_error(
                format!(
                    "unexpected block `{}`; only `{}` blocks are allowed",
                    block.block_type, PET_BLOCK
                ),
                block.type_span.clone(),
            ));
        }
        generic.push(decode_block(block, context)?);
    }
    Ok(generic)
}

fn decode_block<'doc>(
    block: &'doc Block,
    context: &EvaluationContext,
) -> Result<GenericBlock<'doc>, DecodeError> {
    let label = match block.labels.as_slice() {
        [label] => label.value.clone(),
        _ => {
            return Err(schema_error(
                format!(
                    "a `{}` block needs exactly one label (its name), found {}",
                    PET_BLOCK,
                    block.labels.len()
                ),
                block.type_span.clone(),
            ));
        }
    };

    let body = &block.body;

    if let Some(extra) = body
        .attributes
        .iter()
        .find(|a| a.name != DISCRIMINATOR_ATTRIBUTE)
    {
        return Err(schema_error(
            format!(
                "pet \"{}\": unexpected attribute `{}`; variant attributes belong in `{}`",
                label, extra.name, CHARACTERISTICS_BLOCK
            ),
            extra.name_span.clone(),
        ));
    }
    if let Some(extra) = body
        .blocks
        .iter()
        .find(|b| b.block_type != CHARACTERISTICS_BLOCK)
    {
        return Err(schema_error(
            format!("pet \"{}\": unexpected block `{}`", label, extra.block_type),
            extra.type_span.clone(),
        ));
    }

    let mut characteristics = body.blocks_of_type(CHARACTERISTICS_BLOCK);
    let deferred = characteristics.next();
    if let Some(duplicate) = characteristics.next() {
        return Err(schema_error(
            format!(
                "pet \"{}\": only one `{}` block is allowed",
                label, CHARACTERISTICS_BLOCK
            ),
            duplicate.type_span.clone(),
        ));
    }
    if let Some(deferred) = deferred
        && !deferred.labels.is_empty()
    {
        return Err(schema_error(
            format!(
                "pet \"{}\": a `{}` block takes no labels",
                label, CHARACTERISTICS_BLOCK
            ),
            deferred.labels[0].span.clone(),
        ));
    }

    let Some(attribute) = body.attribute(DISCRIMINATOR_ATTRIBUTE) else {
        return Err(schema_error(
            format!(
                "pet \"{}\" is missing the `{}` attribute",
                label, DISCRIMINATOR_ATTRIBUTE
            ),
            block.span.clone(),
        ));
    };

    let discriminator_span = attribute.expression.span().clone();
    let evaluation_error = |error: EvalError| DecodeError::Evaluation {
        label: label.clone(),
        field: DISCRIMINATOR_ATTRIBUTE.to_string(),
        error,
        span: discriminator_span.clone(),
    };
    let value = evaluate(&attribute.expression, context, Calls::Denied).map_err(evaluation_error)?;
    let discriminator = match value.convert(FieldType::String).map_err(evaluation_error)? {
        Some(FieldValue::String(s)) => s,
        _ => {
            return Err(evaluation_error(EvalError::TypeMismatch {
                expected: "string",
                got: value.type_name(),
            }));
        }
    };

    debug!(label = %label, discriminator = %discriminator, "decoded generic block");
    Ok(GenericBlock {
        label,
        discriminator,
        deferred: DeferredBody {
            body: deferred.map(|b| &b.body),
        },
        span: block.span.clone(),
        discriminator_span,
    })
}

fn schema_error(message: String, span: Range<usize>) -> DecodeError {
    DecodeError::Schema { message, span }
}
