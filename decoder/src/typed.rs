use tracing::debug;

use crate::context::EvaluationContext;
use crate::error::{DecodeError, EvalError};
use crate::evaluator::{Calls, evaluate};
use crate::generic::GenericBlock;
use crate::record::{Record, ResolvedFields};
use crate::schema::{FieldValue, SchemaRegistry};

/// Second pass: decode a block's deferred body with the schema its
/// discriminator selects.
///
/// Schemas are closed: any attribute or nested block they don't declare is
/// rejected before a single expression is evaluated. After evaluation, an
/// optional field holding its type's zero value takes the schema default,
/// so `sound = ""` and an omitted `sound` decode identically.
pub fn decode_typed(
    block: GenericBlock<'_>,
    registry: &SchemaRegistry,
    context: &EvaluationContext,
) -> Result<Record, DecodeError> {
    let GenericBlock {
        label,
        discriminator,
        deferred,
        span,
        discriminator_span,
    } = block;

    let Some(schema) = registry.lookup(&discriminator) else {
        return Err(DecodeError::UnknownVariant {
            label,
            discriminator,
            span: discriminator_span,
        });
    };

    let body = deferred.body();

    if let Some(body) = body {
        if let Some(nested) = body.blocks.first() {
            return Err(DecodeError::UnknownField {
                label,
                discriminator,
                name: nested.block_type.clone(),
                kind: "block",
                span: nested.type_span.clone(),
            });
        }
        if let Some(unknown) = body
            .attributes
            .iter()
            .find(|a| schema.field(&a.name).is_none())
        {
            return Err(DecodeError::UnknownField {
                label,
                discriminator,
                name: unknown.name.clone(),
                kind: "attribute",
                span: unknown.name_span.clone(),
            });
        }
    }

    let mut fields = ResolvedFields::default();
    for descriptor in &schema.fields {
        let attribute = body.and_then(|b| b.attribute(&descriptor.name));

        let resolved = match attribute {
            Some(attribute) => {
                let evaluation_error = |error: EvalError| DecodeError::Evaluation {
                    label: label.clone(),
                    field: descriptor.name.clone(),
                    error,
                    span: attribute.expression.span().clone(),
                };
                evaluate(&attribute.expression, context, Calls::Allowed)
                    .and_then(|value| value.convert(descriptor.field_type))
                    .map_err(evaluation_error)?
            }
            None => None,
        };

        let value = match resolved {
            Some(value) => value,
            None if descriptor.required => {
                return Err(DecodeError::MissingField {
                    label,
                    discriminator,
                    field: descriptor.name.clone(),
                    span: body.map_or(span, |b| b.span.clone()),
                });
            }
            None => FieldValue::zero(descriptor.field_type),
        };

        let value = if !descriptor.required && value.is_zero() {
            debug!(label = %label, field = %descriptor.name, "using default for empty field");
            descriptor.default.clone()
        } else {
            value
        };
        fields.insert(descriptor.name.clone(), value);
    }

    debug!(label = %label, discriminator = %discriminator, "decoded typed block");
    Ok(schema.construct(label, fields))
}
