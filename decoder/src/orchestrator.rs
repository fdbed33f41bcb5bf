use hclite::Document;
use tracing::info;

use crate::context::EvaluationContext;
use crate::error::DecodeError;
use crate::generic::decode_generic;
use crate::record::Record;
use crate::schema::SchemaRegistry;
use crate::typed::decode_typed;

/// Decode every `pet` block with the built-in variants.
pub fn decode(document: &Document, context: &EvaluationContext) -> Result<Vec<Record>, DecodeError> {
    decode_with(document, &SchemaRegistry::builtin(), context)
}

/// Decode every `pet` block, in document order, with the given variants.
/// Either every block decodes or the first error is returned.
pub fn decode_with(
    document: &Document,
    registry: &SchemaRegistry,
    context: &EvaluationContext,
) -> Result<Vec<Record>, DecodeError> {
    let generic = decode_generic(document, context)?;

    let records = generic
        .into_iter()
        .map(|block| decode_typed(block, registry, context))
        .collect::<Result<Vec<_>, _>>()?;

    info!(records = records.len(), "decoded configuration");
    Ok(records)
}
