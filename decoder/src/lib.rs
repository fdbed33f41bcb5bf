pub mod context;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod generic;
pub mod library;
pub mod orchestrator;
pub mod random;
pub mod record;
pub mod schema;
pub mod typed;
pub mod value;

pub use context::{ContextBuilder, EvaluationContext};
pub use error::{DecodeError, EvalError};
pub use orchestrator::{decode, decode_with};
pub use record::{Cat, Dog, Record};
pub use schema::SchemaRegistry;
pub use value::Value;
