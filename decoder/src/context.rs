use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::function::FunctionSpec;
use crate::library;
use crate::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::value::Value;

/// Name of the namespace holding environment variables: `env.NAME`.
pub const ENVIRONMENT_NAMESPACE: &str = "env";

/// Only environment variables starting with this prefix are visible, with
/// the prefix stripped: `PET_CAT_SOUND` becomes `env.CAT_SOUND`.
pub const DEFAULT_ENVIRONMENT_PREFIX: &str = "PET_";

/// Variables and functions visible to expressions during one decode run.
/// Read-only once built.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    variables: BTreeMap<String, Value>,
    functions: HashMap<String, FunctionSpec>,
    random: Arc<dyn RandomSource>,
}

impl EvaluationContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Context over an environment snapshot with the standard library and a
    /// non-reproducible random source.
    pub fn from_environment<I, K, V>(snapshot: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ContextBuilder::new().environment(snapshot).build()
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name)
    }

    pub fn random(&self) -> &dyn RandomSource {
        self.random.as_ref()
    }

    /// The value of `env.<name>`, if the snapshot defined it.
    pub fn environment_value(&self, name: &str) -> Option<&str> {
        match self.variables.get(ENVIRONMENT_NAMESPACE) {
            Some(Value::Object(fields)) => match fields.get(name) {
                Some(Value::String(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }
}

pub struct ContextBuilder {
    prefix: String,
    environment: Vec<(String, String)>,
    functions: HashMap<String, FunctionSpec>,
    random: Arc<dyn RandomSource>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        ContextBuilder {
            prefix: DEFAULT_ENVIRONMENT_PREFIX.to_string(),
            environment: Vec::new(),
            functions: library::standard_library(),
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Add key/value pairs from an environment snapshot, in iteration order.
    pub fn environment<I, K, V>(mut self, snapshot: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(snapshot.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Register a function, replacing any existing one of the same name.
    pub fn function(mut self, name: impl Into<String>, spec: FunctionSpec) -> Self {
        self.functions.insert(name.into(), spec);
        self
    }

    pub fn random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Use a reproducible random source.
    pub fn seed(self, seed: u64) -> Self {
        self.random_source(Arc::new(SeededRandom::new(seed)))
    }

    pub fn build(self) -> EvaluationContext {
        let mut namespace = BTreeMap::new();
        for (key, value) in self.environment {
            let Some(name) = key.strip_prefix(self.prefix.as_str()) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            trace!(key = %key, name, "environment variable visible to expressions");
            // Last write wins when two keys strip to the same name
            namespace.insert(name.to_string(), Value::String(value));
        }
        debug!(
            variables = namespace.len(),
            functions = self.functions.len(),
            prefix = %self.prefix,
            "built evaluation context"
        );

        let mut variables = BTreeMap::new();
        variables.insert(ENVIRONMENT_NAMESPACE.to_string(), Value::Object(namespace));
        EvaluationContext {
            variables,
            functions: self.functions,
            random: self.random,
        }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
