use std::collections::HashMap;

use crate::record::{Cat, Dog, Record, ResolvedFields};

pub const DEFAULT_CAT_SOUND: &str = "meow";
pub const DEFAULT_DOG_BREED: &str = "mutt";

/// Type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Bool,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
        }
    }
}

/// A resolved, typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    /// The zero value of a type: what an omitted field resolves to before
    /// defaults are applied.
    pub fn zero(ty: FieldType) -> Self {
        match ty {
            FieldType::String => FieldValue::String(String::new()),
            FieldType::Number => FieldValue::Number(0.0),
            FieldType::Bool => FieldValue::Bool(false),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::String(s) => s.is_empty(),
            FieldValue::Number(n) => *n == 0.0,
            FieldValue::Bool(b) => !b,
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Bool(_) => FieldType::Bool,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Replaces a zero value after evaluation. Only meaningful for optional fields.
    pub default: FieldValue,
}

impl FieldDescriptor {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
            required: true,
            default: FieldValue::zero(field_type),
        }
    }

    pub fn optional(name: impl Into<String>, default: FieldValue) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type: default.field_type(),
            required: false,
            default,
        }
    }
}

/// Builds the concrete record once every field is resolved.
pub type Constructor = fn(String, ResolvedFields) -> Record;

/// The closed set of fields one discriminator value accepts.
#[derive(Debug, Clone)]
pub struct VariantSchema {
    pub discriminator: String,
    pub fields: Vec<FieldDescriptor>,
    constructor: Constructor,
}

impl VariantSchema {
    pub fn new(discriminator: impl Into<String>, constructor: Constructor) -> Self {
        VariantSchema {
            discriminator: discriminator.into(),
            fields: Vec::new(),
            constructor,
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn construct(&self, label: String, fields: ResolvedFields) -> Record {
        (self.constructor)(label, fields)
    }
}

/// Discriminator value → schema. Adding a variant is adding an entry.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    variants: HashMap<String, VariantSchema>,
}

impl SchemaRegistry {
    /// A registry with no variants.
    pub fn empty() -> Self {
        SchemaRegistry {
            variants: HashMap::new(),
        }
    }

    /// The `cat` and `dog` variants.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            VariantSchema::new("cat", construct_cat).with_field(FieldDescriptor::optional(
                "sound",
                FieldValue::String(DEFAULT_CAT_SOUND.to_string()),
            )),
        );
        registry.register(
            VariantSchema::new("dog", construct_dog).with_field(FieldDescriptor::optional(
                "breed",
                FieldValue::String(DEFAULT_DOG_BREED.to_string()),
            )),
        );
        registry
    }

    /// Add a variant, returning the one it replaced, if any.
    pub fn register(&mut self, schema: VariantSchema) -> Option<VariantSchema> {
        self.variants.insert(schema.discriminator.clone(), schema)
    }

    pub fn lookup(&self, discriminator: &str) -> Option<&VariantSchema> {
        self.variants.get(discriminator)
    }

    /// Registered discriminators, sorted.
    pub fn discriminators(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variants.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn construct_cat(name: String, mut fields: ResolvedFields) -> Record {
    Record::Cat(Cat {
        name,
        sound: fields.take_string("sound"),
    })
}

fn construct_dog(name: String, mut fields: ResolvedFields) -> Record {
    Record::Dog(Dog {
        name,
        breed: fields.take_string("breed"),
    })
}
