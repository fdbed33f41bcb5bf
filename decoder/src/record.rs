use std::collections::BTreeMap;

use crate::schema::FieldValue;

/// Field values of one block after evaluation and default-filling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFields {
    values: BTreeMap<String, FieldValue>,
}

impl ResolvedFields {
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Remove a string field. Schemas guarantee the type, so anything else
    /// reads as empty.
    pub fn take_string(&mut self, name: &str) -> String {
        match self.values.remove(name) {
            Some(FieldValue::String(s)) => s,
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cat {
    pub name: String,
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dog {
    pub name: String,
    pub breed: String,
}

/// A fully decoded `pet` block.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Cat(Cat),
    Dog(Dog),
}

impl Record {
    /// The block label.
    pub fn label(&self) -> &str {
        match self {
            Record::Cat(cat) => &cat.name,
            Record::Dog(dog) => &dog.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Record::Cat(_) => "cat",
            Record::Dog(_) => "dog",
        }
    }
}
