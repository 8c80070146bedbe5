//! # Schema Registry
//!
//! Name-keyed store of registered manifests. Hosts without compile-time
//! reflection register a [`Schema`] per serializable aggregate type up
//! front and look it up by name at codec call sites.
//!
//! Registration rejects duplicates; replacing a manifest under a live name
//! would silently change the meaning of already-written buffers.

use eyre::{bail, Result};
use hashbrown::HashMap;

use crate::schema::Schema;

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, schema: Schema) -> Result<()> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            bail!("type `{}` is already registered", name);
        }
        self.schemas.insert(name, schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}
