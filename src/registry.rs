//! Model-to-source resolution.
//!
//! Statements name models, not tables. A [`ModelRegistry`] maps each model
//! to the table (and optional schema) backing it, plus the connection reads
//! against it should use. The compiled-statement executor drives the whole
//! lookup; applications implement the trait or use [`SimpleRegistry`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::db::Adapter;

/// Resolves model names to storage coordinates and connections.
pub trait ModelRegistry {
    /// Table or view backing `model`; `None` when the model is unknown.
    fn source(&self, model: &str) -> Option<String>;

    /// Schema qualifying the source, when any.
    fn schema(&self, model: &str) -> Option<String> {
        let _ = model;
        None
    }

    /// Connection used for reads against `model`; `None` when the model is
    /// unknown to this registry.
    fn read_connection(&self, model: &str) -> Option<Rc<Adapter>>;
}

#[derive(Debug, Clone)]
struct SourceEntry {
    source: String,
    schema: Option<String>,
}

/// Table-driven registry: explicit model entries sharing one connection.
#[derive(Debug)]
pub struct SimpleRegistry {
    connection: Rc<Adapter>,
    entries: HashMap<String, SourceEntry>,
}

impl SimpleRegistry {
    pub fn new(connection: Rc<Adapter>) -> Self {
        SimpleRegistry {
            connection,
            entries: HashMap::new(),
        }
    }

    /// Register `model` as backed by `source`.
    pub fn register(&mut self, model: impl Into<String>, source: impl Into<String>) {
        self.entries.insert(
            model.into(),
            SourceEntry {
                source: source.into(),
                schema: None,
            },
        );
    }

    /// Register `model` as backed by `schema.source`.
    pub fn register_with_schema(
        &mut self,
        model: impl Into<String>,
        schema: impl Into<String>,
        source: impl Into<String>,
    ) {
        self.entries.insert(
            model.into(),
            SourceEntry {
                source: source.into(),
                schema: Some(schema.into()),
            },
        );
    }

    pub fn connection(&self) -> Rc<Adapter> {
        Rc::clone(&self.connection)
    }
}

impl ModelRegistry for SimpleRegistry {
    fn source(&self, model: &str) -> Option<String> {
        self.entries.get(model).map(|e| e.source.clone())
    }

    fn schema(&self, model: &str) -> Option<String> {
        self.entries.get(model).and_then(|e| e.schema.clone())
    }

    fn read_connection(&self, model: &str) -> Option<Rc<Adapter>> {
        self.entries
            .get(model)
            .map(|_| Rc::clone(&self.connection))
    }
}
