//! Bind values and bind maps.
//!
//! `Value` is the runtime representation of anything that can travel into a
//! prepared statement: the builder stores them, the condition parser extracts
//! them, and the adapter binds them. `BindMap` keeps binds in insertion order
//! with colon-free names; the executor prefixes the driver's marker syntax at
//! dispatch time.

use serde::Serialize;

// =============================================================================
// Values
// =============================================================================

/// A bindable SQL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

// =============================================================================
// Bind Types
// =============================================================================

/// Driver-level parameter type tag.
///
/// When a bind carries no explicit tag the type is inferred from the value at
/// bind time: strings bind as strings, integers as integers, booleans as
/// booleans, null as null. Everything else (floats, byte blobs) falls back to
/// the string tag, matching the wire behavior of the string-typed drivers this
/// layer fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindType {
    Null,
    Int,
    Str,
    Bool,
}

impl BindType {
    /// Infer the tag from a value's runtime type.
    pub fn infer(value: &Value) -> BindType {
        match value {
            Value::Str(_) => BindType::Str,
            Value::Int(_) => BindType::Int,
            Value::Bool(_) => BindType::Bool,
            Value::Null => BindType::Null,
            Value::Float(_) | Value::Bytes(_) => BindType::Str,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BindType::Null => "null",
            BindType::Int => "int",
            BindType::Str => "str",
            BindType::Bool => "bool",
        }
    }
}

// =============================================================================
// Bind Map
// =============================================================================

/// A value plus its optional explicit type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Bind {
    pub value: Value,
    pub ty: Option<BindType>,
}

impl Bind {
    pub fn new(value: impl Into<Value>) -> Self {
        Bind {
            value: value.into(),
            ty: None,
        }
    }

    pub fn typed(value: impl Into<Value>, ty: BindType) -> Self {
        Bind {
            value: value.into(),
            ty: Some(ty),
        }
    }

    /// The explicit tag when present, otherwise the inferred one.
    pub fn bind_type(&self) -> BindType {
        self.ty.unwrap_or_else(|| BindType::infer(&self.value))
    }
}

impl<T: Into<Value>> From<T> for Bind {
    fn from(value: T) -> Self {
        Bind::new(value)
    }
}

/// Insertion-ordered map of colon-free bind names to binds.
///
/// Inserting under an existing name overwrites in place, keeping the original
/// position; merges let the incoming map win on name collisions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindMap {
    entries: Vec<(String, Bind)>,
}

impl BindMap {
    pub fn new() -> Self {
        BindMap::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.insert_bind(name, Bind::new(value));
    }

    pub fn insert_typed(&mut self, name: impl Into<String>, value: impl Into<Value>, ty: BindType) {
        self.insert_bind(name, Bind::typed(value, ty));
    }

    pub fn insert_bind(&mut self, name: impl Into<String>, bind: Bind) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = bind,
            None => self.entries.push((name, bind)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Bind> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|b| &b.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bind)> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Fold `other` into `self`; `other` wins on name collisions.
    pub fn merge(&mut self, other: &BindMap) {
        for (name, bind) in other.iter() {
            self.insert_bind(name, bind.clone());
        }
    }
}

impl<K: Into<String>, V: Into<Bind>, const N: usize> From<[(K, V); N]> for BindMap {
    fn from(entries: [(K, V); N]) -> Self {
        let mut map = BindMap::new();
        for (name, bind) in entries {
            map.insert_bind(name, bind.into());
        }
        map
    }
}

/// `()` reads as "no binds" at call sites that require a bind argument.
impl From<()> for BindMap {
    fn from(_: ()) -> Self {
        BindMap::new()
    }
}
