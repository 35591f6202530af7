//! Condition parsing - field maps into SQL fragments plus extracted binds.
//!
//! `parse` turns a map of field -> value (or an explicit bind specification)
//! into an `AND`-joined condition fragment and the bind map it references.
//! A plain string passes through untouched; the caller owns its binds.
//!
//! Fragments use the intermediate marker syntax (`field=:name:`), so parser
//! output composes directly with builder-rendered statements.

use crate::db::value::{BindMap, Value};

/// Error type for condition parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConditionError {
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),
}

pub type ConditionResult<T> = Result<T, ConditionError>;

// =============================================================================
// Input forms
// =============================================================================

/// Condition input: a ready-made clause or an ordered field map.
#[derive(Debug, Clone, PartialEq)]
pub enum Conditions {
    /// A complete condition string, passed through verbatim.
    Clause(String),
    /// Ordered (field, specification) pairs, joined with `AND`.
    Fields(Vec<(String, FieldSpec)>),
}

/// Per-field value specification.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// Bare value; the bind takes the field's name.
    Scalar(Value),
    /// Explicit specification: `[value]` or `[value, bind_name]`.
    Spec(Vec<Value>),
}

impl FieldSpec {
    /// A value bound under an explicit name instead of the field name.
    pub fn with_bind(value: impl Into<Value>, bind_name: &str) -> Self {
        FieldSpec::Spec(vec![value.into(), Value::Str(bind_name.to_string())])
    }
}

impl From<Value> for FieldSpec {
    fn from(v: Value) -> Self {
        FieldSpec::Scalar(v)
    }
}

impl From<&str> for FieldSpec {
    fn from(v: &str) -> Self {
        FieldSpec::Scalar(v.into())
    }
}

impl From<String> for FieldSpec {
    fn from(v: String) -> Self {
        FieldSpec::Scalar(v.into())
    }
}

impl From<i64> for FieldSpec {
    fn from(v: i64) -> Self {
        FieldSpec::Scalar(v.into())
    }
}

impl From<i32> for FieldSpec {
    fn from(v: i32) -> Self {
        FieldSpec::Scalar(v.into())
    }
}

impl From<f64> for FieldSpec {
    fn from(v: f64) -> Self {
        FieldSpec::Scalar(v.into())
    }
}

impl From<bool> for FieldSpec {
    fn from(v: bool) -> Self {
        FieldSpec::Scalar(v.into())
    }
}

impl From<Vec<Value>> for FieldSpec {
    fn from(v: Vec<Value>) -> Self {
        FieldSpec::Spec(v)
    }
}

impl From<&str> for Conditions {
    fn from(s: &str) -> Self {
        Conditions::Clause(s.to_string())
    }
}

impl From<String> for Conditions {
    fn from(s: String) -> Self {
        Conditions::Clause(s)
    }
}

impl From<Vec<(String, FieldSpec)>> for Conditions {
    fn from(fields: Vec<(String, FieldSpec)>) -> Self {
        Conditions::Fields(fields)
    }
}

impl<K: Into<String>, V: Into<FieldSpec>, const N: usize> From<[(K, V); N]> for Conditions {
    fn from(fields: [(K, V); N]) -> Self {
        Conditions::Fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// =============================================================================
// Parsing
// =============================================================================

impl Conditions {
    /// Parse into a condition fragment and its extracted bind map.
    pub fn parse(self) -> ConditionResult<(String, BindMap)> {
        match self {
            Conditions::Clause(s) => Ok((s, BindMap::new())),
            Conditions::Fields(fields) => parse_fields(fields),
        }
    }
}

/// Parse condition input into `(fragment, binds)`.
pub fn parse(conditions: impl Into<Conditions>) -> ConditionResult<(String, BindMap)> {
    conditions.into().parse()
}

fn parse_fields(fields: Vec<(String, FieldSpec)>) -> ConditionResult<(String, BindMap)> {
    if fields.is_empty() {
        return Ok((String::new(), BindMap::new()));
    }

    let mut fragments = Vec::with_capacity(fields.len());
    let mut binds = BindMap::new();

    for (key, spec) in fields {
        if key.contains(' ') {
            // A key with a space is itself a fragment ("price > "); it passes
            // through verbatim with a synthetic empty bind named "k". Kept
            // bit-for-bit: downstream consumers observe this output.
            fragments.push(key);
            binds.insert("k", "");
            continue;
        }

        match spec {
            FieldSpec::Scalar(value) => {
                fragments.push(format!("{}=:{}:", key, key));
                binds.insert(key, value);
            }
            FieldSpec::Spec(items) => match items.len() {
                1 => {
                    fragments.push(format!("{}=:{}:", key, key));
                    let mut items = items;
                    binds.insert(key, items.pop().unwrap_or(Value::Null));
                }
                2 => {
                    let mut items = items;
                    let name_value = items.pop().unwrap_or(Value::Null);
                    let value = items.pop().unwrap_or(Value::Null);
                    let name = match name_value {
                        Value::Str(s) => s,
                        other => {
                            return Err(ConditionError::InvalidCondition(format!(
                                "bind name for field '{}' must be a string, got {}",
                                key, other
                            )))
                        }
                    };
                    fragments.push(format!("{}=:{}:", key, name));
                    binds.insert(name, value);
                }
                n => {
                    return Err(ConditionError::InvalidCondition(format!(
                        "bind specification for field '{}' must have 1 or 2 elements, got {}",
                        key, n
                    )))
                }
            },
        }
    }

    Ok((fragments.join(" AND "), binds))
}
