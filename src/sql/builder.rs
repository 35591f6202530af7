//! Fluent query builder.
//!
//! `Builder` accumulates columns, sources, joins, conditions and modifiers
//! through chainable consume-self setters, then renders them into an
//! intermediate [`Statement`](super::statement::Statement) with a fixed clause
//! order:
//!
//! ```text
//! SELECT [DISTINCT|ALL] columns FROM sources joins
//!   [WHERE ...] [GROUP BY ...] [HAVING ...] [ORDER BY ...]
//!   [LIMIT n] [OFFSET n] [FOR UPDATE]
//! ```
//!
//! Setters never fail; everything that can go wrong (missing sources,
//! non-integer limits, malformed condition maps) surfaces at the render
//! terminals, leaving the accumulated state intact for inspection and retry.

use std::rc::Rc;

use super::conditions::{ConditionError, Conditions};
use super::query::Query;
use super::statement::Statement;
use crate::db::value::{BindMap, Value};
use crate::registry::ModelRegistry;

/// Error type for statement rendering.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid LIMIT value: {0}")]
    InvalidLimit(Value),

    #[error("Invalid OFFSET value: {0}")]
    InvalidOffset(Value),

    #[error("No source model; call from() or add_from() before rendering")]
    NoSource,

    #[error(transparent)]
    Condition(#[from] ConditionError),
}

pub type BuildResult<T> = Result<T, BuildError>;

// =============================================================================
// Clause forms
// =============================================================================

/// Column clause input.
#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    /// A raw column string, folded in verbatim.
    Raw(String),
    /// (expression, optional alias) pairs.
    List(Vec<(String, Option<String>)>),
}

impl From<&str> for Columns {
    fn from(s: &str) -> Self {
        Columns::Raw(s.to_string())
    }
}

impl From<String> for Columns {
    fn from(s: String) -> Self {
        Columns::Raw(s)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(items: Vec<&str>) -> Self {
        Columns::List(items.into_iter().map(|c| (c.to_string(), None)).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(items: [&str; N]) -> Self {
        Columns::List(items.into_iter().map(|c| (c.to_string(), None)).collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Columns {
    fn from(items: [(&str, &str); N]) -> Self {
        Columns::List(
            items
                .into_iter()
                .map(|(expr, alias)| (expr.to_string(), Some(alias.to_string())))
                .collect(),
        )
    }
}

/// Order clause input: a raw string passes through unchanged, list items are
/// quoted individually.
#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    Raw(String),
    List(Vec<String>),
}

impl From<&str> for Order {
    fn from(s: &str) -> Self {
        Order::Raw(s.to_string())
    }
}

impl From<String> for Order {
    fn from(s: String) -> Self {
        Order::Raw(s)
    }
}

impl From<Vec<&str>> for Order {
    fn from(items: Vec<&str>) -> Self {
        Order::List(items.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Order {
    fn from(items: [&str; N]) -> Self {
        Order::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Group clause input; always rendered comma-joined and verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldList(Vec<String>);

impl From<&str> for FieldList {
    fn from(s: &str) -> Self {
        FieldList(vec![s.to_string()])
    }
}

impl From<String> for FieldList {
    fn from(s: String) -> Self {
        FieldList(vec![s])
    }
}

impl From<Vec<&str>> for FieldList {
    fn from(items: Vec<&str>) -> Self {
        FieldList(items.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldList {
    fn from(items: [&str; N]) -> Self {
        FieldList(items.into_iter().map(str::to_string).collect())
    }
}

/// Join qualifiers; an unqualified join renders as bare `JOIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct JoinSpec {
    model: String,
    condition: Option<String>,
    alias: Option<String>,
    kind: Option<JoinKind>,
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent SELECT builder.
#[derive(Debug, Clone, Default)]
#[must_use = "builders accumulate state and do nothing until rendered"]
pub struct Builder {
    columns: Option<Columns>,
    sources: Vec<(String, Option<String>)>,
    joins: Vec<JoinSpec>,
    conditions: Option<String>,
    binds: BindMap,
    group: Option<FieldList>,
    having: Vec<String>,
    order: Option<Order>,
    limit: Option<Value>,
    offset: Option<Value>,
    distinct: Option<bool>,
    for_update: bool,
    hidden_param: u64,
    deferred: Option<ConditionError>,
}

impl Builder {
    pub fn new() -> Self {
        Builder::default()
    }

    /// Set the column clause, replacing any previous one.
    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Set the source list to a single model, replacing any previous sources.
    pub fn from(mut self, model: impl Into<String>) -> Self {
        self.sources = vec![(model.into(), None)];
        self
    }

    /// Append a source model with an optional alias.
    pub fn add_from(mut self, model: impl Into<String>, alias: Option<&str>) -> Self {
        self.sources.push((model.into(), alias.map(str::to_string)));
        self
    }

    /// Append an unqualified join.
    pub fn join(self, model: &str, condition: Option<&str>, alias: Option<&str>) -> Self {
        self.push_join(model, condition, alias, None)
    }

    pub fn inner_join(self, model: &str, condition: Option<&str>, alias: Option<&str>) -> Self {
        self.push_join(model, condition, alias, Some(JoinKind::Inner))
    }

    pub fn left_join(self, model: &str, condition: Option<&str>, alias: Option<&str>) -> Self {
        self.push_join(model, condition, alias, Some(JoinKind::Left))
    }

    pub fn right_join(self, model: &str, condition: Option<&str>, alias: Option<&str>) -> Self {
        self.push_join(model, condition, alias, Some(JoinKind::Right))
    }

    fn push_join(
        mut self,
        model: &str,
        condition: Option<&str>,
        alias: Option<&str>,
        kind: Option<JoinKind>,
    ) -> Self {
        self.joins.push(JoinSpec {
            model: model.to_string(),
            condition: condition.map(str::to_string),
            alias: alias.map(str::to_string),
            kind,
        });
        self
    }

    /// Set the condition, replacing any previous one; binds are merged.
    pub fn r#where(mut self, conditions: impl Into<Conditions>, binds: impl Into<BindMap>) -> Self {
        if let Some(fragment) = self.absorb(conditions, binds) {
            self.conditions = Some(fragment);
        }
        self
    }

    /// Alias for [`Builder::where`](Self::where).
    pub fn where_(self, conditions: impl Into<Conditions>, binds: impl Into<BindMap>) -> Self {
        self.r#where(conditions, binds)
    }

    /// Combine with the existing condition: `(existing) AND (new)`.
    pub fn and_where(
        mut self,
        conditions: impl Into<Conditions>,
        binds: impl Into<BindMap>,
    ) -> Self {
        if let Some(fragment) = self.absorb(conditions, binds) {
            self.conditions = Some(match self.conditions.take() {
                Some(existing) if !existing.is_empty() => {
                    format!("({}) AND ({})", existing, fragment)
                }
                _ => fragment,
            });
        }
        self
    }

    /// Combine with the existing condition: `(existing) OR (new)`.
    pub fn or_where(
        mut self,
        conditions: impl Into<Conditions>,
        binds: impl Into<BindMap>,
    ) -> Self {
        if let Some(fragment) = self.absorb(conditions, binds) {
            self.conditions = Some(match self.conditions.take() {
                Some(existing) if !existing.is_empty() => {
                    format!("({}) OR ({})", existing, fragment)
                }
                _ => fragment,
            });
        }
        self
    }

    /// Parse a condition input, merge its binds plus the supplied ones, and
    /// return the fragment. Parse failures are parked until render so the
    /// fluent chain stays infallible; an empty fragment is absorbed binds-only.
    fn absorb(
        &mut self,
        conditions: impl Into<Conditions>,
        binds: impl Into<BindMap>,
    ) -> Option<String> {
        let parsed = match conditions.into().parse() {
            Ok(parsed) => parsed,
            Err(err) => {
                if self.deferred.is_none() {
                    self.deferred = Some(err);
                }
                return None;
            }
        };
        let (fragment, extracted) = parsed;
        self.binds.merge(&extracted);
        self.binds.merge(&binds.into());
        if fragment.is_empty() {
            None
        } else {
            Some(fragment)
        }
    }

    /// `expr BETWEEN :min: AND :max:` with counter-named binds.
    pub fn between_where(
        mut self,
        expr: &str,
        minimum: impl Into<Value>,
        maximum: impl Into<Value>,
    ) -> Self {
        let (min_key, max_key) = (self.next_hidden_param(), self.next_hidden_param());
        let condition = format!("{} BETWEEN :{}: AND :{}:", expr, min_key, max_key);
        self.binds.insert(min_key, minimum);
        self.binds.insert(max_key, maximum);
        self.and_where(condition, ())
    }

    /// `expr NOT BETWEEN :min: AND :max:` with counter-named binds.
    pub fn not_between_where(
        mut self,
        expr: &str,
        minimum: impl Into<Value>,
        maximum: impl Into<Value>,
    ) -> Self {
        let (min_key, max_key) = (self.next_hidden_param(), self.next_hidden_param());
        let condition = format!("{} NOT BETWEEN :{}: AND :{}:", expr, min_key, max_key);
        self.binds.insert(min_key, minimum);
        self.binds.insert(max_key, maximum);
        self.and_where(condition, ())
    }

    /// `expr IN (:v0:, :v1:, ...)` with counter-named binds.
    ///
    /// An empty value list collapses to an always-false comparison instead of
    /// the invalid `IN ()`.
    pub fn in_where<V: Into<Value>>(self, expr: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.in_where_inner(expr, values, false)
    }

    /// `expr NOT IN (:v0:, :v1:, ...)` with counter-named binds.
    pub fn not_in_where<V: Into<Value>>(
        self,
        expr: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.in_where_inner(expr, values, true)
    }

    fn in_where_inner<V: Into<Value>>(
        mut self,
        expr: &str,
        values: impl IntoIterator<Item = V>,
        negated: bool,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            // Matches zero rows without emitting the invalid `IN ()`.
            return self.and_where(format!("{} <> {}", expr, expr), ());
        }

        let mut markers = Vec::with_capacity(values.len());
        for value in values {
            let key = self.next_hidden_param();
            markers.push(format!(":{}:", key));
            self.binds.insert(key, value);
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        let condition = format!("{} {} ({})", expr, keyword, markers.join(", "));
        self.and_where(condition, ())
    }

    fn next_hidden_param(&mut self) -> String {
        let key = format!("ABP{}", self.hidden_param);
        self.hidden_param += 1;
        key
    }

    /// Set the GROUP BY clause, replacing any previous one.
    pub fn group_by(mut self, group: impl Into<FieldList>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Append a HAVING fragment; multiple fragments are `AND`-joined.
    pub fn having(mut self, fragment: impl Into<String>) -> Self {
        self.having.push(fragment.into());
        self
    }

    /// Set the ORDER BY clause, replacing any previous one.
    pub fn order_by(mut self, order: impl Into<Order>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Set the row limit; validated at render time.
    pub fn limit(mut self, limit: impl Into<Value>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Set the row offset; validated at render time.
    pub fn offset(mut self, offset: impl Into<Value>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    /// Tri-state DISTINCT: `Some(true)` renders `DISTINCT`, `Some(false)`
    /// renders `ALL`, `None` renders neither.
    pub fn distinct(mut self, distinct: impl Into<Option<bool>>) -> Self {
        self.distinct = distinct.into();
        self
    }

    /// Append `FOR UPDATE` to the rendered statement.
    pub fn for_update(mut self, enable: bool) -> Self {
        self.for_update = enable;
        self
    }

    /// Accumulated builder-level binds.
    pub fn bind_params(&self) -> &BindMap {
        &self.binds
    }

    /// The combined condition string, when any.
    pub fn conditions(&self) -> Option<&str> {
        self.conditions.as_deref()
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render the intermediate statement.
    pub fn statement(&self) -> BuildResult<Statement> {
        if let Some(err) = &self.deferred {
            return Err(BuildError::Condition(err.clone()));
        }
        if self.sources.is_empty() {
            return Err(BuildError::NoSource);
        }

        let mut stmt = Statement::new();
        stmt.sql("SELECT");
        match self.distinct {
            Some(true) => {
                stmt.sql(" DISTINCT");
            }
            Some(false) => {
                stmt.sql(" ALL");
            }
            None => {}
        }
        stmt.sql(" ");

        self.render_columns(&mut stmt);

        stmt.sql(" FROM ");
        for (i, (model, alias)) in self.sources.iter().enumerate() {
            if i > 0 {
                stmt.sql(", ");
            }
            stmt.source(model);
            if let Some(alias) = alias {
                stmt.sql(" AS ").ident(alias);
            }
        }

        for join in &self.joins {
            stmt.sql(" ");
            match join.kind {
                Some(kind) => stmt.sql(kind.keyword()),
                None => stmt.sql("JOIN"),
            };
            stmt.sql(" ").source(&join.model);
            if let Some(alias) = &join.alias {
                stmt.sql(" AS ").ident(alias);
            }
            if let Some(condition) = &join.condition {
                stmt.sql(" ON ").fragment(condition);
            }
        }

        if let Some(conditions) = &self.conditions {
            if !conditions.is_empty() {
                stmt.sql(" WHERE ").fragment(conditions);
            }
        }

        if let Some(FieldList(group)) = &self.group {
            stmt.sql(" GROUP BY ").fragment(&group.join(", "));
        }

        match self.having.as_slice() {
            [] => {}
            [single] => {
                stmt.sql(" HAVING ").fragment(single);
            }
            many => {
                stmt.sql(" HAVING ");
                for (i, fragment) in many.iter().enumerate() {
                    if i > 0 {
                        stmt.sql(" AND ");
                    }
                    stmt.sql("(").fragment(fragment).sql(")");
                }
            }
        }

        match &self.order {
            Some(Order::Raw(order)) => {
                stmt.sql(" ORDER BY ").fragment(order);
            }
            Some(Order::List(items)) => {
                stmt.sql(" ORDER BY ");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        stmt.sql(", ");
                    }
                    // Bare identifiers are quoted; qualified items pass through.
                    if item.contains('.') {
                        stmt.fragment(item);
                    } else {
                        stmt.ident(item);
                    }
                }
            }
            None => {}
        }

        if let Some(limit) = &self.limit {
            let n = validate_count(limit).ok_or_else(|| BuildError::InvalidLimit(limit.clone()))?;
            stmt.sql(format!(" LIMIT {}", n));
        }
        if let Some(offset) = &self.offset {
            let n =
                validate_count(offset).ok_or_else(|| BuildError::InvalidOffset(offset.clone()))?;
            stmt.sql(format!(" OFFSET {}", n));
        }

        if self.for_update {
            stmt.sql(" FOR UPDATE");
        }

        Ok(stmt)
    }

    fn render_columns(&self, stmt: &mut Statement) {
        match &self.columns {
            None => {
                for (i, (model, alias)) in self.sources.iter().enumerate() {
                    if i > 0 {
                        stmt.sql(", ");
                    }
                    // The alias qualifies as-is; an unaliased source must
                    // resolve to its table at execution, like the FROM entry.
                    match alias {
                        Some(alias) => stmt.ident(alias),
                        None => stmt.source(model),
                    };
                    stmt.sql(".*");
                }
            }
            Some(Columns::Raw(raw)) => {
                stmt.fragment(raw);
            }
            Some(Columns::List(items)) => {
                for (i, (expr, alias)) in items.iter().enumerate() {
                    if i > 0 {
                        stmt.sql(", ");
                    }
                    match alias {
                        // An expression that already carries brackets is
                        // treated as self-aliased and passes through.
                        Some(alias) if !expr.contains('[') => {
                            stmt.fragment(expr).sql(" AS ").ident(alias);
                        }
                        _ => {
                            stmt.fragment(expr);
                        }
                    }
                }
            }
        }
    }

    /// Pair the rendered statement with the builder binds for execution.
    pub fn query(&self, registry: Rc<dyn ModelRegistry>) -> BuildResult<Query> {
        Ok(Query::new(self.statement()?, self.binds.clone(), registry))
    }
}

/// Non-negative integer, or a string that round-trips through integer parsing
/// exactly (rejects `"07"`, `"+7"`, `" 7"`).
fn validate_count(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) if *i >= 0 => Some(*i),
        Value::Str(s) => s
            .parse::<i64>()
            .ok()
            .filter(|i| *i >= 0 && i.to_string() == *s),
        _ => None,
    }
}
