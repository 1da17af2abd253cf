//! Predicate selectors for rich queries.
//!
//! A `Selector` is a conjunction of field conditions over JSON documents.
//! Field paths are dotted (`"vendor.id"` reaches into nested objects).
//! Backends either evaluate a selector directly with [`Selector::matches`]
//! or render it with [`Selector::to_query`] into a CouchDB-style query
//! document.
//!
//! Comparison rules:
//! - numbers compare numerically (`1` equals `1.0`)
//! - strings compare lexicographically, bools `false < true`
//! - a missing field, or operands of different JSON types, never match
//!   (this includes `$ne`)

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A single condition on a field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
}

impl Condition {
    /// The Mango operator name for this condition.
    pub fn operator(&self) -> &'static str {
        match self {
            Condition::Eq(_) => "$eq",
            Condition::Ne(_) => "$ne",
            Condition::Gt(_) => "$gt",
            Condition::Gte(_) => "$gte",
            Condition::Lt(_) => "$lt",
            Condition::Lte(_) => "$lte",
            Condition::In(_) => "$in",
        }
    }

    fn operand(&self) -> Value {
        match self {
            Condition::Eq(v)
            | Condition::Ne(v)
            | Condition::Gt(v)
            | Condition::Gte(v)
            | Condition::Lt(v)
            | Condition::Lte(v) => v.clone(),
            Condition::In(vs) => Value::Array(vs.clone()),
        }
    }

    /// Evaluate this condition against a field value (`None` = field absent).
    pub fn test(&self, actual: Option<&Value>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self {
            Condition::Eq(v) => compare(actual, v) == Some(Ordering::Equal),
            Condition::Ne(v) => matches!(
                compare(actual, v),
                Some(Ordering::Less) | Some(Ordering::Greater)
            ),
            Condition::Gt(v) => compare(actual, v) == Some(Ordering::Greater),
            Condition::Gte(v) => matches!(
                compare(actual, v),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            Condition::Lt(v) => compare(actual, v) == Some(Ordering::Less),
            Condition::Lte(v) => matches!(
                compare(actual, v),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            Condition::In(vs) => vs
                .iter()
                .any(|v| compare(actual, v) == Some(Ordering::Equal)),
        }
    }
}

/// Order two scalar JSON values of the same type; `None` if incomparable.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            if let (Some(l), Some(r)) = (l.as_i64(), r.as_i64()) {
                return Some(l.cmp(&r));
            }
            l.as_f64()?.partial_cmp(&r.as_f64()?)
        }
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Resolve a dotted field path inside a JSON document.
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

/// A conjunction of field conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    fields: BTreeMap<String, Vec<Condition>>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition on `path`. Conditions on the same path are ANDed.
    pub fn with(mut self, path: impl Into<String>, condition: Condition) -> Self {
        self.fields.entry(path.into()).or_default().push(condition);
        self
    }

    pub fn eq(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Eq(value.into()))
    }

    pub fn ne(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Ne(value.into()))
    }

    pub fn gt(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Gt(value.into()))
    }

    pub fn gte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Gte(value.into()))
    }

    pub fn lt(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Lt(value.into()))
    }

    pub fn lte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Lte(value.into()))
    }

    pub fn one_of<V: Into<Value>>(
        self,
        path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.with(
            path,
            Condition::In(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every condition holds for `doc`. The empty selector matches everything.
    pub fn matches(&self, doc: &Value) -> bool {
        self.fields.iter().all(|(path, conditions)| {
            let actual = lookup(doc, path);
            conditions.iter().all(|c| c.test(actual))
        })
    }

    /// Render as a CouchDB/Mango query document: `{"selector": {...}}`.
    ///
    /// A lone `$eq` is written as the bare value; anything else becomes an
    /// operator object. Repeated operators on one path are wrapped in `$and`.
    pub fn to_query(&self) -> Value {
        let mut selector = Map::new();
        for (path, conditions) in &self.fields {
            let rendered = match conditions.as_slice() {
                [Condition::Eq(v)] => v.clone(),
                _ => render_operators(conditions),
            };
            selector.insert(path.clone(), rendered);
        }
        let mut query = Map::new();
        query.insert("selector".to_string(), Value::Object(selector));
        Value::Object(query)
    }
}

fn render_operators(conditions: &[Condition]) -> Value {
    let mut ops = Map::new();
    let mut repeated = false;
    for c in conditions {
        if ops.contains_key(c.operator()) {
            repeated = true;
            break;
        }
        ops.insert(c.operator().to_string(), c.operand());
    }
    if !repeated {
        return Value::Object(ops);
    }
    let clauses = conditions
        .iter()
        .map(|c| {
            let mut op = Map::new();
            op.insert(c.operator().to_string(), c.operand());
            Value::Object(op)
        })
        .collect();
    let mut and = Map::new();
    and.insert("$and".to_string(), Value::Array(clauses));
    Value::Object(and)
}
