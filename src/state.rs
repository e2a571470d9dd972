//! Read access to prior and planned resource state, and change detection.
//!
//! The provider runtime owns the state; this module only queries it. The
//! [`ResourceState`] trait is the seam: [`JsonResourceState`] is the
//! snapshot used in practice, holding the prior and planned states as
//! `serde_json::Value`s.
//!
//! # Path resolution
//!
//! - `Field(name)` looks up `name` in an object.
//! - `Index(i)` looks up element `i` of an array.
//! - `Index(0)` against an object resolves to the object itself, so a
//!   singleton block stored as `{...}` and as `[{...}]` address the same way.
//!
//! A `null` value is equivalent to an absent one.
//!
//! # Equality
//!
//! Values are compared as state, not as JSON text: numbers by value (`3306`
//! equals `3306.0`) and `null` object members as absent. Given a [`Schema`],
//! set-typed attributes and set blocks compare as unordered collections.
//! Change events are logged by path only, so sensitive values never reach
//! the logs.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::UpdateError;
use crate::path::{AttributePath, PathSegment};
use crate::schema::{Schema, SchemaNode};
use crate::types::AttributeChange;

/// Read-only access to a resource's prior and planned state.
pub trait ResourceState {
    /// The prior and planned values at `path`. `None` means unset.
    fn get_change(&self, path: &AttributePath) -> (Option<&Value>, Option<&Value>);

    /// The planned value at `path`.
    fn get(&self, path: &AttributePath) -> Option<&Value> {
        self.get_change(path).1
    }

    /// Whether the value at `path` differs between prior and planned state.
    ///
    /// Arrays are compared in order; see [`detect_change_with_schema`] for
    /// set-aware comparison.
    fn has_change(&self, path: &AttributePath) -> bool {
        let (before, after) = self.get_change(path);
        !optional_values_equal(before, after, None)
    }
}

/// A snapshot of prior and planned state as JSON documents.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResourceState {
    prior: Value,
    planned: Value,
}

impl JsonResourceState {
    /// Create a snapshot from the prior (applied) state and the planned state.
    pub fn new(prior: Value, planned: Value) -> Self {
        Self { prior, planned }
    }

    /// A snapshot for a resource that has no prior state.
    pub fn planned_only(planned: Value) -> Self {
        Self::new(Value::Null, planned)
    }
}

impl ResourceState for JsonResourceState {
    fn get_change(&self, path: &AttributePath) -> (Option<&Value>, Option<&Value>) {
        (lookup(&self.prior, path), lookup(&self.planned, path))
    }
}

/// Resolve `path` inside `root`, treating `null` as absent.
pub fn lookup<'a>(root: &'a Value, path: &AttributePath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Field(name), Value::Object(map)) => map.get(name)?,
            (PathSegment::Index(i), Value::Array(items)) => items.get(*i)?,
            (PathSegment::Index(0), obj @ Value::Object(_)) => obj,
            _ => return None,
        };
    }
    match current {
        Value::Null => None,
        v => Some(v),
    }
}

/// Report whether the attribute at `path` changed, with its before/after
/// values.
///
/// This does not second-guess the runtime's diff: a reset to `""`, `0` or
/// `false` is a change whenever the prior value differed. Without a schema,
/// arrays are compared in order.
pub fn detect_change<S>(state: &S, path: &AttributePath) -> Option<AttributeChange>
where
    S: ResourceState + ?Sized,
{
    change_at(state, path, None)
}

/// Like [`detect_change`], comparing values the way `schema` types them.
///
/// A set attribute or set block whose members were only reordered is not
/// a change.
pub fn detect_change_with_schema<S>(
    state: &S,
    path: &AttributePath,
    schema: &Schema,
) -> Option<AttributeChange>
where
    S: ResourceState + ?Sized,
{
    change_at(state, path, schema.resolve(path))
}

fn change_at<S>(
    state: &S,
    path: &AttributePath,
    node: Option<SchemaNode<'_>>,
) -> Option<AttributeChange>
where
    S: ResourceState + ?Sized,
{
    let (before, after) = state.get_change(path);
    if optional_values_equal(before, after, node) {
        return None;
    }
    debug!(path = %path, "attribute changed");
    Some(AttributeChange::new(
        path.clone(),
        before.cloned(),
        after.cloned(),
    ))
}

fn optional_values_equal(
    a: Option<&Value>,
    b: Option<&Value>,
    node: Option<SchemaNode<'_>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => values_equal(a, b, node),
        (None, None) => true,
        _ => false,
    }
}

/// Whether two state values are equal, with `node` describing their type.
///
/// Numbers compare by value and `null` object members count as absent.
/// Arrays at a set-typed node compare as multisets; all other arrays
/// compare element by element.
pub fn values_equal(a: &Value, b: &Value, node: Option<SchemaNode<'_>>) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let element = node.and_then(SchemaNode::element);
            if node.is_some_and(SchemaNode::is_set) {
                same_members(xs, ys, element)
            } else {
                xs.iter().zip(ys).all(|(x, y)| values_equal(x, y, element))
            }
        },
        (Value::Object(xs), Value::Object(ys)) => {
            present_members(xs) == present_members(ys)
                && xs.iter().filter(|(_, v)| !v.is_null()).all(|(key, x)| {
                    ys.get(key).is_some_and(|y| {
                        values_equal(x, y, node.and_then(|n| n.field(key)))
                    })
                })
        },
        _ => a == b,
    }
}

fn present_members(map: &Map<String, Value>) -> usize {
    map.values().filter(|v| !v.is_null()).count()
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    x.as_f64() == y.as_f64()
}

fn same_members(xs: &[Value], ys: &[Value], element: Option<SchemaNode<'_>>) -> bool {
    let mut unmatched: Vec<&Value> = ys.iter().collect();
    xs.iter().all(|x| {
        match unmatched.iter().position(|y| values_equal(x, y, element)) {
            Some(i) => {
                unmatched.swap_remove(i);
                true
            },
            None => false,
        }
    })
}

/// Typed reads of planned values, used when assembling update requests.
///
/// Unset values read as the zero value of the requested type. A value of
/// the wrong type is a [`UpdateError::Validation`] naming the path.
pub trait StateReader: ResourceState {
    /// Whether the planned value at `path` is set.
    fn is_set(&self, path: &AttributePath) -> bool {
        self.get(path).is_some()
    }

    /// Read a string.
    fn get_string(&self, path: &AttributePath) -> Result<String, UpdateError> {
        match self.get(path) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v) => Err(UpdateError::type_mismatch(path, "string", value_type_name(v))),
        }
    }

    /// Read a 64-bit integer. Integral floats are accepted.
    fn get_i64(&self, path: &AttributePath) -> Result<i64, UpdateError> {
        match self.get(path) {
            None => Ok(0),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| {
                            f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64
                        })
                        .map(|f| f as i64)
                })
                .ok_or_else(|| UpdateError::type_mismatch(path, "int64", "number")),
            Some(v) => Err(UpdateError::type_mismatch(path, "int64", value_type_name(v))),
        }
    }

    /// Read a boolean.
    fn get_bool(&self, path: &AttributePath) -> Result<bool, UpdateError> {
        match self.get(path) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(v) => Err(UpdateError::type_mismatch(path, "bool", value_type_name(v))),
        }
    }

    /// Read a list (or set) of strings.
    fn get_string_list(&self, path: &AttributePath) -> Result<Vec<String>, UpdateError> {
        match self.get(path) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    v => Err(UpdateError::type_mismatch(
                        path.clone().index(i),
                        "string",
                        value_type_name(v),
                    )),
                })
                .collect(),
            Some(v) => Err(UpdateError::type_mismatch(path, "list", value_type_name(v))),
        }
    }

    /// Read a map of strings, e.g. labels.
    fn get_string_map(&self, path: &AttributePath) -> Result<HashMap<String, String>, UpdateError> {
        match self.get(path) {
            None => Ok(HashMap::new()),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => Ok((key.clone(), s.clone())),
                    v => Err(UpdateError::type_mismatch(
                        path.clone().field(key.as_str()),
                        "string",
                        value_type_name(v),
                    )),
                })
                .collect(),
            Some(v) => Err(UpdateError::type_mismatch(path, "map", value_type_name(v))),
        }
    }

    /// Number of elements in a list or set block.
    fn get_len(&self, path: &AttributePath) -> Result<usize, UpdateError> {
        match self.get(path) {
            None => Ok(0),
            Some(Value::Array(items)) => Ok(items.len()),
            Some(v) => Err(UpdateError::type_mismatch(path, "list", value_type_name(v))),
        }
    }

    /// Read a string and map it onto a protobuf enum value via `variants`.
    /// An unset value maps to `0` (the unspecified variant).
    fn get_enum(&self, path: &AttributePath, variants: &[(&str, i32)]) -> Result<i32, UpdateError> {
        let name = self.get_string(path)?;
        enum_value(path, &name, variants)
    }

    /// Read a list of strings and map each onto a protobuf enum value.
    fn get_enum_list(
        &self,
        path: &AttributePath,
        variants: &[(&str, i32)],
    ) -> Result<Vec<i32>, UpdateError> {
        self.get_string_list(path)?
            .iter()
            .enumerate()
            .map(|(i, name)| enum_value(&path.clone().index(i), name, variants))
            .collect()
    }
}

impl<S: ResourceState + ?Sized> StateReader for S {}

fn enum_value(
    path: &AttributePath,
    name: &str,
    variants: &[(&str, i32)],
) -> Result<i32, UpdateError> {
    if name.is_empty() {
        return Ok(0);
    }
    variants
        .iter()
        .find(|(variant, _)| *variant == name)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            UpdateError::Validation(format!(
                "attribute '{}': unknown value '{}', expected one of: {}",
                path,
                name,
                variants
                    .iter()
                    .map(|(v, _)| *v)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
