// src/value.rs

//! Dynamic value model for recipe parameter values
//!
//! Recipe files are parsed by an external loader (TOML, YAML, JSON, ...);
//! by the time a value reaches this crate it is already deserialized. This
//! module defines the loosely-typed tree those loaders hand over, plus the
//! runtime shape tags the matcher dispatches on.
//!
//! Mappings preserve insertion order: the dependency coercion resolves
//! free-form keys in the order they appear in the recipe.

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer, Error as DeError, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// Containers nested deeper than this render as `[...]` / `{...}`
const MAX_RENDER_DEPTH: usize = 8;

/// Summaries in error payloads are cut off past this many bytes
const SUMMARY_MAX: usize = 80;

/// Runtime shape of a [`Value`]
///
/// `Sequence` is the shape of [`Value::List`] only; tuples are a distinct
/// shape, so a spec expecting a sequence rejects a tuple and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Str,
    Int,
    Float,
    Mapping,
    Sequence,
    Tuple,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Str => "string",
            TypeTag::Int => "integer",
            TypeTag::Float => "float",
            TypeTag::Mapping => "mapping",
            TypeTag::Sequence => "sequence",
            TypeTag::Tuple => "tuple",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deserialized recipe parameter value
///
/// Mapping keys are strings: every format the loader feeds us is
/// string-keyed. Key-type requirements still see each key as a `Str`
/// value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Runtime shape of this value
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Str(_) => TypeTag::Str,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::List(_) => TypeTag::Sequence,
            Value::Tuple(_) => TypeTag::Tuple,
            Value::Map(_) => TypeTag::Mapping,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Build a mapping from `(key, value)` pairs, preserving their order
    pub fn map<'a, I>(entries: I) -> Value
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Value {
        Value::List(items.into_iter().collect())
    }

    pub fn tuple<I: IntoIterator<Item = Value>>(items: I) -> Value {
        Value::Tuple(items.into_iter().collect())
    }

    /// Bounded textual rendering for error payloads and logs
    ///
    /// Never longer than ~[`SUMMARY_MAX`] bytes; nested containers past
    /// [`MAX_RENDER_DEPTH`] levels render as `[...]` / `{...}`.
    pub fn summary(&self) -> String {
        let rendered = self.to_string();
        if rendered.len() > SUMMARY_MAX {
            let mut cut = SUMMARY_MAX;
            while !rendered.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...", &rendered[..cut])
        } else {
            rendered
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::List(items) => fmt_items(f, items, "[", "]", depth),
            Value::Tuple(items) => fmt_items(f, items, "(", ")", depth),
            Value::Map(map) => {
                if depth >= MAX_RENDER_DEPTH {
                    return f.write_str("{...}");
                }
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: ")?;
                    value.fmt_at(f, depth + 1)?;
                }
                f.write_str("}")
            }
        }
    }
}

fn fmt_items(
    f: &mut fmt::Formatter<'_>,
    items: &[Value],
    open: &str,
    close: &str,
    depth: usize,
) -> fmt::Result {
    if depth >= MAX_RENDER_DEPTH {
        f.write_str(open)?;
        f.write_str("...")?;
        return f.write_str(close);
    }
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt_at(f, depth + 1)?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, 0)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::List(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut entries = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    entries.serialize_entry(key, value)?;
                }
                entries.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, sequence, or string-keyed mapping")
    }

    fn visit_str<E: DeError>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Str(v.to_string()))
    }

    fn visit_string<E: DeError>(self, v: String) -> Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_i64<E: DeError>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: DeError>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {v} is out of range")))
    }

    fn visit_f64<E: DeError>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = IndexMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}
