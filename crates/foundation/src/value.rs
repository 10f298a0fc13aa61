//! Runtime values
//!
//! The engine is dynamically typed at runtime: a `Value` is what an
//! expression evaluates to, what a round publishes, and what neighbors
//! exchange. Operator type checking happens at application time and surfaces
//! as typed evaluation errors in the engine, never as panics.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::DeviceUid;

/// Runtime value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Num(f64),
    Text(String),
    Tuple(Vec<Value>),
    /// Produced by neighbor constructs; one entry per aligned device.
    Field(NeighborField),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&NeighborField> {
        match self {
            Value::Field(f) => Some(f),
            _ => None,
        }
    }

    /// Name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Num(_) => "num",
            Value::Text(_) => "text",
            Value::Tuple(_) => "tuple",
            Value::Field(_) => "field",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Num(0.0)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Field(field) => {
                write!(f, "field{{")?;
                for (i, (device, value)) in field.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{device}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// The value a neighbor construct produces: one entry per device that shared
/// a value at the same alignment position, the evaluating device's own entry
/// included. Devices whose export lacks the position are simply not present —
/// they took a different branch, or are stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborField {
    local: DeviceUid,
    entries: IndexMap<DeviceUid, Value>,
}

impl NeighborField {
    /// Create a field holding only the evaluating device's own value.
    pub fn new(local: DeviceUid, own: Value) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(local, own);
        Self { local, entries }
    }

    /// Add an aligned neighbor's value.
    pub fn insert(&mut self, device: DeviceUid, value: Value) {
        self.entries.insert(device, value);
    }

    /// The evaluating device.
    pub fn local(&self) -> DeviceUid {
        self.local
    }

    /// The evaluating device's own value.
    pub fn local_value(&self) -> Option<&Value> {
        self.entries.get(&self.local)
    }

    pub fn get(&self, device: &DeviceUid) -> Option<&Value> {
        self.entries.get(device)
    }

    /// Total entries, own value included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aligned neighbors, the local device excluded.
    pub fn neighbor_count(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeviceUid, &Value)> {
        self.entries.iter().map(|(device, value)| (*device, value))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }
}
