//! Data and Value — the payloads flowing through sockets.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::EngineError;

/// A heterogeneous payload produced by node computation.
///
/// Each variant carries the concrete runtime value for a socket. Cloning is
/// cheap; large native payloads go through the `Opaque` variant behind an
/// `Arc`. Equality is deliberately not defined — the engine tracks change
/// through an explicit flag during resolution, never by diffing values.
#[derive(Clone)]
pub enum Data {
    /// Floating-point scalar.
    Float(f64),
    /// Integer value.
    Integer(i64),
    /// Boolean.
    Boolean(bool),
    /// Text string.
    Text(String),
    /// List of values.
    List(Vec<Data>),
    /// Native payload owned by a node kind (simulation state, mesh data).
    /// The engine never inspects it.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Data {
    /// Wrap a native payload.
    pub fn opaque<T: Any + Send + Sync>(payload: T) -> Self {
        Data::Opaque(Arc::new(payload))
    }

    /// Extract as float; integers coerce.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Data::Float(v) => Some(*v),
            Data::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Data::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Data::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Data::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Data]> {
        match self {
            Data::List(items) => Some(items),
            _ => None,
        }
    }

    /// Downcast an opaque payload to a concrete type.
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Data::Opaque(payload) => payload.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Float(v) => write!(f, "Float({v})"),
            Data::Integer(v) => write!(f, "Integer({v})"),
            Data::Boolean(v) => write!(f, "Boolean({v})"),
            Data::Text(s) => write!(f, "Text({s:?})"),
            Data::List(items) => f.debug_tuple("List").field(items).finish(),
            Data::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

// Diagnostic serialization only; opaque payloads render as a placeholder.
impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Float(v) => serializer.serialize_f64(*v),
            Data::Integer(v) => serializer.serialize_i64(*v),
            Data::Boolean(v) => serializer.serialize_bool(*v),
            Data::Text(s) => serializer.serialize_str(s),
            Data::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Data::Opaque(_) => serializer.serialize_str("<opaque>"),
        }
    }
}

/// Optional container for a computed result.
///
/// A value is either absent (never computed, or invalidated) or holds
/// exactly one `Data`. There is no implicit conversion between absence and
/// a zero value.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct Value {
    data: Option<Data>,
}

impl Value {
    pub fn empty() -> Self {
        Self { data: None }
    }

    pub fn holding(data: Data) -> Self {
        Self { data: Some(data) }
    }

    pub fn has_value(&self) -> bool {
        self.data.is_some()
    }

    /// Borrow the contained data, failing if the value is absent.
    pub fn get(&self) -> Result<&Data, EngineError> {
        self.data
            .as_ref()
            .ok_or_else(|| EngineError::EmptyValue("value has not been computed".to_string()))
    }

    pub fn into_data(self) -> Option<Data> {
        self.data
    }

    pub fn set(&mut self, data: Data) {
        self.data = Some(data);
    }

    /// Clear to absent.
    pub fn reset(&mut self) {
        self.data = None;
    }
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        Value::holding(data)
    }
}
