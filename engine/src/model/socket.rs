//! Sockets — named input and output slots on a node.

use serde::Serialize;

use super::value::{Data, Value};

/// Reference to an output socket on another node, by name.
///
/// Nodes never hold pointers to each other; links are resolved through the
/// graph at evaluation time so the surrounding editor can rebuild or reload
/// graphs freely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkRef {
    pub node: String,
    pub socket: String,
}

impl LinkRef {
    pub fn new(node: &str, socket: &str) -> Self {
        Self {
            node: node.to_string(),
            socket: socket.to_string(),
        }
    }
}

/// Where an input socket gets its value from.
#[derive(Clone, Debug, Serialize)]
pub enum InputSource {
    /// Literal value embedded at authoring time.
    Literal(Data),
    /// Connection to another node's output socket.
    Link(LinkRef),
}

/// Named input slot on a node.
#[derive(Clone, Debug, Serialize)]
pub struct InputSocket {
    pub name: String,
    /// `None` for an input declared without a default that has not been
    /// connected yet. Resolving such an input is an error, never a silent
    /// default.
    pub source: Option<InputSource>,
}

impl InputSocket {
    pub fn new(name: &str, source: Option<InputSource>) -> Self {
        Self {
            name: name.to_string(),
            source,
        }
    }
}

/// Named output slot on a node, holding the cached result of the last
/// recompute.
#[derive(Clone, Debug, Serialize)]
pub struct OutputSocket {
    pub name: String,
    pub result: Value,
}

impl OutputSocket {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            result: Value::empty(),
        }
    }
}
