//! Graph — the name-keyed arena of nodes and the authoring surface.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::error::EngineError;
use crate::registry::FunctorRegistry;

use super::graph_analysis;
use super::node::Node;
use super::socket::{InputSource, LinkRef};
use super::value::Data;

/// A directed graph of nodes, owned by unique name.
///
/// The graph is the arena links are resolved through: an input socket
/// stores `(node name, socket name)` and the graph looks the producer up at
/// evaluation time. This is the construction interface an external
/// loader/deserializer builds against; the engine itself parses no file
/// format.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Graph {
    pub(crate) nodes: BTreeMap<String, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node of a registered kind, stamping sockets from the kind
    /// definition.
    pub fn add_node(
        &mut self,
        name: &str,
        kind: &str,
        registry: &FunctorRegistry,
    ) -> Result<(), EngineError> {
        if self.nodes.contains_key(name) {
            return Err(EngineError::DuplicateNode(name.to_string()));
        }
        let definition = registry.lookup(kind)?;
        debug!("graph: adding node '{name}' of kind '{kind}'");
        self.nodes.insert(name.to_string(), definition.instantiate(name));
        Ok(())
    }

    /// Remove a node. Links held by other nodes are not rewritten; resolving
    /// a stale link fails with `UnknownNode`.
    pub fn remove_node(&mut self, name: &str) -> Option<Node> {
        self.nodes.remove(name)
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn get_node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Connect an output socket to an input socket.
    ///
    /// Validated before anything is rewritten: both endpoints must exist,
    /// self-connections and cycles are rejected. An input holds at most one
    /// source, so connecting replaces any previous literal or link. The
    /// target node is marked dirty so it recomputes on the next pull.
    pub fn connect(
        &mut self,
        from_node: &str,
        from_socket: &str,
        to_node: &str,
        to_socket: &str,
    ) -> Result<(), EngineError> {
        graph_analysis::validate_link(self, from_node, from_socket, to_node, to_socket)?;

        let target = self
            .nodes
            .get_mut(to_node)
            .ok_or_else(|| EngineError::UnknownNode(to_node.to_string()))?;
        target.input_mut(to_socket)?.source =
            Some(InputSource::Link(LinkRef::new(from_node, from_socket)));
        target.mark_dirty();
        debug!("graph: connected {from_node}.{from_socket} -> {to_node}.{to_socket}");
        Ok(())
    }

    /// Bind an input socket to a literal value.
    pub fn set_literal(
        &mut self,
        node: &str,
        socket: &str,
        data: Data,
    ) -> Result<(), EngineError> {
        let target = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| EngineError::UnknownNode(node.to_string()))?;
        target.input_mut(socket)?.source = Some(InputSource::Literal(data));
        target.mark_dirty();
        Ok(())
    }

    /// Clear a node's cached outputs, forcing one recompute on next pull.
    pub fn invalidate(&mut self, name: &str) -> Result<(), EngineError> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownNode(name.to_string()))?
            .invalidate();
        Ok(())
    }

    /// Textual diagnostic dump of the whole graph.
    pub fn dump(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
