//! Scene — a named collection of graphs with one current graph.

use std::collections::BTreeMap;

use log::info;
use serde::Serialize;

use crate::error::EngineError;

use super::graph::Graph;

/// Named collection of graphs; the embedder evaluates whichever graph is
/// current (via `current_graph_mut`).
///
/// Inactive graphs keep their caches and dirty flags, so switching back
/// resumes without recomputation.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Scene {
    graphs: BTreeMap<String, Graph>,
    current: Option<String>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a graph under a name, replacing any graph already stored
    /// there. The first graph added becomes current.
    pub fn add_graph(&mut self, name: &str, graph: Graph) {
        if self.current.is_none() {
            self.current = Some(name.to_string());
        }
        self.graphs.insert(name.to_string(), graph);
    }

    /// Make a stored graph the current one.
    pub fn switch_graph(&mut self, name: &str) -> Result<(), EngineError> {
        if !self.graphs.contains_key(name) {
            return Err(EngineError::UnknownGraph(name.to_string()));
        }
        info!("scene: switching current graph to '{name}'");
        self.current = Some(name.to_string());
        Ok(())
    }

    pub fn current_graph(&self) -> Option<&Graph> {
        self.graphs.get(self.current.as_deref()?)
    }

    pub fn current_graph_mut(&mut self) -> Option<&mut Graph> {
        let name = self.current.clone()?;
        self.graphs.get_mut(&name)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn get_graph(&self, name: &str) -> Option<&Graph> {
        self.graphs.get(name)
    }

    pub fn get_graph_mut(&mut self, name: &str) -> Option<&mut Graph> {
        self.graphs.get_mut(name)
    }

    pub fn graph_names(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}
