//! Node — a unit of computation with named sockets and a kind.

use serde::Serialize;

use crate::error::EngineError;

use super::socket::{InputSocket, OutputSocket};
use super::value::Value;

/// A node in the dataflow graph.
///
/// Holds identity (name, kind), its sockets, and the dirty flag. Output
/// sockets are mutated only by the recompute step and by `invalidate`;
/// input sources are rewritten only by graph-authoring calls.
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    /// Unique within the owning graph.
    pub name: String,
    /// Kind string selecting the functor in the registry.
    pub kind: String,
    pub inputs: Vec<InputSocket>,
    pub outputs: Vec<OutputSocket>,
    /// Set on construction and by `invalidate`, cleared by a successful
    /// recompute. Forces recomputation on the next pull even when no input
    /// reports a change.
    dirty: bool,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        inputs: Vec<InputSocket>,
        outputs: Vec<OutputSocket>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            inputs,
            outputs,
            dirty: true,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Index of a declared output socket.
    pub fn output_index(&self, socket: &str) -> Result<usize, EngineError> {
        self.outputs
            .iter()
            .position(|o| o.name == socket)
            .ok_or_else(|| EngineError::unknown_socket(&self.name, socket))
    }

    /// Cached read of an output socket.
    ///
    /// Fails with `MissingResult` if the socket holds no value — after a
    /// recompute this means the functor declared the output but did not
    /// populate it.
    pub fn output_value(&self, socket: &str) -> Result<Value, EngineError> {
        let index = self.output_index(socket)?;
        let value = self.outputs[index].result.clone();
        if !value.has_value() {
            return Err(EngineError::MissingResult {
                node: self.name.clone(),
                socket: socket.to_string(),
            });
        }
        Ok(value)
    }

    /// Name of the designated output pulled when this node is forced as a
    /// whole (the first declared output).
    pub fn view_output(&self) -> Option<&str> {
        self.outputs.first().map(|o| o.name.as_str())
    }

    pub fn input_mut(&mut self, socket: &str) -> Result<&mut InputSocket, EngineError> {
        let name = self.name.clone();
        self.inputs
            .iter_mut()
            .find(|i| i.name == socket)
            .ok_or_else(|| EngineError::unknown_socket(&name, socket))
    }

    /// Clear all output sockets to empty and mark the node dirty.
    ///
    /// Does not touch dependents; they discover staleness lazily on the
    /// next resolution pull. Idempotent.
    pub fn invalidate(&mut self) {
        for output in &mut self.outputs {
            output.result.reset();
        }
        self.dirty = true;
    }

    pub(crate) fn all_outputs_cached(&self) -> bool {
        self.outputs.iter().all(|o| o.result.has_value())
    }

    /// Write recompute results into the output sockets positionally.
    /// The caller has already checked arity.
    pub(crate) fn set_outputs(&mut self, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.outputs.len());
        for (socket, value) in self.outputs.iter_mut().zip(values) {
            socket.result = value;
        }
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Textual diagnostic dump. Not part of the evaluation contract.
    pub fn dump(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
