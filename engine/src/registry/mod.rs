//! Functor registry — node kinds and their computation callables.
//!
//! Node kind implementations describe themselves with a [`KindDefinition`]
//! and register it here before evaluation begins. The graph stores only the
//! kind string; the registry is the single lookup point turning that string
//! into sockets and a callable.

pub mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::EngineError;
use crate::evaluation::context::FrameContext;
use crate::model::node::Node;
use crate::model::socket::{InputSocket, InputSource, OutputSocket};
use crate::model::value::{Data, Value};

/// The computation attached to a node kind.
///
/// Receives the resolved input payloads in declaration order and the current
/// frame context, and returns one [`Value`] per declared output, in
/// declaration order. Returning `Value::empty()` for an output is allowed;
/// reading that output later fails with `MissingResult`.
pub type Functor =
    Arc<dyn Fn(&[Data], &FrameContext) -> Result<Vec<Value>, EngineError> + Send + Sync>;

/// Coarse grouping for browsing kinds in an editor UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindCategory {
    Value,
    Math,
    Logic,
    Time,
    Utility,
    Custom,
}

impl fmt::Display for KindCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KindCategory::Value => "Value",
            KindCategory::Math => "Math",
            KindCategory::Logic => "Logic",
            KindCategory::Time => "Time",
            KindCategory::Utility => "Utility",
            KindCategory::Custom => "Custom",
        };
        write!(f, "{name}")
    }
}

/// Declared socket on a kind, with an optional default literal for inputs.
#[derive(Clone, Debug)]
pub struct SocketSpec {
    pub name: String,
    pub default: Option<Data>,
}

impl SocketSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default: None,
        }
    }

    pub fn with_default(name: &str, default: Data) -> Self {
        Self {
            name: name.to_string(),
            default: Some(default),
        }
    }
}

/// Everything the engine knows about one node kind: identity, socket
/// layout, and the functor.
#[derive(Clone)]
pub struct KindDefinition {
    pub kind: String,
    pub display_name: String,
    pub category: KindCategory,
    pub description: String,
    pub inputs: Vec<SocketSpec>,
    pub outputs: Vec<SocketSpec>,
    functor: Functor,
}

impl fmt::Debug for KindDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindDefinition")
            .field("kind", &self.kind)
            .field("display_name", &self.display_name)
            .field("category", &self.category)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl KindDefinition {
    pub fn new(
        kind: &str,
        display_name: &str,
        category: KindCategory,
        functor: Functor,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            display_name: display_name.to_string(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            functor,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<SocketSpec>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<SocketSpec>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Structural checks applied at registration time.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.kind.is_empty() {
            return Err(EngineError::InvalidKind(
                "kind string must not be empty".to_string(),
            ));
        }
        if self.outputs.is_empty() {
            return Err(EngineError::InvalidKind(format!(
                "kind '{}' declares no outputs",
                self.kind
            )));
        }
        for (label, side) in [("input", &self.inputs), ("output", &self.outputs)] {
            let mut names = std::collections::HashSet::new();
            for spec in side.iter() {
                if !names.insert(spec.name.as_str()) {
                    return Err(EngineError::InvalidKind(format!(
                        "kind '{}' declares duplicate {label} socket '{}'",
                        self.kind, spec.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stamp out a node of this kind. Inputs with a declared default start
    /// bound to that literal; defaultless inputs start unconnected.
    pub fn instantiate(&self, name: &str) -> Node {
        let inputs = self
            .inputs
            .iter()
            .map(|spec| {
                let source = spec.default.clone().map(InputSource::Literal);
                InputSocket::new(&spec.name, source)
            })
            .collect();
        let outputs = self
            .outputs
            .iter()
            .map(|spec| OutputSocket::new(&spec.name))
            .collect();
        Node::new(name, &self.kind, inputs, outputs)
    }

    /// Run the functor and check the result arity against the declared
    /// outputs.
    pub fn invoke(
        &self,
        inputs: &[Data],
        ctx: &FrameContext,
    ) -> Result<Vec<Value>, EngineError> {
        let results = (self.functor)(inputs, ctx)?;
        if results.len() != self.outputs.len() {
            return Err(EngineError::ArityMismatch {
                kind: self.kind.clone(),
                expected: self.outputs.len(),
                got: results.len(),
            });
        }
        Ok(results)
    }
}

/// String-keyed table of node kinds.
#[derive(Clone, Debug, Default)]
pub struct FunctorRegistry {
    kinds: HashMap<String, KindDefinition>,
}

impl FunctorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in kinds.
    pub fn with_builtins() -> Result<Self, EngineError> {
        let mut registry = Self::new();
        builtin::register_builtin_kinds(&mut registry)?;
        Ok(registry)
    }

    /// Register a kind. Re-registering an existing kind replaces it and
    /// logs a warning, so plugins can override built-ins deliberately.
    pub fn register(&mut self, definition: KindDefinition) -> Result<(), EngineError> {
        definition.validate()?;
        let kind = definition.kind.clone();
        if self.kinds.insert(kind.clone(), definition).is_some() {
            warn!("registry: kind '{kind}' re-registered, previous definition replaced");
        } else {
            debug!("registry: registered kind '{kind}'");
        }
        Ok(())
    }

    /// Register a kind, failing if the kind string is already taken.
    pub fn try_register(&mut self, definition: KindDefinition) -> Result<(), EngineError> {
        if self.kinds.contains_key(&definition.kind) {
            return Err(EngineError::DuplicateKind(definition.kind));
        }
        self.register(definition)
    }

    pub fn lookup(&self, kind: &str) -> Result<&KindDefinition, EngineError> {
        self.kinds
            .get(kind)
            .ok_or_else(|| EngineError::UnknownKind(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered kind strings, sorted for stable listings.
    pub fn kind_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
