//! The recursive resolver — pull-based, memoized evaluation over the graph.
//!
//! Resolution threads one OR-accumulated `changed` flag through the
//! dependency chain. A node sets it only when this pull caused a fresh
//! recompute of that node; literals never touch it. Staleness is exactly
//! that flag plus the per-node dirty bit, never a value diff or timestamp.
//!
//! Resolution lives on [`Graph`] because links are names resolved through
//! the arena: a node cannot pull its own inputs without its owner.

use log::trace;

use crate::error::EngineError;
use crate::model::graph::Graph;
use crate::model::socket::InputSource;
use crate::model::value::{Data, Value};
use crate::registry::FunctorRegistry;
use crate::util::timing::measure_debug;

use super::context::FrameContext;

impl Graph {
    /// Resolve an input source.
    ///
    /// A literal returns immediately and leaves `changed` untouched; a link
    /// delegates to [`Graph::resolve_output`] on the producing node,
    /// forwarding the accumulator.
    pub fn resolve_value(
        &mut self,
        source: &InputSource,
        registry: &FunctorRegistry,
        ctx: &FrameContext,
        changed: &mut bool,
    ) -> Result<Value, EngineError> {
        match source {
            InputSource::Literal(data) => Ok(Value::holding(data.clone())),
            InputSource::Link(link) => {
                self.resolve_output(&link.node, &link.socket, registry, ctx, changed)
            }
        }
    }

    /// Resolve a named output socket, recomputing the node if stale.
    ///
    /// Sets `*changed = true` iff this call caused a fresh recompute of the
    /// node; otherwise the accumulator is left alone. Callers initialize the
    /// flag to `false` once at the top of a pull and OR-accumulate across
    /// the chain.
    pub fn resolve_output(
        &mut self,
        node: &str,
        socket: &str,
        registry: &FunctorRegistry,
        ctx: &FrameContext,
        changed: &mut bool,
    ) -> Result<Value, EngineError> {
        // Socket existence is checked before any recompute runs.
        self.nodes
            .get(node)
            .ok_or_else(|| EngineError::UnknownNode(node.to_string()))?
            .output_index(socket)?;

        if self.apply_func(node, registry, ctx)? {
            *changed = true;
        }

        self.nodes
            .get(node)
            .ok_or_else(|| EngineError::UnknownNode(node.to_string()))?
            .output_value(socket)
    }

    /// The recompute step. Returns whether the functor actually ran.
    ///
    /// Inputs are resolved first, OR-accumulating their change status; the
    /// node then recomputes unless no input changed, it is not dirty, and
    /// every output is already cached. The skip path is what guarantees
    /// at-most-one functor invocation per node between invalidations, which
    /// matters because functors may carry non-idempotent native side
    /// effects.
    fn apply_func(
        &mut self,
        name: &str,
        registry: &FunctorRegistry,
        ctx: &FrameContext,
    ) -> Result<bool, EngineError> {
        // Snapshot the input layout so resolution can recurse through the
        // arena without holding a borrow of this node.
        let (kind, sources) = {
            let node = self
                .nodes
                .get(name)
                .ok_or_else(|| EngineError::UnknownNode(name.to_string()))?;
            let sources: Vec<(String, Option<InputSource>)> = node
                .inputs
                .iter()
                .map(|input| (input.name.clone(), input.source.clone()))
                .collect();
            (node.kind.clone(), sources)
        };

        let mut inputs_changed = false;
        let mut resolved: Vec<(String, Value)> = Vec::with_capacity(sources.len());
        for (socket, source) in sources {
            let value = match &source {
                Some(source) => {
                    self.resolve_value(source, registry, ctx, &mut inputs_changed)?
                }
                None => Value::empty(),
            };
            resolved.push((socket, value));
        }

        let (dirty, cached) = {
            let node = self
                .nodes
                .get(name)
                .ok_or_else(|| EngineError::UnknownNode(name.to_string()))?;
            (node.is_dirty(), node.all_outputs_cached())
        };
        if !inputs_changed && !dirty && cached {
            trace!("resolve: '{name}' up to date, skipping");
            return Ok(false);
        }

        let mut args: Vec<Data> = Vec::with_capacity(resolved.len());
        for (socket, value) in resolved {
            let data = value.into_data().ok_or_else(|| {
                EngineError::EmptyValue(format!("input '{socket}' on node '{name}'"))
            })?;
            args.push(data);
        }

        let definition = registry.lookup(&kind)?;
        trace!(
            "resolve: recomputing '{name}' (kind '{kind}') at frame {} substep {}",
            ctx.frame, ctx.substep
        );
        let results = definition.invoke(&args, ctx)?;

        self.nodes
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownNode(name.to_string()))?
            .set_outputs(results);
        Ok(true)
    }

    /// Force evaluation of each named node through its designated view
    /// output. Returns the OR of change flags across all pulls. This is the
    /// driver's per-substep entry point; nodes not reachable from `names`
    /// are never evaluated.
    pub fn apply_nodes(
        &mut self,
        names: &[impl AsRef<str>],
        registry: &FunctorRegistry,
        ctx: &FrameContext,
    ) -> Result<bool, EngineError> {
        measure_debug("apply_nodes", || {
            let mut changed = false;
            for name in names {
                let name = name.as_ref();
                let view = self
                    .nodes
                    .get(name)
                    .ok_or_else(|| EngineError::UnknownNode(name.to_string()))?
                    .view_output()
                    .ok_or_else(|| {
                        EngineError::InvalidKind(format!("node '{name}' declares no outputs"))
                    })?
                    .to_string();
                self.resolve_output(name, &view, registry, ctx, &mut changed)?;
            }
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::model::socket::LinkRef;
    use crate::registry::{KindCategory, KindDefinition, SocketSpec};

    use super::*;

    fn setup_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Registry with a counting constant source and a counting doubler.
    /// Returns the registry plus the two call counters.
    fn setup_counted_registry() -> (FunctorRegistry, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        setup_logging();
        let const_calls = Arc::new(AtomicUsize::new(0));
        let double_calls = Arc::new(AtomicUsize::new(0));

        let mut registry = FunctorRegistry::new();
        let counter = Arc::clone(&const_calls);
        registry
            .register(
                KindDefinition::new(
                    "count.const",
                    "Counting Constant",
                    KindCategory::Value,
                    Arc::new(move |_inputs, _ctx| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(vec![Value::holding(Data::Float(5.0))])
                    }),
                )
                .with_outputs(vec![SocketSpec::new("out")]),
            )
            .unwrap();

        let counter = Arc::clone(&double_calls);
        registry
            .register(
                KindDefinition::new(
                    "count.double",
                    "Counting Double",
                    KindCategory::Math,
                    Arc::new(move |inputs: &[Data], _ctx: &FrameContext| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        let v = inputs[0]
                            .as_float()
                            .ok_or_else(|| EngineError::functor("expected a number"))?;
                        Ok(vec![Value::holding(Data::Float(v * 2.0))])
                    }),
                )
                .with_inputs(vec![SocketSpec::new("in")])
                .with_outputs(vec![SocketSpec::new("out")]),
            )
            .unwrap();

        (registry, const_calls, double_calls)
    }

    fn pull(
        graph: &mut Graph,
        registry: &FunctorRegistry,
        node: &str,
        socket: &str,
    ) -> (f64, bool) {
        let mut changed = false;
        let value = graph
            .resolve_output(node, socket, registry, &FrameContext::start(), &mut changed)
            .unwrap();
        (value.get().unwrap().as_float().unwrap(), changed)
    }

    #[test]
    fn test_const_double_scenario() {
        let (registry, const_calls, double_calls) = setup_counted_registry();
        let mut graph = Graph::new();
        graph.add_node("const1", "count.const", &registry).unwrap();
        graph.add_node("double1", "count.double", &registry).unwrap();
        graph.connect("const1", "out", "double1", "in").unwrap();

        let (value, changed) = pull(&mut graph, &registry, "double1", "out");
        assert_eq!(value, 10.0);
        assert!(changed);

        // Second pull is fully cached: same value, accumulator untouched,
        // no extra functor calls.
        let (value, changed) = pull(&mut graph, &registry, "double1", "out");
        assert_eq!(value, 10.0);
        assert!(!changed);
        assert_eq!(const_calls.load(Ordering::SeqCst), 1);
        assert_eq!(double_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chain_propagation_after_upstream_invalidation() {
        let (registry, const_calls, double_calls) = setup_counted_registry();
        let mut graph = Graph::new();
        graph.add_node("a", "count.const", &registry).unwrap();
        graph.add_node("b", "count.double", &registry).unwrap();
        graph.add_node("c", "count.double", &registry).unwrap();
        graph.connect("a", "out", "b", "in").unwrap();
        graph.connect("b", "out", "c", "in").unwrap();

        let (value, _) = pull(&mut graph, &registry, "c", "out");
        assert_eq!(value, 20.0);
        assert_eq!(const_calls.load(Ordering::SeqCst), 1);
        assert_eq!(double_calls.load(Ordering::SeqCst), 2);

        // Invalidating only the head reruns the whole chain on the next
        // pull; dependents discover the staleness through the changed flag.
        graph.invalidate("a").unwrap();
        let (value, changed) = pull(&mut graph, &registry, "c", "out");
        assert_eq!(value, 20.0);
        assert!(changed);
        assert_eq!(const_calls.load(Ordering::SeqCst), 2);
        assert_eq!(double_calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_diamond_recomputes_shared_upstream_once() {
        let (mut registry, const_calls, _) = setup_counted_registry();
        registry
            .register(
                KindDefinition::new(
                    "count.sum",
                    "Sum",
                    KindCategory::Math,
                    Arc::new(|inputs: &[Data], _ctx: &FrameContext| {
                        let a = inputs[0].as_float().unwrap_or(0.0);
                        let b = inputs[1].as_float().unwrap_or(0.0);
                        Ok(vec![Value::holding(Data::Float(a + b))])
                    }),
                )
                .with_inputs(vec![SocketSpec::new("a"), SocketSpec::new("b")])
                .with_outputs(vec![SocketSpec::new("out")]),
            )
            .unwrap();

        let mut graph = Graph::new();
        graph.add_node("a", "count.const", &registry).unwrap();
        graph.add_node("b", "count.double", &registry).unwrap();
        graph.add_node("c", "count.double", &registry).unwrap();
        graph.add_node("d", "count.sum", &registry).unwrap();
        graph.connect("a", "out", "b", "in").unwrap();
        graph.connect("a", "out", "c", "in").unwrap();
        graph.connect("b", "out", "d", "a").unwrap();
        graph.connect("c", "out", "d", "b").unwrap();

        let (value, changed) = pull(&mut graph, &registry, "d", "out");
        assert_eq!(value, 20.0);
        assert!(changed);
        // Both branches pull 'a', but only the first pull recomputes it.
        assert_eq!(const_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_literal_short_circuit() {
        let (registry, _, double_calls) = setup_counted_registry();
        let mut graph = Graph::new();
        graph.add_node("double1", "count.double", &registry).unwrap();
        graph.set_literal("double1", "in", Data::Float(3.0)).unwrap();

        let (value, changed) = pull(&mut graph, &registry, "double1", "out");
        assert_eq!(value, 6.0);
        assert!(changed);

        // A literal input never reports change, so the cached result stands.
        let (value, changed) = pull(&mut graph, &registry, "double1", "out");
        assert_eq!(value, 6.0);
        assert!(!changed);
        assert_eq!(double_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_input_invalidation_forces_one_recompute() {
        let (registry, const_calls, _) = setup_counted_registry();
        let mut graph = Graph::new();
        graph.add_node("const1", "count.const", &registry).unwrap();

        pull(&mut graph, &registry, "const1", "out");
        pull(&mut graph, &registry, "const1", "out");
        assert_eq!(const_calls.load(Ordering::SeqCst), 1);

        // A zero-input node never observes input change; explicit
        // invalidation must still force exactly one recompute.
        graph.invalidate("const1").unwrap();
        let (_, changed) = pull(&mut graph, &registry, "const1", "out");
        assert!(changed);
        pull(&mut graph, &registry, "const1", "out");
        assert_eq!(const_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_link_fails_not_defaults() {
        let (registry, _, _) = setup_counted_registry();
        let mut graph = Graph::new();
        graph.add_node("double1", "count.double", &registry).unwrap();

        // A stale link to a removed or never-added node fails at
        // resolution, never silently defaulting.
        let ghost = InputSource::Link(LinkRef::new("ghost", "out"));
        graph.get_node_mut("double1").unwrap().inputs[0].source = Some(ghost);

        let mut changed = false;
        let err = graph
            .resolve_output("double1", "out", &registry, &FrameContext::start(), &mut changed)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode(name) if name == "ghost"));
    }

    #[test]
    fn test_unconnected_defaultless_input_fails_empty() {
        let (registry, _, double_calls) = setup_counted_registry();
        let mut graph = Graph::new();
        graph.add_node("double1", "count.double", &registry).unwrap();

        let mut changed = false;
        let err = graph
            .resolve_output("double1", "out", &registry, &FrameContext::start(), &mut changed)
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyValue(_)));
        assert_eq!(double_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_arity_mismatch_surfaces() {
        setup_logging();
        let mut registry = FunctorRegistry::new();
        registry
            .register(
                KindDefinition::new(
                    "bad.short",
                    "Short",
                    KindCategory::Utility,
                    Arc::new(|_, _| Ok(vec![Value::holding(Data::Float(1.0))])),
                )
                .with_outputs(vec![SocketSpec::new("first"), SocketSpec::new("second")]),
            )
            .unwrap();

        let mut graph = Graph::new();
        graph.add_node("bad1", "bad.short", &registry).unwrap();

        let mut changed = false;
        let err = graph
            .resolve_output("bad1", "first", &registry, &FrameContext::start(), &mut changed)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ArityMismatch { expected: 2, got: 1, .. }
        ));
    }

    #[test]
    fn test_declared_but_unpopulated_output_is_missing_result() {
        setup_logging();
        let mut registry = FunctorRegistry::new();
        registry
            .register(
                KindDefinition::new(
                    "bad.hollow",
                    "Hollow",
                    KindCategory::Utility,
                    Arc::new(|_, _| Ok(vec![Value::empty()])),
                )
                .with_outputs(vec![SocketSpec::new("out")]),
            )
            .unwrap();

        let mut graph = Graph::new();
        graph.add_node("hollow1", "bad.hollow", &registry).unwrap();

        let mut changed = false;
        let err = graph
            .resolve_output("hollow1", "out", &registry, &FrameContext::start(), &mut changed)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingResult { .. }));
    }

    #[test]
    fn test_resolve_unknown_socket_before_recompute() {
        let (registry, const_calls, _) = setup_counted_registry();
        let mut graph = Graph::new();
        graph.add_node("const1", "count.const", &registry).unwrap();

        let mut changed = false;
        let err = graph
            .resolve_output("const1", "nope", &registry, &FrameContext::start(), &mut changed)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownSocket { .. }));
        // The bad socket name is rejected before the functor runs.
        assert_eq!(const_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_apply_nodes_reports_change_status() {
        let (registry, _, _) = setup_counted_registry();
        let mut graph = Graph::new();
        graph.add_node("const1", "count.const", &registry).unwrap();
        graph.add_node("double1", "count.double", &registry).unwrap();
        graph.connect("const1", "out", "double1", "in").unwrap();

        let ctx = FrameContext::start();
        assert!(graph.apply_nodes(&["double1"], &registry, &ctx).unwrap());
        assert!(!graph.apply_nodes(&["double1"], &registry, &ctx).unwrap());

        let err = graph.apply_nodes(&["ghost"], &registry, &ctx).unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode(_)));
    }
}
