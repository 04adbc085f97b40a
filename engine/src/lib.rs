//! Dataflow graph evaluation engine.
//!
//! A pull-based, memoized, lazy evaluator over a directed graph of nodes
//! with named input and output sockets. Nodes reference each other by name,
//! never by pointer, so graphs can be rebuilt or reloaded by the surrounding
//! editor at any time. Per-kind computation is dispatched through a functor
//! registry populated by node-kind implementations before evaluation begins.
//!
//! Results are cached in node-owned output sockets until explicitly
//! invalidated; staleness is tracked by an OR-accumulated `changed` flag
//! threaded through resolution, not by comparing values.

pub mod error;
pub mod evaluation;
pub mod model;
pub mod registry;
pub mod util;

pub use error::EngineError;
pub use evaluation::context::FrameContext;
pub use evaluation::driver::{
    Driver, DriverHooks, DriverState, FixedSubsteps, InvalidateEachFrame, RunReport,
    SubstepPolicy,
};
pub use model::graph::Graph;
pub use model::node::Node;
pub use model::scene::Scene;
pub use model::value::{Data, Value};
pub use registry::{FunctorRegistry, KindCategory, KindDefinition, SocketSpec};
