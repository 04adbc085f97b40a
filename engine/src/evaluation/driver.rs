//! The evaluation driver — walks the frame/substep timeline and forces a
//! pull of the viewed nodes each substep.

use log::debug;

use crate::error::EngineError;
use crate::model::graph::Graph;
use crate::registry::FunctorRegistry;
use crate::util::timing::ScopedTimer;

use super::context::FrameContext;

/// Where the driver currently is in a run.
///
/// A run walks
/// `Idle -> FrameBegin -> {SubstepBegin -> Apply -> SubstepEnd}* -> FrameEnd`
/// per frame and always ends back at `Idle`, on success or error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    FrameBegin,
    SubstepBegin,
    Apply,
    SubstepEnd,
    FrameEnd,
}

/// External timing predicate deciding whether a frame gets another substep.
/// Every frame runs at least one.
pub trait SubstepPolicy {
    /// Called with the context of the prospective next substep.
    fn more_substeps(&mut self, ctx: &FrameContext) -> bool;
}

/// Runs exactly `n` substeps per frame (minimum one).
pub struct FixedSubsteps(pub u32);

impl SubstepPolicy for FixedSubsteps {
    fn more_substeps(&mut self, ctx: &FrameContext) -> bool {
        ctx.substep < self.0
    }
}

/// Frame-boundary callbacks around the substep loop.
///
/// The driver never invalidates anything mid-frame itself; per-frame
/// freshness for frame-aware kinds is an embedder contract, expressed
/// through these hooks.
pub trait DriverHooks {
    fn on_frame_begin(
        &mut self,
        _graph: &mut Graph,
        _ctx: &FrameContext,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    fn on_frame_end(
        &mut self,
        _graph: &mut Graph,
        _ctx: &FrameContext,
    ) -> Result<(), EngineError> {
        Ok(())
    }
}

/// No-op hooks.
pub struct DefaultHooks;

impl DriverHooks for DefaultHooks {}

/// Invalidates the named nodes at every frame begin, so frame-aware kinds
/// (like `time.frame`) recompute once per frame instead of staying cached
/// forever.
pub struct InvalidateEachFrame {
    pub nodes: Vec<String>,
}

impl InvalidateEachFrame {
    pub fn new(nodes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }
}

impl DriverHooks for InvalidateEachFrame {
    fn on_frame_begin(
        &mut self,
        graph: &mut Graph,
        _ctx: &FrameContext,
    ) -> Result<(), EngineError> {
        for name in &self.nodes {
            graph.invalidate(name)?;
        }
        Ok(())
    }
}

/// What a run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub frames: u64,
    pub substeps: u64,
    /// Substeps in which at least one pulled node actually recomputed.
    pub changed_substeps: u64,
}

/// Orchestrates evaluation across frames and substeps.
pub struct Driver<'a> {
    registry: &'a FunctorRegistry,
    policy: Box<dyn SubstepPolicy>,
    hooks: Box<dyn DriverHooks>,
    state: DriverState,
}

impl<'a> Driver<'a> {
    /// Driver with one substep per frame and no hooks.
    pub fn new(registry: &'a FunctorRegistry) -> Self {
        Self {
            registry,
            policy: Box::new(FixedSubsteps(1)),
            hooks: Box::new(DefaultHooks),
            state: DriverState::Idle,
        }
    }

    pub fn with_substeps(mut self, policy: impl SubstepPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_hooks(mut self, hooks: impl DriverHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Run `frames` frames against `graph`, pulling each node in `viewed`
    /// every substep. Nodes not reachable from `viewed` are never
    /// evaluated. The first error aborts the run and surfaces verbatim.
    pub fn run(
        &mut self,
        graph: &mut Graph,
        frames: u64,
        viewed: &[impl AsRef<str>],
    ) -> Result<RunReport, EngineError> {
        let _timer = ScopedTimer::debug("driver run");
        let result = self.run_frames(graph, frames, viewed);
        self.state = DriverState::Idle;
        result
    }

    fn run_frames(
        &mut self,
        graph: &mut Graph,
        frames: u64,
        viewed: &[impl AsRef<str>],
    ) -> Result<RunReport, EngineError> {
        let mut report = RunReport::default();

        for frame in 0..frames {
            self.state = DriverState::FrameBegin;
            let frame_ctx = FrameContext::new(frame, 0);
            self.hooks.on_frame_begin(graph, &frame_ctx)?;

            let mut substep = 0u32;
            loop {
                let ctx = FrameContext::new(frame, substep);
                self.state = DriverState::SubstepBegin;
                debug!("driver: frame {frame} substep {substep}");

                self.state = DriverState::Apply;
                let changed = graph.apply_nodes(viewed, self.registry, &ctx)?;

                self.state = DriverState::SubstepEnd;
                report.substeps += 1;
                if changed {
                    report.changed_substeps += 1;
                }

                substep += 1;
                let next = FrameContext::new(frame, substep);
                if !self.policy.more_substeps(&next) {
                    break;
                }
            }

            self.state = DriverState::FrameEnd;
            self.hooks.on_frame_end(graph, &frame_ctx)?;
            report.frames += 1;
        }

        Ok(report)
    }
}
