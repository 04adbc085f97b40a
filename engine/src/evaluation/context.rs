//! Frame context passed explicitly into every functor invocation.

/// The point on the frame/substep timeline a functor runs at.
///
/// Passed by the driver into resolution and from there into every functor,
/// so frame-aware kinds read their position from the argument instead of
/// ambient global state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameContext {
    pub frame: u64,
    pub substep: u32,
}

impl FrameContext {
    pub fn new(frame: u64, substep: u32) -> Self {
        Self { frame, substep }
    }

    /// Frame 0, substep 0.
    pub fn start() -> Self {
        Self::default()
    }
}
