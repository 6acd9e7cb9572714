//! VM configuration.
//!
//! Limits only; the engine enforces them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default operand stack capacity.
pub const STACK_MAX: usize = 256;

/// VM configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VmConfig {
    /// Maximum number of values on the operand stack.
    pub stack_max: usize,
    /// Dump the stack and the next instruction before every dispatch.
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig { stack_max: STACK_MAX, trace: false }
    }
}

impl VmConfig {
    /// Default limits.
    pub fn new() -> Self { Self::default() }

    /// Override the stack capacity.
    #[must_use]
    pub const fn with_stack_max(mut self, stack_max: usize) -> Self {
        self.stack_max = stack_max;
        self
    }

    /// Toggle execution tracing.
    #[must_use]
    pub const fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
