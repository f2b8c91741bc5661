//! Resource limits for embedded execution.

use crate::error::{EvalResult, JsError};

/// Default ceiling on interpreter call depth.
///
/// The evaluator is a tree walker, so every language-level call consumes
/// host stack; the limit is checked before a frame is pushed so breach fails
/// fast instead of overflowing.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 400;

/// Limits applied to one evaluation.
///
/// `None` disables the corresponding check. The object ceiling counts
/// program allocations only; the built-in intrinsics are exempt.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub max_recursion_depth: Option<usize>,
    pub max_heap_objects: Option<usize>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: Some(DEFAULT_MAX_RECURSION_DEPTH),
            max_heap_objects: None,
        }
    }
}

impl ResourceLimits {
    /// Unlimited execution; embedders running untrusted code should prefer
    /// the default.
    pub fn none() -> Self {
        Self {
            max_recursion_depth: None,
            max_heap_objects: None,
        }
    }

    pub fn check_recursion_depth(&self, current_depth: usize) -> EvalResult<()> {
        if let Some(max) = self.max_recursion_depth {
            if current_depth >= max {
                return Err(JsError::range_error("maximum call stack size exceeded"));
            }
        }
        Ok(())
    }
}
