//! Counted-motion driver.
use super::{MotionContext, MotionEngine, MotionRequest, MotionResult};

/// Result of applying a motion `requested` times.
///
/// `result.valid` holds iff at least one step executed; `result.position` is
/// then the last position reached before the motion stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CountedMotion {
    pub result: MotionResult,
    pub moves_executed: usize,
    pub requested: usize,
}

impl CountedMotion {
    /// Some steps executed, but fewer than requested.
    pub const fn is_partial(&self) -> bool {
        self.moves_executed > 0 && self.moves_executed < self.requested
    }
}

/// Applies `request` from the context position.
///
/// Absolute jumps (`gg`, `G`) are computed once, with the count used as a
/// line number only when it was typed. Every other motion is stepped until
/// the count is exhausted or a step is blocked.
pub fn apply_count(
    engine: &mut MotionEngine,
    request: &MotionRequest,
    ctx: &MotionContext<'_>,
) -> CountedMotion {
    let requested = request.count.max(1);

    if request.motion.is_absolute_jump() {
        let jump = ctx.with_jump_count(request.has_explicit_count.then_some(requested));
        let result = engine.compute(request.motion, &jump);
        return CountedMotion {
            result,
            moves_executed: usize::from(result.valid),
            requested,
        };
    }

    let mut step = ctx.with_jump_count(None);
    let mut last = MotionResult::blocked(ctx.position, ctx.preferred_column);
    let mut moves_executed = 0;

    while moves_executed < requested {
        let result = engine.compute(request.motion, &step);
        if !result.valid {
            break;
        }
        step = step.advanced(&result);
        last = result;
        moves_executed += 1;
    }

    CountedMotion {
        result: last,
        moves_executed,
        requested,
    }
}
