//! File and screen jumps: `gg`, `G`, `H`, `M`, `L`.
//!
//! All of them are vertical: the column comes from the preferred column,
//! clamped to the target row. The whole grid is the screen.
use super::basic::vertical_to;
use super::{Landing, MotionContext};

/// `gg`, or `Ngg` to row `N - 1`.
pub(crate) fn file_start(ctx: &MotionContext<'_>) -> Landing {
    let row = ctx.jump_count.map_or(0, |count| jump_row(ctx, count));
    jump(ctx, row)
}

/// `G`, or `NG` to row `N - 1`.
pub(crate) fn file_end(ctx: &MotionContext<'_>) -> Landing {
    let last = ctx.grid.height().saturating_sub(1);
    let row = ctx.jump_count.map_or(last, |count| jump_row(ctx, count));
    jump(ctx, row)
}

pub(crate) fn screen_top(ctx: &MotionContext<'_>) -> Landing {
    jump(ctx, 0)
}

pub(crate) fn screen_middle(ctx: &MotionContext<'_>) -> Landing {
    jump(ctx, ctx.grid.height().saturating_sub(1) / 2)
}

pub(crate) fn screen_bottom(ctx: &MotionContext<'_>) -> Landing {
    jump(ctx, ctx.grid.height().saturating_sub(1))
}

/// One-based line number to a row index inside the grid.
fn jump_row(ctx: &MotionContext<'_>, count: usize) -> usize {
    count
        .saturating_sub(1)
        .min(ctx.grid.height().saturating_sub(1))
}

fn jump(ctx: &MotionContext<'_>, row: usize) -> Landing {
    if ctx.grid.is_empty() {
        return Landing::Nowhere;
    }
    vertical_to(ctx, row)
}
