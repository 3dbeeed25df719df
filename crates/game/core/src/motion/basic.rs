//! Single-cell motions: `h`, `l`, `k`, `j`.
use super::{Landing, MotionContext};
use crate::grid::Position;

pub(crate) fn left(ctx: &MotionContext<'_>) -> Landing {
    let Position { row, col } = ctx.position;
    match col.checked_sub(1) {
        Some(col) => Landing::Horizontal(Position::new(row, col)),
        None => Landing::Nowhere,
    }
}

pub(crate) fn right(ctx: &MotionContext<'_>) -> Landing {
    let Position { row, col } = ctx.position;
    Landing::Horizontal(Position::new(row, col + 1))
}

pub(crate) fn up(ctx: &MotionContext<'_>) -> Landing {
    match ctx.position.row.checked_sub(1) {
        Some(row) => vertical_to(ctx, row),
        None => Landing::Nowhere,
    }
}

pub(crate) fn down(ctx: &MotionContext<'_>) -> Landing {
    vertical_to(ctx, ctx.position.row + 1)
}

/// Vertical landing on `row` at the preferred column, clamped to the row.
pub(crate) fn vertical_to(ctx: &MotionContext<'_>, row: usize) -> Landing {
    if row >= ctx.grid.height() {
        return Landing::Nowhere;
    }
    let col = ctx.grid.clamp_col(row, ctx.preferred_column);
    Landing::Vertical(Position::new(row, col))
}
