//! In-row motions: `0`, `$`, `^`, `g_`.
use super::{Landing, MotionContext};
use crate::grid::Position;

pub(crate) fn start(ctx: &MotionContext<'_>) -> Landing {
    Landing::Horizontal(Position::new(ctx.position.row, 0))
}

pub(crate) fn end(ctx: &MotionContext<'_>) -> Landing {
    let row = ctx.position.row;
    match ctx.grid.row_len(row).checked_sub(1) {
        Some(col) => Landing::Horizontal(Position::new(row, col)),
        None => Landing::Nowhere,
    }
}

pub(crate) fn first_non_blank(ctx: &MotionContext<'_>) -> Landing {
    let row = ctx.position.row;
    ctx.grid
        .first_non_blank(row)
        .map_or(Landing::Nowhere, |col| {
            Landing::Horizontal(Position::new(row, col))
        })
}

pub(crate) fn last_non_blank(ctx: &MotionContext<'_>) -> Landing {
    let row = ctx.position.row;
    ctx.grid
        .last_non_blank(row)
        .map_or(Landing::Nowhere, |col| {
            Landing::Horizontal(Position::new(row, col))
        })
}
