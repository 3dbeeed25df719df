//! Bracket matching: `%`.
use super::{Landing, MotionContext};
use crate::grid::{Position, TextGrid};

const PAIRS: [(char, char); 3] = [('(', ')'), ('{', '}'), ('[', ']')];

/// Matching bracket for the one under the cursor, scanning across rows.
///
/// Only brackets of the same type affect the depth; `(` inside `[...]` is
/// irrelevant when matching `[`.
pub(crate) fn matching(ctx: &MotionContext<'_>) -> Landing {
    let grid = ctx.grid;
    let origin = ctx.position;
    let Some(under) = grid.char_at(origin) else {
        return Landing::Nowhere;
    };

    let target = PAIRS.iter().find_map(|&(open, close)| {
        if under == open {
            scan(grid, origin, open, close, true)
        } else if under == close {
            scan(grid, origin, close, open, false)
        } else {
            None
        }
    });
    target.map_or(Landing::Nowhere, Landing::Horizontal)
}

fn scan(
    grid: &TextGrid,
    origin: Position,
    same: char,
    other: char,
    forward: bool,
) -> Option<Position> {
    let step = |pos| {
        if forward {
            grid.step_forward(pos)
        } else {
            grid.step_back(pos)
        }
    };
    let mut depth = 1usize;
    let mut pos = origin;
    while let Some(next) = step(pos) {
        pos = next;
        match grid.char_at(pos) {
            Some(ch) if ch == same => depth += 1,
            Some(ch) if ch == other => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
    }
    None
}
