//! Paragraph (`{`, `}`) and sentence (`(`, `)`) motions.
use super::{Landing, MotionContext};
use crate::grid::{Position, TextGrid, is_blank};

/// Closing punctuation allowed between a sentence terminator and its space.
const SENTENCE_CLOSERS: [char; 5] = [')', ']', '}', '"', '\''];

/// Last row of the paragraph above, reached through the nearest blank run.
pub(crate) fn prev(ctx: &MotionContext<'_>) -> Landing {
    let grid = ctx.grid;
    let Some(blank) = (0..ctx.position.row)
        .rev()
        .find(|&row| grid.is_blank_row(row))
    else {
        return Landing::Stay;
    };
    match (0..blank).rev().find(|&row| !grid.is_blank_row(row)) {
        Some(row) => land_on_row(grid, row),
        None => Landing::Stay,
    }
}

/// First row of the paragraph below, reached through the nearest blank run.
pub(crate) fn next(ctx: &MotionContext<'_>) -> Landing {
    let grid = ctx.grid;
    let height = grid.height();
    let Some(blank) = ((ctx.position.row + 1)..height).find(|&row| grid.is_blank_row(row)) else {
        return Landing::Stay;
    };
    match ((blank + 1)..height).find(|&row| !grid.is_blank_row(row)) {
        Some(row) => land_on_row(grid, row),
        None => Landing::Stay,
    }
}

fn land_on_row(grid: &TextGrid, row: usize) -> Landing {
    grid.first_non_blank(row)
        .map_or(Landing::Nowhere, |col| {
            Landing::Horizontal(Position::new(row, col))
        })
}

/// Start of the sentence under the cursor, or of the previous one when the
/// cursor already sits on a sentence start.
pub(crate) fn sentence_prev(ctx: &MotionContext<'_>) -> Landing {
    sentence_starts(ctx.grid)
        .into_iter()
        .rev()
        .find(|&start| start < ctx.position)
        .map_or(Landing::Nowhere, Landing::Horizontal)
}

/// Start of the next sentence.
pub(crate) fn sentence_next(ctx: &MotionContext<'_>) -> Landing {
    sentence_starts(ctx.grid)
        .into_iter()
        .find(|&start| start > ctx.position)
        .map_or(Landing::Nowhere, Landing::Horizontal)
}

/// Every sentence start in reading order.
///
/// The first non-blank character of the grid starts a sentence, as does the
/// first non-blank character after each sentence end. A sentence ends at
/// `.`, `!` or `?`, optionally followed by closers, then a blank or the end
/// of the row.
pub(crate) fn sentence_starts(grid: &TextGrid) -> Vec<Position> {
    let mut starts = Vec::new();
    let mut awaiting_start = true;

    for (row, chars) in grid.rows().enumerate() {
        let mut col = 0;
        while col < chars.len() {
            let ch = chars[col];
            if awaiting_start && !is_blank(ch) {
                starts.push(Position::new(row, col));
                awaiting_start = false;
            }
            if let Some(after) = sentence_end_after(chars, col) {
                awaiting_start = true;
                col = after;
                continue;
            }
            col += 1;
        }
    }
    starts
}

/// If `col` holds a terminator that ends a sentence, the column just past
/// its trailing closers.
fn sentence_end_after(chars: &[char], col: usize) -> Option<usize> {
    if !matches!(chars[col], '.' | '!' | '?') {
        return None;
    }
    let mut after = col + 1;
    while after < chars.len() && SENTENCE_CLOSERS.contains(&chars[after]) {
        after += 1;
    }
    match chars.get(after) {
        None => Some(after),
        Some(&ch) if is_blank(ch) => Some(after),
        Some(_) => None,
    }
}
