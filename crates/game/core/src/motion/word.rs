//! Word motions: `w`, `b`, `e`, `ge` and their WORD variants.
//!
//! Words never span rows: a row boundary always separates two words. Each
//! punctuation character is a word of its own, so runs like `...` are three
//! words rather than one.
use super::{Landing, MotionContext};
use crate::grid::{CharClass, Position, TextGrid};

/// Start of the next word (`w` / `W`).
pub(crate) fn forward(ctx: &MotionContext<'_>, big: bool) -> Landing {
    to_landing(next_word_start(ctx.grid, ctx.position, big))
}

/// Start of the current or previous word (`b` / `B`).
pub(crate) fn backward(ctx: &MotionContext<'_>, big: bool) -> Landing {
    to_landing(prev_word_start(ctx.grid, ctx.position, big))
}

/// End of the current or next word (`e` / `E`).
pub(crate) fn end(ctx: &MotionContext<'_>, big: bool) -> Landing {
    to_landing(next_word_end(ctx.grid, ctx.position, big))
}

/// End of the previous word (`ge` / `gE`).
pub(crate) fn end_backward(ctx: &MotionContext<'_>, big: bool) -> Landing {
    to_landing(prev_word_end(ctx.grid, ctx.position, big))
}

fn to_landing(target: Option<Position>) -> Landing {
    target.map_or(Landing::Nowhere, Landing::Horizontal)
}

/// Whether `a` and `b` are adjacent characters of the same multi-char word.
fn same_word(grid: &TextGrid, a: Position, b: Position, class: CharClass, big: bool) -> bool {
    a.row == b.row && class == CharClass::Word && grid.class_at(b, big) == class
}

fn next_word_start(grid: &TextGrid, origin: Position, big: bool) -> Option<Position> {
    let class = grid.class_at(origin, big);
    let mut pos = origin;

    match class {
        CharClass::Space => {}
        CharClass::Punct => pos = grid.step_forward(pos)?,
        CharClass::Word => loop {
            let next = grid.step_forward(pos)?;
            let stays = same_word(grid, pos, next, class, big);
            pos = next;
            if !stays {
                break;
            }
        },
    }

    skip_space_forward(grid, pos, big)
}

fn next_word_end(grid: &TextGrid, origin: Position, big: bool) -> Option<Position> {
    let start = grid.step_forward(origin)?;
    let mut pos = skip_space_forward(grid, start, big)?;
    let class = grid.class_at(pos, big);

    while let Some(next) = grid.step_forward(pos)
        && same_word(grid, pos, next, class, big)
    {
        pos = next;
    }
    Some(pos)
}

fn prev_word_start(grid: &TextGrid, origin: Position, big: bool) -> Option<Position> {
    let start = grid.step_back(origin)?;
    let mut pos = skip_space_backward(grid, start, big)?;
    let class = grid.class_at(pos, big);

    while let Some(prev) = grid.step_back(pos)
        && same_word(grid, pos, prev, class, big)
    {
        pos = prev;
    }
    Some(pos)
}

fn prev_word_end(grid: &TextGrid, origin: Position, big: bool) -> Option<Position> {
    let class = grid.class_at(origin, big);
    let mut pos = grid.step_back(origin)?;

    // Leave the word under the cursor first.
    let mut last = origin;
    while same_word(grid, last, pos, class, big) {
        last = pos;
        pos = grid.step_back(pos)?;
    }

    skip_space_backward(grid, pos, big)
}

fn skip_space_forward(grid: &TextGrid, mut pos: Position, big: bool) -> Option<Position> {
    while grid.class_at(pos, big) == CharClass::Space {
        pos = grid.step_forward(pos)?;
    }
    Some(pos)
}

fn skip_space_backward(grid: &TextGrid, mut pos: Position, big: bool) -> Option<Position> {
    while grid.class_at(pos, big) == CharClass::Space {
        pos = grid.step_back(pos)?;
    }
    Some(pos)
}
