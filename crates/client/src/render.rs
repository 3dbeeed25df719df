//! Plain-text rendering of the mirror.
use std::fmt::Write;

use game_core::{GameState, Position};

const PLAYER: char = '@';
const OPPONENT: char = '&';
const COLLECTIBLE: char = '*';

/// Draws the level with the player, opponents and collectibles overlaid.
pub fn render(state: &GameState) -> String {
    let mut out = String::new();
    for row in 0..state.grid.height() {
        let chars = state.grid.row(row).unwrap_or_default();
        for (col, &ch) in chars.iter().enumerate() {
            out.push(glyph(state, Position::new(row, col)).unwrap_or(ch));
        }
        out.push('\n');
    }
    let player = state.player;
    let _ = write!(
        out,
        "{} score={} preferred-col={}{}",
        player.position,
        player.score,
        player.preferred_column,
        if state.completed { " COMPLETE" } else { "" }
    );
    out
}

fn glyph(state: &GameState, position: Position) -> Option<char> {
    if state.player.position == position {
        Some(PLAYER)
    } else if state
        .opponents
        .values()
        .any(|opponent| opponent.position == position)
    {
        Some(OPPONENT)
    } else if state.collectibles.contains(&position) {
        Some(COLLECTIBLE)
    } else {
        None
    }
}
