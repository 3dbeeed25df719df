//! Game state the motion pipeline mutates.
//!
//! A [`GameState`] is the full mirror of one session: the level text, the
//! local player, every opponent and every collectible. Runtime layers clone
//! it freely for snapshots but mutate the player exclusively through
//! [`GameEngine`](crate::engine::GameEngine).
mod error;

pub use error::StateError;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::grid::{Cell, OccupancyGrid, Position, TextGrid};
use crate::motion::MotionContext;

/// Identifier of a remote actor in a shared session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// The locally controlled actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerState {
    pub position: Position,
    pub preferred_column: usize,
    pub score: u64,
}

impl PlayerState {
    /// Player at `position` with the preferred column on its column.
    pub fn at(position: Position) -> Self {
        Self {
            position,
            preferred_column: position.col,
            score: 0,
        }
    }
}

/// A remote actor, known only through authoritative pushes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpponentState {
    pub id: ActorId,
    pub position: Position,
    pub score: u64,
}

/// Canonical snapshot of one session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    /// Seed for collectible respawn. Set once and never modified.
    pub game_seed: u64,
    /// Number of moves applied to this state. Combined with `game_seed` for
    /// per-move random draws.
    pub nonce: u64,
    pub grid: TextGrid,
    pub player: PlayerState,
    pub opponents: BTreeMap<ActorId, OpponentState>,
    pub collectibles: BTreeSet<Position>,
    pub completed: bool,
}

impl GameState {
    /// Fresh state with the player at `start`.
    pub fn new(grid: TextGrid, start: Position) -> Result<Self, StateError> {
        Self::with_seed(0, grid, start)
    }

    /// Fresh state with an explicit respawn seed.
    pub fn with_seed(game_seed: u64, grid: TextGrid, start: Position) -> Result<Self, StateError> {
        if grid.is_empty() {
            return Err(StateError::EmptyGrid);
        }
        if !grid.contains(start) {
            return Err(StateError::StartOutOfBounds { position: start });
        }
        if grid.is_blank_row(start.row) {
            return Err(StateError::StartOnBlankRow { position: start });
        }

        Ok(Self {
            game_seed,
            nonce: 0,
            grid,
            player: PlayerState::at(start),
            opponents: BTreeMap::new(),
            collectibles: BTreeSet::new(),
            completed: false,
        })
    }

    /// Adds collectibles, ignoring cells that cannot hold one.
    #[must_use]
    pub fn with_collectibles(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.replace_collectibles(positions);
        self
    }

    /// Replaces the whole collectible set, ignoring cells that cannot hold one.
    pub fn replace_collectibles(&mut self, positions: impl IntoIterator<Item = Position>) {
        let grid = &self.grid;
        self.collectibles = positions
            .into_iter()
            .filter(|&pos| can_hold_collectible(grid, pos))
            .collect();
    }

    /// Inserts or moves an opponent.
    pub fn upsert_opponent(&mut self, opponent: OpponentState) {
        self.opponents.insert(opponent.id, opponent);
    }

    pub fn remove_opponent(&mut self, id: ActorId) -> Option<OpponentState> {
        self.opponents.remove(&id)
    }

    /// Derives the occupancy layer from actors and collectibles.
    ///
    /// Opponents are written last so a stale collectible under an opponent
    /// never makes its cell enterable.
    pub fn occupancy(&self) -> OccupancyGrid {
        let mut occupancy = OccupancyGrid::for_grid(&self.grid);
        for &pos in &self.collectibles {
            occupancy.set(pos, Cell::Collectible);
        }
        occupancy.set(self.player.position, Cell::Player);
        for opponent in self.opponents.values() {
            occupancy.set(opponent.position, Cell::Opponent);
        }
        occupancy
    }

    /// Motion inputs for the player against `occupancy`.
    pub fn motion_context<'a>(&'a self, occupancy: &'a OccupancyGrid) -> MotionContext<'a> {
        MotionContext::new(
            &self.grid,
            occupancy,
            self.player.position,
            self.player.preferred_column,
        )
    }

    /// Cells a collectible may respawn on, in reading order.
    pub fn spawn_candidates(&self) -> Vec<Position> {
        let occupancy = self.occupancy();
        self.grid
            .rows()
            .enumerate()
            .flat_map(|(row, chars)| (0..chars.len()).map(move |col| Position::new(row, col)))
            .filter(|&pos| {
                can_hold_collectible(&self.grid, pos) && occupancy.get(pos) == Cell::Empty
            })
            .collect()
    }
}

/// Collectibles sit on visible characters only.
fn can_hold_collectible(grid: &TextGrid, pos: Position) -> bool {
    grid.char_at(pos).is_some_and(|ch| !ch.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TextGrid {
        TextGrid::from_lines(["ab cd", "", "ef"])
    }

    #[test]
    fn test_start_position_is_validated() {
        assert!(GameState::new(grid(), Position::new(0, 1)).is_ok());
        assert_eq!(
            GameState::new(grid(), Position::new(0, 9)),
            Err(StateError::StartOutOfBounds {
                position: Position::new(0, 9)
            })
        );
        assert_eq!(
            GameState::new(TextGrid::from_lines(["   ", "a"]), Position::new(0, 1)),
            Err(StateError::StartOnBlankRow {
                position: Position::new(0, 1)
            })
        );
        assert_eq!(
            GameState::new(TextGrid::default(), Position::ORIGIN),
            Err(StateError::EmptyGrid)
        );
    }

    #[test]
    fn test_collectibles_only_on_visible_characters() {
        let state = GameState::new(grid(), Position::ORIGIN)
            .unwrap()
            .with_collectibles([
                Position::new(0, 2),
                Position::new(0, 3),
                Position::new(1, 0),
                Position::new(7, 7),
            ]);
        assert_eq!(
            state.collectibles.iter().copied().collect::<Vec<_>>(),
            vec![Position::new(0, 3)]
        );
    }

    #[test]
    fn test_occupancy_marks_actors_and_collectibles() {
        let mut state = GameState::new(grid(), Position::ORIGIN)
            .unwrap()
            .with_collectibles([Position::new(2, 1), Position::new(0, 4)]);
        state.upsert_opponent(OpponentState {
            id: ActorId(7),
            position: Position::new(0, 4),
            score: 3,
        });

        let occupancy = state.occupancy();
        assert_eq!(occupancy.get(Position::ORIGIN), Cell::Player);
        assert_eq!(occupancy.get(Position::new(2, 1)), Cell::Collectible);
        assert_eq!(occupancy.get(Position::new(0, 4)), Cell::Opponent);

        assert_eq!(
            state.spawn_candidates(),
            vec![Position::new(0, 1), Position::new(0, 3), Position::new(2, 0)]
        );
    }
}
