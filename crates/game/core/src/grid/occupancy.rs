use super::{Position, TextGrid};

/// Contents of a single occupancy cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cell {
    #[default]
    Empty,
    /// The actor whose motions are being computed.
    Player,
    /// An opponent or obstacle. Blocks entry.
    Opponent,
    Collectible,
}

impl Cell {
    pub const fn blocks_entry(self) -> bool {
        matches!(self, Cell::Opponent)
    }
}

/// Per-cell occupancy with the same shape as its [`TextGrid`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyGrid {
    cells: Vec<Vec<Cell>>,
}

impl OccupancyGrid {
    /// All-empty occupancy shaped like `grid`.
    pub fn for_grid(grid: &TextGrid) -> Self {
        Self {
            cells: grid.rows().map(|row| vec![Cell::Empty; row.len()]).collect(),
        }
    }

    /// Cell at `pos`; positions outside the grid read as empty.
    pub fn get(&self, pos: Position) -> Cell {
        self.cells
            .get(pos.row)
            .and_then(|row| row.get(pos.col))
            .copied()
            .unwrap_or_default()
    }

    /// Sets the cell at `pos`. Returns `false` when `pos` is outside the grid.
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        match self.cells.get_mut(pos.row).and_then(|row| row.get_mut(pos.col)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn is_blocked(&self, pos: Position) -> bool {
        self.get(pos).blocks_entry()
    }

    /// Positions holding `cell`, in reading order.
    pub fn positions_of(&self, cell: Cell) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().enumerate().flat_map(move |(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(move |(_, c)| **c == cell)
                .map(move |(col, _)| Position::new(row, col))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_grid_cells_read_empty_and_reject_writes() {
        let grid = TextGrid::from_lines(["ab", "c"]);
        let mut occupancy = OccupancyGrid::for_grid(&grid);

        assert!(occupancy.set(Position::new(1, 0), Cell::Opponent));
        assert!(!occupancy.set(Position::new(1, 1), Cell::Opponent));
        assert_eq!(occupancy.get(Position::new(5, 5)), Cell::Empty);
        assert!(occupancy.is_blocked(Position::new(1, 0)));
        assert_eq!(
            occupancy.positions_of(Cell::Opponent).collect::<Vec<_>>(),
            vec![Position::new(1, 0)]
        );
    }
}
