//! Text grid and occupancy layers the motion engine reads.
//!
//! The text layer decides *where* a motion lands; the occupancy layer only
//! decides whether that landing cell may be entered.
mod occupancy;

pub use occupancy::{Cell, OccupancyGrid};

use std::fmt;

/// Discrete grid position expressed as row/column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Character classes used by word motions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Space,
    Word,
    Punct,
}

impl CharClass {
    /// Classifies `ch`. With `big` set every non-space character is a word char.
    pub fn of(ch: char, big: bool) -> Self {
        if ch.is_whitespace() {
            CharClass::Space
        } else if big || ch.is_alphanumeric() || ch == '_' {
            CharClass::Word
        } else {
            CharClass::Punct
        }
    }
}

/// Blank for line motions: space and tab only.
#[inline]
pub fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Rows of characters. Rows may be empty and need not share a length.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextGrid {
    rows: Vec<Vec<char>>,
}

impl TextGrid {
    pub fn new(rows: Vec<Vec<char>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from lines of text, one row per line.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rows: lines
                .into_iter()
                .map(|line| line.as_ref().chars().collect())
                .collect(),
        }
    }

    /// Splits `text` on newlines. A trailing newline does not add a row.
    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, row: usize) -> Option<&[char]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Length of `row`, zero when the row does not exist.
    pub fn row_len(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn char_at(&self, pos: Position) -> Option<char> {
        self.rows.get(pos.row)?.get(pos.col).copied()
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.col < self.row_len(pos.row)
    }

    /// A row with no visible character. Missing rows count as blank.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.row(row)
            .is_none_or(|chars| chars.iter().all(|ch| ch.is_whitespace()))
    }

    /// First column of `row` that is neither space nor tab.
    pub fn first_non_blank(&self, row: usize) -> Option<usize> {
        self.row(row)?.iter().position(|&ch| !is_blank(ch))
    }

    /// Last column of `row` that is neither space nor tab.
    pub fn last_non_blank(&self, row: usize) -> Option<usize> {
        self.row(row)?.iter().rposition(|&ch| !is_blank(ch))
    }

    /// Clamps `col` to the last column of `row` (zero for empty rows).
    pub fn clamp_col(&self, row: usize, col: usize) -> usize {
        col.min(self.row_len(row).saturating_sub(1))
    }

    /// Class of the character at `pos`; positions off the text read as space.
    pub fn class_at(&self, pos: Position, big: bool) -> CharClass {
        self.char_at(pos)
            .map_or(CharClass::Space, |ch| CharClass::of(ch, big))
    }

    /// Next position in reading order, skipping empty rows.
    pub fn step_forward(&self, pos: Position) -> Option<Position> {
        if pos.col + 1 < self.row_len(pos.row) {
            return Some(Position::new(pos.row, pos.col + 1));
        }
        ((pos.row + 1)..self.height())
            .find(|&row| self.row_len(row) > 0)
            .map(|row| Position::new(row, 0))
    }

    /// Previous position in reading order, skipping empty rows.
    pub fn step_back(&self, pos: Position) -> Option<Position> {
        if pos.col > 0 && self.row_len(pos.row) > 0 {
            let col = pos.col.min(self.row_len(pos.row)) - 1;
            return Some(Position::new(pos.row, col));
        }
        (0..pos.row.min(self.height()))
            .rev()
            .find(|&row| self.row_len(row) > 0)
            .map(|row| Position::new(row, self.row_len(row) - 1))
    }
}

impl fmt::Display for TextGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.rows.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            for ch in row {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}
