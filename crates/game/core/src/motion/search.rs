//! Character search within the current row: `f`, `F`, `t`, `T`, `;`, `,`.
use super::{Landing, MotionContext};
use crate::grid::Position;

/// Direction and landing style of a character search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchKind {
    /// `f`: onto the next match.
    FindForward,
    /// `F`: onto the previous match.
    FindBackward,
    /// `t`: one cell before the next match.
    TillForward,
    /// `T`: one cell after the previous match.
    TillBackward,
}

impl SearchKind {
    pub const fn key(self) -> char {
        match self {
            SearchKind::FindForward => 'f',
            SearchKind::FindBackward => 'F',
            SearchKind::TillForward => 't',
            SearchKind::TillBackward => 'T',
        }
    }

    pub const fn from_key(key: char) -> Option<Self> {
        match key {
            'f' => Some(SearchKind::FindForward),
            'F' => Some(SearchKind::FindBackward),
            't' => Some(SearchKind::TillForward),
            'T' => Some(SearchKind::TillBackward),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SearchKind::FindForward => "find_forward",
            SearchKind::FindBackward => "find_backward",
            SearchKind::TillForward => "till_forward",
            SearchKind::TillBackward => "till_backward",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            SearchKind::FindForward,
            SearchKind::FindBackward,
            SearchKind::TillForward,
            SearchKind::TillBackward,
        ]
        .into_iter()
        .find(|kind| kind.name() == name)
    }

    pub const fn is_forward(self) -> bool {
        matches!(self, SearchKind::FindForward | SearchKind::TillForward)
    }

    pub const fn is_till(self) -> bool {
        matches!(self, SearchKind::TillForward | SearchKind::TillBackward)
    }

    /// Same landing style, opposite direction.
    pub const fn reversed(self) -> Self {
        match self {
            SearchKind::FindForward => SearchKind::FindBackward,
            SearchKind::FindBackward => SearchKind::FindForward,
            SearchKind::TillForward => SearchKind::TillBackward,
            SearchKind::TillBackward => SearchKind::TillForward,
        }
    }
}

/// A character search command with its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharSearch {
    pub kind: SearchKind,
    pub target: char,
}

impl CharSearch {
    pub const fn new(kind: SearchKind, target: char) -> Self {
        Self { kind, target }
    }

    pub const fn is_till(&self) -> bool {
        self.kind.is_till()
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            kind: self.kind.reversed(),
            target: self.target,
        }
    }
}

/// The last character search, replayed by `;` and `,`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharSearchMemory {
    last: Option<CharSearch>,
}

impl CharSearchMemory {
    pub const fn new() -> Self {
        Self { last: None }
    }

    pub const fn last(&self) -> Option<CharSearch> {
        self.last
    }

    pub const fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    pub(crate) fn record(&mut self, search: CharSearch) {
        self.last = Some(search);
    }
}

/// Scans the current row for `search.target`.
///
/// When `repeat` is set, a till search skips a match directly adjacent to the
/// cursor, otherwise repeating `t` would never move.
pub(crate) fn find(ctx: &MotionContext<'_>, search: CharSearch, repeat: bool) -> Landing {
    let Position { row, col } = ctx.position;
    let Some(chars) = ctx.grid.row(row) else {
        return Landing::Nowhere;
    };
    let skip = usize::from(repeat && search.is_till());

    let found = if search.kind.is_forward() {
        let from = col + 1 + skip;
        chars
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, ch)| **ch == search.target)
            .map(|(index, _)| index)
    } else {
        let until = col.saturating_sub(skip).min(chars.len());
        chars[..until].iter().rposition(|ch| *ch == search.target)
    };

    let Some(hit) = found else {
        return Landing::Nowhere;
    };
    let landing_col = match search.kind {
        SearchKind::FindForward | SearchKind::FindBackward => hit,
        SearchKind::TillForward => hit - 1,
        SearchKind::TillBackward => hit + 1,
    };
    Landing::Horizontal(Position::new(row, landing_col))
}
