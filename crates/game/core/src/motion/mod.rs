//! Cursor motions over a [`TextGrid`].
//!
//! [`MotionEngine::compute`] is the single entry point: every family handler
//! produces a raw [`Landing`], and [`finalize`] applies the shared validity
//! rules (bounds, blank rows, opponents, no-op) to turn it into a
//! [`MotionResult`]. The only state the engine carries between calls is the
//! character-search memory used by `;` and `,`.
mod basic;
mod bracket;
mod count;
mod error;
mod file;
mod line;
mod paragraph;
mod request;
mod search;
mod word;

pub use count::{CountedMotion, apply_count};
pub use error::MotionError;
pub use request::MotionRequest;
pub use search::{CharSearch, CharSearchMemory, SearchKind};

use crate::grid::{OccupancyGrid, Position, TextGrid};

/// Every motion the engine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    FirstNonBlank,
    LastNonBlank,
    FileStart,
    FileEnd,
    ScreenTop,
    ScreenMiddle,
    ScreenBottom,
    WordForward,
    WordBackward,
    WordEnd,
    WordEndBackward,
    BigWordForward,
    BigWordBackward,
    BigWordEnd,
    BigWordEndBackward,
    ParagraphPrev,
    ParagraphNext,
    SentencePrev,
    SentenceNext,
    /// `f`, `F`, `t` or `T` with its target character.
    Search(CharSearch),
    /// `;`
    RepeatSearch,
    /// `,`
    RepeatSearchReverse,
    MatchBracket,
}

/// Motion families, used for logging and count semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MotionFamily {
    Basic,
    Line,
    FileScreen,
    Word,
    Paragraph,
    Sentence,
    CharSearch,
    Bracket,
}

impl Motion {
    /// Motions that take no target character.
    pub const UNPARAMETERIZED: [Motion; 28] = [
        Motion::Left,
        Motion::Right,
        Motion::Up,
        Motion::Down,
        Motion::LineStart,
        Motion::LineEnd,
        Motion::FirstNonBlank,
        Motion::LastNonBlank,
        Motion::FileStart,
        Motion::FileEnd,
        Motion::ScreenTop,
        Motion::ScreenMiddle,
        Motion::ScreenBottom,
        Motion::WordForward,
        Motion::WordBackward,
        Motion::WordEnd,
        Motion::WordEndBackward,
        Motion::BigWordForward,
        Motion::BigWordBackward,
        Motion::BigWordEnd,
        Motion::BigWordEndBackward,
        Motion::ParagraphPrev,
        Motion::ParagraphNext,
        Motion::SentencePrev,
        Motion::SentenceNext,
        Motion::RepeatSearch,
        Motion::RepeatSearchReverse,
        Motion::MatchBracket,
    ];

    pub fn family(self) -> MotionFamily {
        use Motion::*;
        match self {
            Left | Right | Up | Down => MotionFamily::Basic,
            LineStart | LineEnd | FirstNonBlank | LastNonBlank => MotionFamily::Line,
            FileStart | FileEnd | ScreenTop | ScreenMiddle | ScreenBottom => {
                MotionFamily::FileScreen
            }
            WordForward | WordBackward | WordEnd | WordEndBackward | BigWordForward
            | BigWordBackward | BigWordEnd | BigWordEndBackward => MotionFamily::Word,
            ParagraphPrev | ParagraphNext => MotionFamily::Paragraph,
            SentencePrev | SentenceNext => MotionFamily::Sentence,
            Search(_) | RepeatSearch | RepeatSearchReverse => MotionFamily::CharSearch,
            MatchBracket => MotionFamily::Bracket,
        }
    }

    /// Absolute jumps take the count as a line number instead of repeating.
    pub fn is_absolute_jump(self) -> bool {
        matches!(self, Motion::FileStart | Motion::FileEnd)
    }

    /// One of the four single-cell directions.
    pub fn is_single_step(self) -> bool {
        self.family() == MotionFamily::Basic
    }
}

/// Outcome of a motion computation.
///
/// `valid == false` means the motion is blocked; `position` and
/// `preferred_column` then echo the inputs and must not be adopted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionResult {
    pub position: Position,
    pub preferred_column: usize,
    pub valid: bool,
}

impl MotionResult {
    pub const fn landed(position: Position, preferred_column: usize) -> Self {
        Self {
            position,
            preferred_column,
            valid: true,
        }
    }

    pub const fn blocked(origin: Position, preferred_column: usize) -> Self {
        Self {
            position: origin,
            preferred_column,
            valid: false,
        }
    }

    pub const fn is_blocked(&self) -> bool {
        !self.valid
    }
}

/// Inputs to a single motion computation.
#[derive(Clone, Copy, Debug)]
pub struct MotionContext<'a> {
    pub grid: &'a TextGrid,
    pub occupancy: &'a OccupancyGrid,
    pub position: Position,
    pub preferred_column: usize,
    /// Line number for absolute jumps given an explicit count (`5G`).
    pub jump_count: Option<usize>,
}

impl<'a> MotionContext<'a> {
    pub fn new(
        grid: &'a TextGrid,
        occupancy: &'a OccupancyGrid,
        position: Position,
        preferred_column: usize,
    ) -> Self {
        Self {
            grid,
            occupancy,
            position,
            preferred_column,
            jump_count: None,
        }
    }

    #[must_use]
    pub fn with_jump_count(mut self, jump_count: Option<usize>) -> Self {
        self.jump_count = jump_count;
        self
    }

    /// Same inputs, moved to the result of a previous step.
    #[must_use]
    pub fn advanced(mut self, result: &MotionResult) -> Self {
        self.position = result.position;
        self.preferred_column = result.preferred_column;
        self
    }
}

/// Raw destination proposed by a family handler, before validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Landing {
    /// Horizontal resolution: the preferred column follows the landing column.
    Horizontal(Position),
    /// Vertical resolution: the preferred column is carried unchanged.
    Vertical(Position),
    /// Paragraph motion already at the document edge: valid, zero displacement.
    Stay,
    /// No candidate cell.
    Nowhere,
}

/// Applies the validity rules shared by every family.
pub(crate) fn finalize(ctx: &MotionContext<'_>, landing: Landing) -> MotionResult {
    let origin = ctx.position;
    let blocked = MotionResult::blocked(origin, ctx.preferred_column);

    let (target, preferred_column) = match landing {
        Landing::Nowhere => return blocked,
        Landing::Stay if ctx.grid.contains(origin) => {
            return MotionResult::landed(origin, ctx.preferred_column);
        }
        Landing::Stay => return blocked,
        Landing::Horizontal(target) => (target, target.col),
        Landing::Vertical(target) => (target, ctx.preferred_column),
    };

    if !ctx.grid.contains(target)
        || ctx.grid.is_blank_row(target.row)
        || ctx.occupancy.is_blocked(target)
        || target == origin
    {
        return blocked;
    }

    MotionResult::landed(target, preferred_column)
}

/// Computes motions and owns the character-search memory.
///
/// Independent engines never share memory, so one instance per actor (or per
/// simulated session) is the expected usage.
#[derive(Clone, Debug, Default)]
pub struct MotionEngine {
    search: CharSearchMemory,
}

impl MotionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_memory(search: CharSearchMemory) -> Self {
        Self { search }
    }

    pub fn search_memory(&self) -> &CharSearchMemory {
        &self.search
    }

    /// Replaces the search memory, e.g. when rolling back to a snapshot.
    pub fn restore_search_memory(&mut self, search: CharSearchMemory) {
        self.search = search;
    }

    /// Computes `motion` from the context position.
    ///
    /// Fresh character searches overwrite the search memory whether or not
    /// they find a match.
    pub fn compute(&mut self, motion: Motion, ctx: &MotionContext<'_>) -> MotionResult {
        let landing = match motion {
            Motion::Left => basic::left(ctx),
            Motion::Right => basic::right(ctx),
            Motion::Up => basic::up(ctx),
            Motion::Down => basic::down(ctx),
            Motion::LineStart => line::start(ctx),
            Motion::LineEnd => line::end(ctx),
            Motion::FirstNonBlank => line::first_non_blank(ctx),
            Motion::LastNonBlank => line::last_non_blank(ctx),
            Motion::FileStart => file::file_start(ctx),
            Motion::FileEnd => file::file_end(ctx),
            Motion::ScreenTop => file::screen_top(ctx),
            Motion::ScreenMiddle => file::screen_middle(ctx),
            Motion::ScreenBottom => file::screen_bottom(ctx),
            Motion::WordForward => word::forward(ctx, false),
            Motion::WordBackward => word::backward(ctx, false),
            Motion::WordEnd => word::end(ctx, false),
            Motion::WordEndBackward => word::end_backward(ctx, false),
            Motion::BigWordForward => word::forward(ctx, true),
            Motion::BigWordBackward => word::backward(ctx, true),
            Motion::BigWordEnd => word::end(ctx, true),
            Motion::BigWordEndBackward => word::end_backward(ctx, true),
            Motion::ParagraphPrev => paragraph::prev(ctx),
            Motion::ParagraphNext => paragraph::next(ctx),
            Motion::SentencePrev => paragraph::sentence_prev(ctx),
            Motion::SentenceNext => paragraph::sentence_next(ctx),
            Motion::Search(search) => {
                self.search.record(search);
                search::find(ctx, search, false)
            }
            Motion::RepeatSearch => match self.search.last() {
                Some(search) => search::find(ctx, search, true),
                None => Landing::Nowhere,
            },
            Motion::RepeatSearchReverse => match self.search.last() {
                Some(search) => search::find(ctx, search.reversed(), true),
                None => Landing::Nowhere,
            },
            Motion::MatchBracket => bracket::matching(ctx),
        };

        finalize(ctx, landing)
    }

    /// Parses `name` (key notation or snake-case name) and computes it once.
    ///
    /// Any count prefix in `name` is ignored here; use [`apply_count`] for
    /// counted requests.
    pub fn compute_named(
        &mut self,
        name: &str,
        ctx: &MotionContext<'_>,
    ) -> Result<MotionResult, MotionError> {
        let request: MotionRequest = name.parse()?;
        Ok(self.compute(request.motion, ctx))
    }
}
