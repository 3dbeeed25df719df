//! Motion requests and their textual forms.
//!
//! Two notations are accepted, both with an optional count prefix:
//! - key notation, as typed: `w`, `5j`, `gg`, `3fx`, `%`
//! - snake-case names: `word_forward`, `5down`, `find_forward:x`
//!
//! Requests are always written back in key notation, which is what the
//! authoritative source expects in the `direction` field.
use std::fmt;
use std::str::FromStr;

use super::{CharSearch, Motion, MotionError, SearchKind};

/// Key notation and snake-case name of every unparameterized motion.
static NOTATION: [(&str, &str, Motion); 28] = [
    ("h", "left", Motion::Left),
    ("l", "right", Motion::Right),
    ("k", "up", Motion::Up),
    ("j", "down", Motion::Down),
    ("0", "line_start", Motion::LineStart),
    ("$", "line_end", Motion::LineEnd),
    ("^", "first_non_blank", Motion::FirstNonBlank),
    ("g_", "last_non_blank", Motion::LastNonBlank),
    ("gg", "file_start", Motion::FileStart),
    ("G", "file_end", Motion::FileEnd),
    ("H", "screen_top", Motion::ScreenTop),
    ("M", "screen_middle", Motion::ScreenMiddle),
    ("L", "screen_bottom", Motion::ScreenBottom),
    ("w", "word_forward", Motion::WordForward),
    ("b", "word_backward", Motion::WordBackward),
    ("e", "word_end", Motion::WordEnd),
    ("ge", "word_end_backward", Motion::WordEndBackward),
    ("W", "big_word_forward", Motion::BigWordForward),
    ("B", "big_word_backward", Motion::BigWordBackward),
    ("E", "big_word_end", Motion::BigWordEnd),
    ("gE", "big_word_end_backward", Motion::BigWordEndBackward),
    ("{", "paragraph_prev", Motion::ParagraphPrev),
    ("}", "paragraph_next", Motion::ParagraphNext),
    ("(", "sentence_prev", Motion::SentencePrev),
    (")", "sentence_next", Motion::SentenceNext),
    (";", "repeat_char_search_same", Motion::RepeatSearch),
    (",", "repeat_char_search_opposite", Motion::RepeatSearchReverse),
    ("%", "match_bracket", Motion::MatchBracket),
];

impl Motion {
    /// Key notation, e.g. `"w"`, `"gg"`, `"fx"`.
    pub fn key(self) -> String {
        match self {
            Motion::Search(search) => format!("{}{}", search.kind.key(), search.target),
            motion => lookup(|(_, _, m)| *m == motion)
                .map(|(key, _, _)| key.to_string())
                .unwrap_or_default(),
        }
    }

    /// Snake-case name, e.g. `"word_forward"`, `"find_forward:x"`.
    pub fn name(self) -> String {
        match self {
            Motion::Search(search) => format!("{}:{}", search.kind.name(), search.target),
            motion => lookup(|(_, _, m)| *m == motion)
                .map(|(_, name, _)| name.to_string())
                .unwrap_or_default(),
        }
    }
}

impl FromStr for Motion {
    type Err = MotionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if let Some((_, _, motion)) = lookup(|(key, name, _)| *key == input || *name == input) {
            return Ok(*motion);
        }

        let (name, target) = input.split_once(':').unwrap_or((input, ""));
        if let Some(kind) = SearchKind::from_name(name) {
            let mut target_chars = target.chars();
            return match (target_chars.next(), target_chars.next()) {
                (Some(target), None) => Ok(Motion::Search(CharSearch::new(kind, target))),
                (None, _) => Err(MotionError::MissingSearchTarget {
                    command: input.to_string(),
                }),
                _ => Err(unknown(input)),
            };
        }

        let mut chars = input.chars();
        if let Some(kind) = chars.next().and_then(SearchKind::from_key) {
            return match (chars.next(), chars.next()) {
                (Some(target), None) => Ok(Motion::Search(CharSearch::new(kind, target))),
                (None, _) => Err(MotionError::MissingSearchTarget {
                    command: input.to_string(),
                }),
                _ => Err(unknown(input)),
            };
        }

        Err(unknown(input))
    }
}

fn lookup(
    predicate: impl Fn(&&(&str, &str, Motion)) -> bool,
) -> Option<&'static (&'static str, &'static str, Motion)> {
    NOTATION.iter().find(predicate)
}

fn unknown(input: &str) -> MotionError {
    MotionError::UnknownMotion {
        name: input.to_string(),
    }
}

/// A motion with its repeat count.
///
/// `has_explicit_count` separates `G` (last row) from `1G` (first row): both
/// have `count == 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionRequest {
    pub motion: Motion,
    pub count: usize,
    pub has_explicit_count: bool,
}

impl MotionRequest {
    /// The motion once, without a typed count.
    pub const fn single(motion: Motion) -> Self {
        Self {
            motion,
            count: 1,
            has_explicit_count: false,
        }
    }

    /// The motion with a typed count. A zero count is raised to one.
    pub fn counted(motion: Motion, count: usize) -> Self {
        Self {
            motion,
            count: count.max(1),
            has_explicit_count: true,
        }
    }

    /// Key notation with the count baked in, e.g. `"5j"`.
    pub fn to_wire(&self) -> String {
        if self.has_explicit_count || self.count > 1 {
            format!("{}{}", self.count, self.motion.key())
        } else {
            self.motion.key()
        }
    }
}

impl FromStr for MotionRequest {
    type Err = MotionError;

    /// Parses an optional count prefix followed by a motion. A leading `0`
    /// is the line-start motion, never a count.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let digits = if input.starts_with('0') {
            0
        } else {
            input.bytes().take_while(u8::is_ascii_digit).count()
        };
        let (prefix, rest) = input.split_at(digits);
        let motion = rest.parse()?;

        if prefix.is_empty() {
            return Ok(Self::single(motion));
        }
        let count = prefix
            .parse::<usize>()
            .map_err(|_| MotionError::InvalidCount {
                input: input.to_string(),
            })?;
        Ok(Self::counted(motion, count))
    }
}

impl fmt::Display for MotionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}
