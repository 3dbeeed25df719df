//! Level loading.
//!
//! A level file is JSON:
//!
//! ```json
//! {
//!   "lines": ["hello world", "vim motions"],
//!   "start": { "row": 0, "col": 0 },
//!   "collectibles": [{ "row": 1, "col": 4 }],
//!   "seed": 7
//! }
//! ```
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use game_core::{GameState, Position, TextGrid};

const DEMO_LEVEL: &str = r#"{
  "lines": [
    "fn main() {",
    "    let words = vec![\"hjkl\", \"wbe\", \"f;,\"];",
    "    for (i, w) in words.iter().enumerate() {",
    "        println!(\"{i}: {w}\");",
    "    }",
    "}",
    "",
    "Move with vim motions. Collect the stars.",
    "Counts work too: 3w, 2j, 5l."
  ],
  "start": { "row": 0, "col": 0 },
  "collectibles": [
    { "row": 1, "col": 20 },
    { "row": 2, "col": 30 },
    { "row": 7, "col": 5 },
    { "row": 8, "col": 21 }
  ],
  "seed": 2024
}"#;

#[derive(Debug, Deserialize)]
struct LevelFile {
    lines: Vec<String>,
    #[serde(default)]
    start: Position,
    #[serde(default)]
    collectibles: Vec<Position>,
    #[serde(default)]
    seed: u64,
}

/// Loads the level at `path`, or the built-in demo when `path` is `None`.
pub fn load(path: Option<&Path>, seed: Option<u64>) -> Result<GameState> {
    let text = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read level file {}", path.display()))?,
        None => DEMO_LEVEL.to_string(),
    };
    parse(&text, seed)
}

fn parse(text: &str, seed: Option<u64>) -> Result<GameState> {
    let level: LevelFile = serde_json::from_str(text).context("malformed level file")?;
    let state = GameState::with_seed(
        seed.unwrap_or(level.seed),
        TextGrid::from_lines(&level.lines),
        level.start,
    )
    .context("invalid level")?;
    Ok(state.with_collectibles(level.collectibles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_demo_level_loads() {
        let state = load(None, None).unwrap();
        assert_eq!(state.player.position, Position::ORIGIN);
        assert_eq!(state.game_seed, 2024);
        assert_eq!(state.collectibles.len(), 4);
    }

    #[test]
    fn test_level_file_with_seed_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"lines":["abc","def"],"start":{{"row":1,"col":2}},"collectibles":[{{"row":0,"col":1}}]}}"#
        )
        .unwrap();

        let state = load(Some(file.path()), Some(99)).unwrap();
        assert_eq!(state.player.position, Position::new(1, 2));
        assert_eq!(state.game_seed, 99);
        assert!(state.collectibles.contains(&Position::new(0, 1)));
    }

    #[test]
    fn test_start_on_blank_row_is_rejected() {
        let error = parse(r#"{"lines":["abc",""],"start":{"row":1,"col":0}}"#, None).unwrap_err();
        assert!(format!("{error:#}").contains("invalid level"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let error = load(Some(Path::new("/nonexistent/level.json")), None).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/level.json"));
    }
}
