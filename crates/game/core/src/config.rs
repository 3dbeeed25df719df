/// Scoring and level rules applied by the [`GameEngine`](crate::engine::GameEngine).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Score awarded for landing on a collectible.
    pub collectible_points: u64,
    /// Whether a picked-up collectible reappears on another empty cell.
    pub respawn_collectibles: bool,
    /// Score at which the session completes. `None` never completes.
    pub target_score: Option<u64>,
}

impl GameConfig {
    pub const DEFAULT_COLLECTIBLE_POINTS: u64 = 10;

    pub fn new() -> Self {
        Self {
            collectible_points: Self::DEFAULT_COLLECTIBLE_POINTS,
            respawn_collectibles: true,
            target_score: None,
        }
    }

    #[must_use]
    pub fn with_target_score(mut self, target_score: u64) -> Self {
        self.target_score = Some(target_score);
        self
    }

    #[must_use]
    pub fn without_respawn(mut self) -> Self {
        self.respawn_collectibles = false;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
