//! JSON message contract with the authoritative source.
//!
//! Outbound moves carry the motion in key notation (`"5j"`, `"fx"`, `"gg"`)
//! so the authority can parse it with the same rules the client used.
//! Inbound traffic is either a [`MoveResponse`] correlated with one move, or
//! an unsolicited [`PushMessage`] tagged by `type`.
use serde::{Deserialize, Serialize};

use game_core::{ActorId, MotionError, MotionRequest, OpponentState, PlayerState, Position};

use crate::api::DispatchError;
use crate::pipeline::MoveId;

/// A move sent for validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMessage {
    pub direction: String,
    pub move_id: MoveId,
}

impl MoveMessage {
    pub fn new(move_id: MoveId, request: &MotionRequest) -> Self {
        Self {
            direction: request.to_wire(),
            move_id,
        }
    }

    /// Parses `direction` back into a request.
    pub fn request(&self) -> Result<MotionRequest, MotionError> {
        self.direction.parse()
    }
}

/// Verdict on a single move.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_score: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl MoveResponse {
    pub fn accepted(position: Position, score: u64, completed: bool) -> Self {
        Self {
            success: true,
            new_position: Some(position),
            new_score: Some(score),
            error: None,
            completed: Some(completed),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Unsolicited updates from the authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// Another actor moved or scored.
    Opponent {
        id: ActorId,
        position: Position,
        score: u64,
    },
    /// Another actor left the session.
    OpponentLeft { id: ActorId },
    /// The authoritative collectible set.
    Collectibles { positions: Vec<Position> },
    /// Complete authoritative snapshot. `lines` replaces the level when set.
    FullState {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lines: Option<Vec<String>>,
        player: PlayerState,
        #[serde(default)]
        opponents: Vec<OpponentState>,
        #[serde(default)]
        collectibles: Vec<Position>,
        #[serde(default)]
        completed: bool,
    },
}

pub fn encode<T: Serialize>(message: &T) -> Result<String, DispatchError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode_response(text: &str) -> Result<MoveResponse, DispatchError> {
    Ok(serde_json::from_str(text)?)
}

pub fn decode_push(text: &str) -> Result<PushMessage, DispatchError> {
    Ok(serde_json::from_str(text)?)
}
