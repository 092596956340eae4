//! Wire format spoken with the game client.
//!
//! The client pushes JSON telemetry every few hundred milliseconds and a
//! `{"status": "game_over"}` notice when the player dies. We answer each
//! frame with `{"action": "jump" | "crouch" | "nothing"}`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const GAME_OVER: &str = "game_over";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub bottom: f32,
    pub right: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub right: f32,
    pub bottom: f32,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One tick of game state.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub player: PlayerPosition,
    pub obstacles: Vec<Obstacle>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    GameOver,
    Frame(Frame),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "playerPosition")]
    player_position: Option<PlayerPosition>,
    obstacles: Option<Vec<Obstacle>>,
    // informational only, so anything but a number is dropped
    score: Option<serde_json::Value>,
}

impl Telemetry {
    /// Decodes one message. `Ok(None)` means well-formed JSON we have no use
    /// for, such as the client's own `{"status": "restart"}`.
    pub fn parse(text: &str) -> Result<Option<Telemetry>> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Ok(None);
        }

        // the status alone decides a game over, whatever else came along
        if value.get("status").is_some_and(|status| status == GAME_OVER) {
            return Ok(Some(Telemetry::GameOver));
        }

        let raw: RawFrame = serde_json::from_value(value)?;
        match (raw.player_position, raw.obstacles) {
            (Some(player), Some(obstacles)) => Ok(Some(Telemetry::Frame(Frame {
                player,
                obstacles,
                score: raw.score.as_ref().and_then(serde_json::Value::as_f64),
            }))),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Jump,
    Crouch,
    Nothing,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Jump, Action::Crouch, Action::Nothing];

    pub fn from_index(index: usize) -> Result<Action> {
        Self::ALL.get(index).copied().ok_or(Error::UnknownAction(index))
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Outbound `{"action": ...}` message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub action: Action,
}

impl Command {
    // any jump doubles as "start a new game" on the client
    pub const RESTART: Command = Command { action: Action::Jump };

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<Action> for Command {
    fn from(action: Action) -> Self {
        Command { action }
    }
}
