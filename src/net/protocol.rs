//! Wire types exchanged with the engine's collaborators
//!
//! - input collaborator -> engine: [`Command`]
//! - engine -> renderer: [`RenderSnapshot`] (bincode frames or JSON)
//! - engine -> persistence: [`ScoreSubmission`] (JSON)

use serde::{Deserialize, Serialize};

use crate::game::state::{EntityId, Lane, SimulationPhase};

/// Abstract input command kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CommandKind {
    MoveLeft,
    MoveRight,
    Fire,
}

impl CommandKind {
    /// Lane delta for movement commands
    pub fn lane_delta(&self) -> Option<i32> {
        match self {
            CommandKind::MoveLeft => Some(-1),
            CommandKind::MoveRight => Some(1),
            CommandKind::Fire => None,
        }
    }
}

/// Input command with the time it was issued
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    /// Issue time in milliseconds on the input collaborator's clock
    pub timestamp_ms: u64,
}

impl Command {
    pub fn new(kind: CommandKind, timestamp_ms: u64) -> Self {
        Self { kind, timestamp_ms }
    }

    pub fn move_left(timestamp_ms: u64) -> Self {
        Self::new(CommandKind::MoveLeft, timestamp_ms)
    }

    pub fn move_right(timestamp_ms: u64) -> Self {
        Self::new(CommandKind::MoveRight, timestamp_ms)
    }

    pub fn fire(timestamp_ms: u64) -> Self {
        Self::new(CommandKind::Fire, timestamp_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObstacleSnapshot {
    pub id: EntityId,
    pub lane: Lane,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PowerUpSnapshot {
    pub id: EntityId,
    pub lane: Lane,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BulletSnapshot {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlayerSnapshot {
    pub lane: Lane,
    pub x: f32,
    pub lives: u32,
    pub can_attack: bool,
    pub invulnerable: bool,
    pub score: u64,
}

/// Read-only per-tick view for the renderer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderSnapshot {
    pub tick: u64,
    pub phase: SimulationPhase,
    pub player: PlayerSnapshot,
    pub obstacles: Vec<ObstacleSnapshot>,
    pub power_ups: Vec<PowerUpSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
}

impl RenderSnapshot {
    pub fn is_game_over(&self) -> bool {
        self.phase == SimulationPhase::GameOver
    }

    pub fn to_json(&self) -> Result<String, EncodeError> {
        serde_json::to_string(self).map_err(|e| EncodeError(e.to_string()))
    }
}

/// Final score handed to the persistence collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub name: String,
    pub score: u64,
}

impl ScoreSubmission {
    pub fn to_json(&self) -> Result<String, EncodeError> {
        serde_json::to_string(self).map_err(|e| EncodeError(e.to_string()))
    }

    pub fn from_json(data: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(data).map_err(|e| DecodeError(e.to_string()))
    }
}

/// Encode a message using bincode
/// Uses legacy config for fixed-size integers (simple to parse on the renderer side)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::serde::encode_to_vec(message, bincode::config::legacy())
        .map_err(|e| EncodeError(e.to_string()))
}

/// Decode a message using bincode
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DecodeError> {
    bincode::serde::decode_from_slice(data, bincode::config::legacy())
        .map(|(msg, _)| msg)
        .map_err(|e| DecodeError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, thiserror::Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(String);

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> RenderSnapshot {
        RenderSnapshot {
            tick: 42,
            phase: SimulationPhase::Running,
            player: PlayerSnapshot {
                lane: 1,
                x: 135.0,
                lives: 2,
                can_attack: true,
                invulnerable: false,
                score: 126,
            },
            obstacles: vec![ObstacleSnapshot { id: 1, lane: 0, x: 35.0, y: 100.0 }],
            power_ups: vec![PowerUpSnapshot { id: 2, lane: 3, x: 335.0, y: -30.0 }],
            bullets: vec![BulletSnapshot { id: 3, x: 154.5, y: 400.0 }],
        }
    }

    #[test]
    fn test_command_lane_delta() {
        assert_eq!(CommandKind::MoveLeft.lane_delta(), Some(-1));
        assert_eq!(CommandKind::MoveRight.lane_delta(), Some(1));
        assert_eq!(CommandKind::Fire.lane_delta(), None);
    }

    #[test]
    fn test_snapshot_bincode_frame() {
        let snapshot = sample_snapshot();
        let bytes = encode(&snapshot).unwrap();
        let decoded: RenderSnapshot = decode(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<RenderSnapshot, _> = decode(&[0xFF, 0x01]);
        assert!(result.is_err());
    }

    #[test]
    fn test_submission_json_shape() {
        let submission = ScoreSubmission {
            name: "kim".to_string(),
            score: 1234,
        };
        let json = submission.to_json().unwrap();
        assert_eq!(json, r#"{"name":"kim","score":1234}"#);
        assert_eq!(ScoreSubmission::from_json(&json).unwrap(), submission);
    }

    #[test]
    fn test_snapshot_json_contains_phase() {
        let json = sample_snapshot().to_json().unwrap();
        assert!(json.contains("\"phase\":\"Running\""));
        assert!(json.contains("\"can_attack\":true"));
    }
}
