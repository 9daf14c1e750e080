//! Difficulty table
//!
//! Each tier maps to a base descent speed and a base obstacle spawn
//! probability. Higher tiers strictly dominate lower tiers in both.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Difficulty tier selected once at construction
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 3] = [Self::Easy, Self::Normal, Self::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }

    /// Settings for this tier
    pub fn settings(&self) -> DifficultySetting {
        settings_for(*self)
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty '{0}' (expected easy, normal or hard)")]
pub struct ParseDifficultyError(pub String);

impl FromStr for DifficultyTier {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Immutable per-tier tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DifficultySetting {
    pub tier: DifficultyTier,
    /// Base descent in pixels per tick for obstacles and stars
    pub base_speed: f32,
    /// Base per-tick probability of an obstacle wave
    pub base_spawn_probability: f64,
}

/// Look up the fixed table entry for a tier
pub fn settings_for(tier: DifficultyTier) -> DifficultySetting {
    let (base_speed, base_spawn_probability) = match tier {
        DifficultyTier::Easy => (2.0, 0.004),
        DifficultyTier::Normal => (4.0, 0.008),
        DifficultyTier::Hard => (6.0, 0.013),
    };
    DifficultySetting {
        tier,
        base_speed,
        base_spawn_probability,
    }
}
