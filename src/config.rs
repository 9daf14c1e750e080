use std::time::Duration;

use crate::game::constants::{board, bullet, car, ms_to_ticks, obstacle, player, star, timing};
use crate::game::difficulty::{DifficultyTier, ParseDifficultyError};

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("lane_count must be at least 2 (got {0})")]
    TooFewLanes(usize),
    #[error("board must be positive (got {width}x{height})")]
    InvalidBoard { width: f32, height: f32 },
    #[error("lane width {lane_width} is narrower than obstacle width {obstacle_width}")]
    LaneTooNarrow { lane_width: f32, obstacle_width: f32 },
    #[error("entity dimensions must be positive")]
    InvalidDimensions,
    #[error("tick_interval_ms must be > 0")]
    ZeroTickInterval,
    #[error(transparent)]
    Difficulty(#[from] ParseDifficultyError),
}

/// Pixel sizes of every entity kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityDimensions {
    pub car_width: f32,
    pub car_height: f32,
    /// Gap between the car and the bottom of the board
    pub car_margin: f32,
    pub obstacle_width: f32,
    pub obstacle_height: f32,
    pub star_size: f32,
    pub bullet_width: f32,
    pub bullet_height: f32,
}

impl Default for EntityDimensions {
    fn default() -> Self {
        Self {
            car_width: car::WIDTH,
            car_height: car::HEIGHT,
            car_margin: car::BOTTOM_MARGIN,
            obstacle_width: obstacle::WIDTH,
            obstacle_height: obstacle::HEIGHT,
            star_size: star::SIZE,
            bullet_width: bullet::WIDTH,
            bullet_height: bullet::HEIGHT,
        }
    }
}

impl EntityDimensions {
    fn all_positive(&self) -> bool {
        [
            self.car_width,
            self.car_height,
            self.obstacle_width,
            self.obstacle_height,
            self.star_size,
            self.bullet_width,
            self.bullet_height,
        ]
        .iter()
        .all(|v| *v > 0.0)
            && self.car_margin >= 0.0
    }
}

/// Simulation configuration, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Number of lanes
    pub lane_count: usize,
    /// Board width in pixels
    pub board_width: f32,
    /// Board height in pixels
    pub board_height: f32,
    /// Difficulty tier
    pub difficulty: DifficultyTier,
    /// Entity sizes
    pub dimensions: EntityDimensions,
    /// Fixed tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Invulnerability window after a life is lost
    pub invulnerability_ms: u64,
    /// RNG seed (None = seed from entropy)
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lane_count: board::LANE_COUNT,
            board_width: board::WIDTH,
            board_height: board::HEIGHT,
            difficulty: DifficultyTier::Normal,
            dimensions: EntityDimensions::default(),
            tick_interval_ms: timing::TICK_INTERVAL_MS,
            invulnerability_ms: player::INVULNERABILITY_MS,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(lanes) = std::env::var("LANE_COUNT") {
            match lanes.parse::<usize>() {
                Ok(parsed) if (2..=16).contains(&parsed) => config.lane_count = parsed,
                Ok(_) => tracing::warn!("LANE_COUNT must be 2-16, using default"),
                Err(_) => tracing::warn!("Invalid LANE_COUNT '{}', using default", lanes),
            }
        }

        if let Ok(width) = std::env::var("BOARD_WIDTH") {
            match width.parse::<f32>() {
                Ok(parsed) if parsed > 0.0 => config.board_width = parsed,
                _ => tracing::warn!("Invalid BOARD_WIDTH '{}', using default", width),
            }
        }

        if let Ok(height) = std::env::var("BOARD_HEIGHT") {
            match height.parse::<f32>() {
                Ok(parsed) if parsed > 0.0 => config.board_height = parsed,
                _ => tracing::warn!("Invalid BOARD_HEIGHT '{}', using default", height),
            }
        }

        if let Ok(difficulty) = std::env::var("DIFFICULTY") {
            match difficulty.parse::<DifficultyTier>() {
                Ok(tier) => config.difficulty = tier,
                Err(e) => tracing::warn!("{}, using default", e),
            }
        }

        if let Ok(interval) = std::env::var("TICK_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(parsed) if parsed > 0 => config.tick_interval_ms = parsed,
                _ => tracing::warn!("Invalid TICK_INTERVAL_MS '{}', using default", interval),
            }
        }

        if let Ok(invuln) = std::env::var("INVULNERABILITY_MS") {
            match invuln.parse::<u64>() {
                Ok(parsed) => config.invulnerability_ms = parsed,
                Err(_) => tracing::warn!("Invalid INVULNERABILITY_MS '{}', using default", invuln),
            }
        }

        if let Ok(seed) = std::env::var("SIM_SEED") {
            match seed.parse::<u64>() {
                Ok(parsed) => config.seed = Some(parsed),
                Err(_) => tracing::warn!("Invalid SIM_SEED '{}', seeding from entropy", seed),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lane_count < 2 {
            return Err(ConfigError::TooFewLanes(self.lane_count));
        }
        if self.board_width <= 0.0 || self.board_height <= 0.0 {
            return Err(ConfigError::InvalidBoard {
                width: self.board_width,
                height: self.board_height,
            });
        }
        if !self.dimensions.all_positive() {
            return Err(ConfigError::InvalidDimensions);
        }
        let lane_width = self.lane_width();
        if lane_width < self.dimensions.obstacle_width {
            return Err(ConfigError::LaneTooNarrow {
                lane_width,
                obstacle_width: self.dimensions.obstacle_width,
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    /// Width of a single lane
    pub fn lane_width(&self) -> f32 {
        self.board_width / self.lane_count.max(1) as f32
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Invulnerability window expressed in ticks
    pub fn invulnerability_ticks(&self) -> u64 {
        ms_to_ticks(self.invulnerability_ms, self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.lane_count, 4);
        assert_eq!(config.board_width, 400.0);
        assert_eq!(config.board_height, 600.0);
        assert_eq!(config.tick_interval_ms, 20);
        assert_eq!(config.difficulty, DifficultyTier::Normal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invulnerability_ticks() {
        let config = SimulationConfig::default();
        assert_eq!(config.invulnerability_ticks(), 100);
    }

    #[test]
    fn test_validate_rejects_single_lane() {
        let config = SimulationConfig {
            lane_count: 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TooFewLanes(1)));
    }

    #[test]
    fn test_validate_rejects_narrow_lanes() {
        let config = SimulationConfig {
            lane_count: 16,
            board_width: 100.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LaneTooNarrow { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_tick() {
        let config = SimulationConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickInterval));
    }

    #[test]
    fn test_validate_rejects_bad_dimensions() {
        let mut config = SimulationConfig::default();
        config.dimensions.bullet_height = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidDimensions));
    }

    #[test]
    fn test_load_or_default() {
        let config = SimulationConfig::load_or_default();
        assert!(config.lane_count >= 2);
        assert!(config.tick_interval_ms > 0);
    }
}
