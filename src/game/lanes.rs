//! Lane grid and board layout
//!
//! Pure geometry: lane index to horizontal offset, and the bounding boxes
//! every entity occupies on the board.

use crate::config::{EntityDimensions, SimulationConfig};
use crate::game::state::{Bullet, Lane, Obstacle, PowerUp};
use crate::util::rect::Rect;

/// Precomputed lane offsets
#[derive(Debug, Clone, PartialEq)]
pub struct LaneGrid {
    lane_width: f32,
    positions: Vec<f32>,
}

impl LaneGrid {
    /// Build the grid. An entity of `entity_width` placed at `lane_x` is
    /// centered in its lane.
    pub fn new(lane_count: usize, board_width: f32, entity_width: f32) -> Self {
        let lane_width = board_width / lane_count.max(1) as f32;
        let positions = (0..lane_count)
            .map(|lane| lane as f32 * lane_width + (lane_width - entity_width) / 2.0)
            .collect();
        Self {
            lane_width,
            positions,
        }
    }

    /// Horizontal offset of a lane. Lanes are always clamped upstream.
    #[inline]
    pub fn lane_x(&self, lane: Lane) -> f32 {
        debug_assert!(lane < self.positions.len(), "lane {} out of range", lane);
        self.positions[lane.min(self.positions.len() - 1)]
    }

    #[inline]
    pub fn lane_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn lane_width(&self) -> f32 {
        self.lane_width
    }

    #[inline]
    pub fn last_lane(&self) -> Lane {
        self.positions.len().saturating_sub(1)
    }

    /// Move `delta` lanes from `lane`, clamped to the board
    pub fn step(&self, lane: Lane, delta: i32) -> Lane {
        let target = lane as i64 + delta as i64;
        target.clamp(0, self.last_lane() as i64) as Lane
    }
}

/// Board layout: lane grid plus the fixed entity geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub width: f32,
    pub height: f32,
    pub lanes: LaneGrid,
    pub dimensions: EntityDimensions,
}

impl Board {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            width: config.board_width,
            height: config.board_height,
            lanes: LaneGrid::new(
                config.lane_count,
                config.board_width,
                config.dimensions.obstacle_width,
            ),
            dimensions: config.dimensions,
        }
    }

    /// Top edge of the player car
    #[inline]
    pub fn player_y(&self) -> f32 {
        self.height - self.dimensions.car_height - self.dimensions.car_margin
    }

    pub fn player_rect(&self, lane: Lane) -> Rect {
        Rect::new(
            self.lanes.lane_x(lane),
            self.player_y(),
            self.dimensions.car_width,
            self.dimensions.car_height,
        )
    }

    pub fn obstacle_rect(&self, obstacle: &Obstacle) -> Rect {
        Rect::new(
            self.lanes.lane_x(obstacle.lane),
            obstacle.y,
            self.dimensions.obstacle_width,
            self.dimensions.obstacle_height,
        )
    }

    /// Stars are centered inside the obstacle-sized lane slot
    pub fn power_up_x(&self, lane: Lane) -> f32 {
        self.lanes.lane_x(lane) + (self.dimensions.obstacle_width - self.dimensions.star_size) / 2.0
    }

    pub fn power_up_rect(&self, power_up: &PowerUp) -> Rect {
        Rect::new(
            self.power_up_x(power_up.lane),
            power_up.y,
            self.dimensions.star_size,
            self.dimensions.star_size,
        )
    }

    pub fn bullet_rect(&self, bullet: &Bullet) -> Rect {
        Rect::new(
            bullet.x,
            bullet.y,
            self.dimensions.bullet_width,
            self.dimensions.bullet_height,
        )
    }

    /// Muzzle position for a bullet fired from `lane`
    pub fn bullet_origin(&self, lane: Lane) -> (f32, f32) {
        let x = self.lanes.lane_x(lane) + self.dimensions.car_width / 2.0
            - self.dimensions.bullet_width / 2.0;
        (x, self.player_y())
    }

    /// Entry height for new obstacles
    #[inline]
    pub fn obstacle_entry_y(&self) -> f32 {
        -self.dimensions.obstacle_height
    }

    /// Entry height for new stars
    #[inline]
    pub fn power_up_entry_y(&self) -> f32 {
        -self.dimensions.star_size
    }
}
