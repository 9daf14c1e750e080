//! Scripted driver for headless runs
//!
//! Reads render snapshots like any other collaborator and answers with
//! abstract commands. Dodges toward the nearest lane with no obstacle in
//! the danger band and shoots whatever is ahead when armed.

use crate::game::lanes::Board;
use crate::game::state::Lane;
use crate::net::protocol::{CommandKind, RenderSnapshot};

/// Default distance above the car that counts as danger
pub const DEFAULT_LOOKAHEAD: f32 = 160.0;

/// Autopilot decision mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutopilotBehavior {
    /// Current lane is clear
    Cruise,
    /// Current lane is blocked, heading for a clear one
    Dodge,
    /// Armed with something ahead in the lane
    Shoot,
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    board: Board,
    lookahead: f32,
}

impl Autopilot {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }

    pub fn with_lookahead(mut self, lookahead: f32) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Whether an obstacle in `lane` sits in the danger band above the car
    pub fn lane_blocked(&self, snapshot: &RenderSnapshot, lane: Lane) -> bool {
        let top = self.board.player_y() - self.lookahead;
        let bottom = self.board.player_y() + self.board.dimensions.car_height;
        let height = self.board.dimensions.obstacle_height;
        snapshot
            .obstacles
            .iter()
            .any(|o| o.lane == lane && o.y + height > top && o.y < bottom)
    }

    /// Nearest clear lane, preferring the left one on ties
    pub fn nearest_clear_lane(&self, snapshot: &RenderSnapshot) -> Option<Lane> {
        let current = snapshot.player.lane;
        (0..self.board.lanes.lane_count())
            .filter(|lane| !self.lane_blocked(snapshot, *lane))
            .min_by_key(|lane| (lane.abs_diff(current), *lane))
    }

    fn obstacle_ahead(&self, snapshot: &RenderSnapshot) -> bool {
        let player_y = self.board.player_y();
        snapshot
            .obstacles
            .iter()
            .any(|o| o.lane == snapshot.player.lane && o.y >= 0.0 && o.y < player_y)
    }

    pub fn behavior(&self, snapshot: &RenderSnapshot) -> AutopilotBehavior {
        if self.lane_blocked(snapshot, snapshot.player.lane) {
            AutopilotBehavior::Dodge
        } else if snapshot.player.can_attack && self.obstacle_ahead(snapshot) {
            AutopilotBehavior::Shoot
        } else {
            AutopilotBehavior::Cruise
        }
    }

    /// Next command, if any
    pub fn decide(&self, snapshot: &RenderSnapshot) -> Option<CommandKind> {
        if snapshot.is_game_over() {
            return None;
        }
        match self.behavior(snapshot) {
            AutopilotBehavior::Cruise => None,
            AutopilotBehavior::Shoot => Some(CommandKind::Fire),
            AutopilotBehavior::Dodge => match self.nearest_clear_lane(snapshot) {
                Some(target) if target < snapshot.player.lane => Some(CommandKind::MoveLeft),
                Some(target) if target > snapshot.player.lane => Some(CommandKind::MoveRight),
                _ if snapshot.player.can_attack => Some(CommandKind::Fire),
                _ => None,
            },
        }
    }
}
