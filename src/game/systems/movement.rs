//! Per-tick entity motion and pruning
//!
//! Obstacles and stars descend by the same amount; bullets rise at a fixed
//! speed. Nothing reverses direction, and entities leave the store only by
//! crossing the board edge here or through a collision.

use tracing::trace;

use crate::game::constants::obstacle::SPEED_SCORE_STEP;
use crate::game::lanes::Board;
use crate::game::state::EntityStore;

/// Entities pruned this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub obstacles: usize,
    pub power_ups: usize,
    pub bullets: usize,
}

/// Descent per tick for the given base speed and score
///
/// Accelerates by one pixel for every `SPEED_SCORE_STEP` points, uncapped.
#[inline]
pub fn descent_speed(base_speed: f32, score: u64) -> f32 {
    base_speed + (score / SPEED_SCORE_STEP) as f32
}

/// Advance every entity by one tick and prune the ones that left the board
pub fn update(store: &mut EntityStore, board: &Board, descent: f32, bullet_speed: f32) -> PruneReport {
    let board_height = board.height;
    let bullet_floor = -board.dimensions.bullet_height;

    for obstacle in store.obstacles.iter_mut() {
        obstacle.y += descent;
    }
    for power_up in store.power_ups.iter_mut() {
        power_up.y += descent;
    }
    for bullet in store.bullets.iter_mut() {
        bullet.y -= bullet_speed;
    }

    let before = (store.obstacles.len(), store.power_ups.len(), store.bullets.len());
    store.obstacles.retain(|o| o.y < board_height);
    store.power_ups.retain(|p| p.y < board_height);
    store.bullets.retain(|b| b.y > bullet_floor);

    let report = PruneReport {
        obstacles: before.0 - store.obstacles.len(),
        power_ups: before.1 - store.power_ups.len(),
        bullets: before.2 - store.bullets.len(),
    };
    if report != PruneReport::default() {
        trace!(?report, "pruned off-board entities");
    }
    report
}
