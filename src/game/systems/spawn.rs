//! Random spawn policy
//!
//! Once per tick: maybe an obstacle wave, then maybe a star.
//!
//! An obstacle wave fills every lane but one. The empty lane is drawn
//! uniformly, so the player always has somewhere to go. Stars only land in
//! lanes with no obstacle inside the lookahead band at the top of the board,
//! and are silently skipped when every lane is blocked.

use bitvec::prelude::*;
use rand::Rng;
use smallvec::SmallVec;
use tracing::debug;

use crate::game::constants::{spawn::SCORE_PROBABILITY_DIVISOR, star};
use crate::game::difficulty::DifficultySetting;
use crate::game::lanes::Board;
use crate::game::state::{EntityId, EntityStore, Lane, Obstacle};

/// One obstacle wave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleWave {
    pub empty_lane: Lane,
    pub ids: SmallVec<[EntityId; 8]>,
}

/// What the spawn policy created this tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub wave: Option<ObstacleWave>,
    pub power_up: Option<EntityId>,
}

/// Per-tick obstacle wave probability (uncapped)
#[inline]
pub fn obstacle_probability(base_probability: f64, score: u64) -> f64 {
    base_probability + score as f64 / SCORE_PROBABILITY_DIVISOR
}

/// Whether stars can spawn at this score
#[inline]
pub fn power_ups_eligible(score: u64) -> bool {
    score > star::MIN_SCORE
}

/// Spawn an obstacle in every lane except one chosen uniformly at random
pub fn spawn_obstacle_wave<R: Rng>(store: &mut EntityStore, board: &Board, rng: &mut R) -> ObstacleWave {
    let lane_count = board.lanes.lane_count();
    let empty_lane = rng.gen_range(0..lane_count);
    let y = board.obstacle_entry_y();
    let ids = (0..lane_count)
        .filter(|lane| *lane != empty_lane)
        .map(|lane| store.add_obstacle(lane, y))
        .collect();
    ObstacleWave { empty_lane, ids }
}

/// Lanes with no obstacle above `lookahead_y`
pub fn free_lanes(obstacles: &[Obstacle], lane_count: usize, lookahead_y: f32) -> BitVec {
    let mut occupied = bitvec![0; lane_count];
    for obstacle in obstacles.iter().filter(|o| o.y < lookahead_y) {
        if obstacle.lane < lane_count {
            occupied.set(obstacle.lane, true);
        }
    }
    !occupied
}

/// Pick a lane for a star, or None if every lane is blocked near the top
pub fn pick_power_up_lane<R: Rng>(obstacles: &[Obstacle], lane_count: usize, rng: &mut R) -> Option<Lane> {
    let free = free_lanes(obstacles, lane_count, star::LOOKAHEAD_Y);
    let available: SmallVec<[Lane; 8]> = free.iter_ones().collect();
    if available.is_empty() {
        return None;
    }
    Some(available[rng.gen_range(0..available.len())])
}

/// Run the spawn policy for one tick
pub fn update<R: Rng>(
    store: &mut EntityStore,
    board: &Board,
    difficulty: &DifficultySetting,
    score: u64,
    rng: &mut R,
) -> SpawnReport {
    let mut report = SpawnReport::default();

    let roll: f64 = rng.gen();
    if roll < obstacle_probability(difficulty.base_spawn_probability, score) {
        let wave = spawn_obstacle_wave(store, board, rng);
        debug!(empty_lane = wave.empty_lane, count = wave.ids.len(), "obstacle wave");
        report.wave = Some(wave);
    }

    if power_ups_eligible(score) {
        let roll: f64 = rng.gen();
        if roll < star::SPAWN_RATE {
            if let Some(lane) = pick_power_up_lane(&store.obstacles, board.lanes.lane_count(), rng) {
                let id = store.add_power_up(lane, board.power_up_entry_y());
                debug!(lane, id, "star spawned");
                report.power_up = Some(id);
            }
        }
    }

    report
}
