//! Game state definitions and structures
//!
//! Contains the entity store (obstacles, stars, bullets), the player state
//! and the aggregate state owned by the simulation.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::game::constants::{player, starting_lane};
use crate::game::input_buffer::Debouncer;

/// Entity identifier, unique for the lifetime of a run
pub type EntityId = u64;

/// Lane index in `[0, lane_count)`
pub type Lane = usize;

/// Descending obstacle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Obstacle {
    pub id: EntityId,
    pub lane: Lane,
    pub y: f32,
}

/// Descending star power-up
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PowerUp {
    pub id: EntityId,
    pub lane: Lane,
    pub y: f32,
}

/// Bullet travelling up from the car
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bullet {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
}

/// Live entity collections
///
/// Vectors stay in spawn order (ids are allocated monotonically), so
/// iteration order is deterministic. Removals requested during a collision
/// pass go into `pending_removal` and are applied by `flush_removals`, so no
/// collection is filtered while another pass is still iterating it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    pub obstacles: Vec<Obstacle>,
    pub power_ups: Vec<PowerUp>,
    pub bullets: Vec<Bullet>,
    pending_removal: FxHashSet<EntityId>,
    next_entity_id: EntityId,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a new unique entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.next_entity_id += 1;
        self.next_entity_id
    }

    pub fn add_obstacle(&mut self, lane: Lane, y: f32) -> EntityId {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle { id, lane, y });
        id
    }

    pub fn add_power_up(&mut self, lane: Lane, y: f32) -> EntityId {
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp { id, lane, y });
        id
    }

    pub fn add_bullet(&mut self, x: f32, y: f32) -> EntityId {
        let id = self.next_entity_id();
        self.bullets.push(Bullet { id, x, y });
        id
    }

    pub fn get_obstacle(&self, id: EntityId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    pub fn get_power_up(&self, id: EntityId) -> Option<&PowerUp> {
        self.power_ups.iter().find(|p| p.id == id)
    }

    /// Schedule an entity for removal. Returns false if it was already scheduled.
    pub fn mark_removed(&mut self, id: EntityId) -> bool {
        self.pending_removal.insert(id)
    }

    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.pending_removal.contains(&id)
    }

    /// Apply all scheduled removals. Returns the number of entities removed.
    pub fn flush_removals(&mut self) -> usize {
        if self.pending_removal.is_empty() {
            return 0;
        }
        let before = self.entity_count();
        let pending = std::mem::take(&mut self.pending_removal);
        self.obstacles.retain(|o| !pending.contains(&o.id));
        self.power_ups.retain(|p| !pending.contains(&p.id));
        self.bullets.retain(|b| !pending.contains(&b.id));
        before - self.entity_count()
    }

    pub fn entity_count(&self) -> usize {
        self.obstacles.len() + self.power_ups.len() + self.bullets.len()
    }
}

/// Player state, mutated only by the player state machine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerState {
    pub lane: Lane,
    pub lives: u32,
    pub can_attack: bool,
    /// First tick at which the player is vulnerable again
    pub invulnerable_until_tick: Option<u64>,
}

impl PlayerState {
    pub fn new(lane_count: usize) -> Self {
        Self {
            lane: starting_lane(lane_count),
            lives: player::STARTING_LIVES,
            can_attack: false,
            invulnerable_until_tick: None,
        }
    }

    /// Check if the invulnerability window covers `tick`
    pub fn is_invulnerable(&self, tick: u64) -> bool {
        self.invulnerable_until_tick.is_some_and(|until| tick < until)
    }
}

/// Player lifecycle as seen from outside
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerStatus {
    Alive,
    Invulnerable { until_tick: u64 },
    GameOver,
}

/// Run phase
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SimulationPhase {
    /// Ticks advance the world
    #[default]
    Running,
    /// Terminal; ticks are no-ops until restart
    GameOver,
}

/// Score that can only grow
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Score(u64);

impl Score {
    pub const ZERO: Score = Score(0);

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn add(&mut self, points: u64) {
        self.0 = self.0.saturating_add(points);
    }
}

/// Complete game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Completed ticks
    pub tick: u64,
    pub phase: SimulationPhase,
    pub score: Score,
    /// Score frozen at the moment GameOver was entered
    pub final_score: Option<u64>,
    pub player: PlayerState,
    pub entities: EntityStore,
    /// Per-kind last accepted command timestamps
    pub debounce: Debouncer,
}

impl GameState {
    pub fn new(lane_count: usize) -> Self {
        Self {
            tick: 0,
            phase: SimulationPhase::Running,
            score: Score::ZERO,
            final_score: None,
            player: PlayerState::new(lane_count),
            entities: EntityStore::new(),
            debounce: Debouncer::default(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == SimulationPhase::GameOver
    }

    /// Player status at the current tick
    pub fn player_status(&self) -> PlayerStatus {
        if self.is_game_over() {
            return PlayerStatus::GameOver;
        }
        match self.player.invulnerable_until_tick {
            Some(until_tick) if self.player.is_invulnerable(self.tick) => {
                PlayerStatus::Invulnerable { until_tick }
            }
            _ => PlayerStatus::Alive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_new() {
        let player = PlayerState::new(4);
        assert_eq!(player.lane, 1);
        assert_eq!(player.lives, 1);
        assert!(!player.can_attack);
        assert_eq!(player.invulnerable_until_tick, None);
    }

    #[test]
    fn test_invulnerability_window() {
        let mut player = PlayerState::new(4);
        assert!(!player.is_invulnerable(5));
        player.invulnerable_until_tick = Some(10);
        assert!(player.is_invulnerable(9));
        assert!(!player.is_invulnerable(10));
    }

    #[test]
    fn test_entity_ids_unique_across_kinds() {
        let mut store = EntityStore::new();
        let a = store.add_obstacle(0, -45.0);
        let b = store.add_power_up(1, -30.0);
        let c = store.add_bullet(10.0, 500.0);
        assert!(a < b && b < c);
        assert_eq!(store.entity_count(), 3);
    }

    #[test]
    fn test_flush_removals() {
        let mut store = EntityStore::new();
        let a = store.add_obstacle(0, 0.0);
        let b = store.add_obstacle(1, 0.0);
        let c = store.add_bullet(0.0, 0.0);

        assert!(store.mark_removed(a));
        assert!(!store.mark_removed(a));
        assert!(store.mark_removed(c));
        assert!(store.is_pending_removal(a));

        assert_eq!(store.flush_removals(), 2);
        assert_eq!(store.obstacles.len(), 1);
        assert_eq!(store.obstacles[0].id, b);
        assert!(store.bullets.is_empty());
        assert!(!store.is_pending_removal(a));
        assert_eq!(store.flush_removals(), 0);
    }

    #[test]
    fn test_score_only_grows() {
        let mut score = Score::ZERO;
        score.add(3);
        score.add(20);
        assert_eq!(score.value(), 23);
        score.add(u64::MAX);
        assert_eq!(score.value(), u64::MAX);
    }

    #[test]
    fn test_player_status() {
        let mut state = GameState::new(4);
        assert_eq!(state.player_status(), PlayerStatus::Alive);

        state.player.invulnerable_until_tick = Some(50);
        state.tick = 10;
        assert_eq!(state.player_status(), PlayerStatus::Invulnerable { until_tick: 50 });

        state.tick = 50;
        assert_eq!(state.player_status(), PlayerStatus::Alive);

        state.phase = SimulationPhase::GameOver;
        assert_eq!(state.player_status(), PlayerStatus::GameOver);
    }
}
