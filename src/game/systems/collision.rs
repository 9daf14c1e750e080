//! Collision detection
//!
//! Pure function over the entity store and player state. Produces events;
//! applying them (removals, life loss, bonuses) is the player state
//! machine's job.
//!
//! Pass order within a tick:
//! 1. bullets vs obstacles: each bullet consumes at most one obstacle and
//!    each obstacle absorbs at most one bullet
//! 2. player vs obstacles: skipped while invulnerable, first match only,
//!    obstacles destroyed in pass 1 are ignored
//! 3. player vs stars: first match only

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::game::lanes::Board;
use crate::game::state::{EntityId, EntityStore, PlayerState};

/// Collision outcome for a single pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    PlayerHitObstacle(EntityId),
    PlayerHitPowerUp(EntityId),
    BulletHitObstacle {
        bullet_id: EntityId,
        obstacle_id: EntityId,
    },
}

pub type CollisionEvents = SmallVec<[CollisionEvent; 8]>;

/// Detect all collisions for this tick
pub fn detect(store: &EntityStore, player: &PlayerState, board: &Board, tick: u64) -> CollisionEvents {
    let mut events = CollisionEvents::new();
    let destroyed = bullet_pass(store, board, &mut events);

    let player_rect = board.player_rect(player.lane);

    if !player.is_invulnerable(tick) {
        let hit = store
            .obstacles
            .iter()
            .filter(|o| !destroyed.contains(&o.id))
            .find(|o| board.obstacle_rect(o).overlaps(&player_rect));
        if let Some(obstacle) = hit {
            events.push(CollisionEvent::PlayerHitObstacle(obstacle.id));
        }
    }

    let pickup = store
        .power_ups
        .iter()
        .find(|p| board.power_up_rect(p).overlaps(&player_rect));
    if let Some(power_up) = pickup {
        events.push(CollisionEvent::PlayerHitPowerUp(power_up.id));
    }

    events
}

/// Bullet vs obstacle pairs. Returns the ids of destroyed obstacles.
fn bullet_pass(store: &EntityStore, board: &Board, events: &mut CollisionEvents) -> FxHashSet<EntityId> {
    let mut destroyed = FxHashSet::default();
    for bullet in &store.bullets {
        let bullet_rect = board.bullet_rect(bullet);
        let hit = store
            .obstacles
            .iter()
            .filter(|o| !destroyed.contains(&o.id))
            .find(|o| board.obstacle_rect(o).overlaps(&bullet_rect));
        if let Some(obstacle) = hit {
            destroyed.insert(obstacle.id);
            events.push(CollisionEvent::BulletHitObstacle {
                bullet_id: bullet.id,
                obstacle_id: obstacle.id,
            });
        }
    }
    destroyed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn setup() -> (EntityStore, PlayerState, Board) {
        let board = Board::from_config(&SimulationConfig::default());
        (EntityStore::new(), PlayerState::new(4), board)
    }

    /// y at which an obstacle overlaps the car's vertical band
    fn overlapping_y(board: &Board) -> f32 {
        board.player_y() + 10.0
    }

    #[test]
    fn test_no_events_on_empty_board() {
        let (store, player, board) = setup();
        assert!(detect(&store, &player, &board, 1).is_empty());
    }

    #[test]
    fn test_same_lane_obstacle_hits_player() {
        let (mut store, player, board) = setup();
        let id = store.add_obstacle(player.lane, overlapping_y(&board));

        let events = detect(&store, &player, &board, 1);
        assert_eq!(events.as_slice(), &[CollisionEvent::PlayerHitObstacle(id)]);
    }

    #[test]
    fn test_other_lane_obstacle_misses() {
        let (mut store, player, board) = setup();
        store.add_obstacle(player.lane + 2, overlapping_y(&board));
        assert!(detect(&store, &player, &board, 1).is_empty());
    }

    #[test]
    fn test_obstacle_above_band_misses() {
        let (mut store, player, board) = setup();
        // Bottom edge exactly on the car's top edge: touching is not overlap
        store.add_obstacle(player.lane, board.player_y() - 45.0);
        assert!(detect(&store, &player, &board, 1).is_empty());
    }

    #[test]
    fn test_multiple_overlaps_report_first_only() {
        let (mut store, player, board) = setup();
        let first = store.add_obstacle(player.lane, overlapping_y(&board));
        store.add_obstacle(player.lane, overlapping_y(&board) + 5.0);
        store.add_obstacle(player.lane, overlapping_y(&board) - 20.0);

        let events = detect(&store, &player, &board, 1);
        assert_eq!(events.as_slice(), &[CollisionEvent::PlayerHitObstacle(first)]);
    }

    #[test]
    fn test_invulnerable_player_ignores_obstacles() {
        let (mut store, mut player, board) = setup();
        store.add_obstacle(player.lane, overlapping_y(&board));
        player.invulnerable_until_tick = Some(20);

        assert!(detect(&store, &player, &board, 5).is_empty());
        assert_eq!(detect(&store, &player, &board, 20).len(), 1);
    }

    #[test]
    fn test_invulnerable_player_still_collects_stars() {
        let (mut store, mut player, board) = setup();
        let star = store.add_power_up(player.lane, overlapping_y(&board));
        player.invulnerable_until_tick = Some(20);

        let events = detect(&store, &player, &board, 5);
        assert_eq!(events.as_slice(), &[CollisionEvent::PlayerHitPowerUp(star)]);
    }

    #[test]
    fn test_bullet_consumes_single_obstacle() {
        let (mut store, player, board) = setup();
        let (x, _) = board.bullet_origin(0);
        let first = store.add_obstacle(0, 300.0);
        store.add_obstacle(0, 310.0);
        let bullet = store.add_bullet(x, 320.0);

        let events = detect(&store, &player, &board, 1);
        assert_eq!(
            events.as_slice(),
            &[CollisionEvent::BulletHitObstacle {
                bullet_id: bullet,
                obstacle_id: first,
            }]
        );
    }

    #[test]
    fn test_two_bullets_two_obstacles() {
        let (mut store, player, board) = setup();
        let (x, _) = board.bullet_origin(3);
        let a = store.add_obstacle(3, 300.0);
        let b = store.add_obstacle(3, 310.0);
        let b1 = store.add_bullet(x, 320.0);
        let b2 = store.add_bullet(x, 325.0);

        let events = detect(&store, &player, &board, 1);
        assert_eq!(
            events.as_slice(),
            &[
                CollisionEvent::BulletHitObstacle { bullet_id: b1, obstacle_id: a },
                CollisionEvent::BulletHitObstacle { bullet_id: b2, obstacle_id: b },
            ]
        );
    }

    #[test]
    fn test_bullet_saves_player() {
        let (mut store, player, board) = setup();
        let y = overlapping_y(&board);
        let (x, _) = board.bullet_origin(player.lane);
        let obstacle = store.add_obstacle(player.lane, y);
        let bullet = store.add_bullet(x, y + 5.0);

        let events = detect(&store, &player, &board, 1);
        assert_eq!(
            events.as_slice(),
            &[CollisionEvent::BulletHitObstacle {
                bullet_id: bullet,
                obstacle_id: obstacle,
            }]
        );
    }

    #[test]
    fn test_star_pickup_first_match() {
        let (mut store, player, board) = setup();
        let first = store.add_power_up(player.lane, overlapping_y(&board));
        store.add_power_up(player.lane, overlapping_y(&board) + 1.0);

        let events = detect(&store, &player, &board, 1);
        assert_eq!(events.as_slice(), &[CollisionEvent::PlayerHitPowerUp(first)]);
    }
}
