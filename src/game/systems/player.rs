//! Player state machine
//!
//! `Alive -> Invulnerable -> Alive` on a survivable hit, `-> GameOver` on the
//! last life. Commands move the car and fire bullets; collision events cost
//! lives or grant power-ups. GameOver is terminal: everything that reaches
//! this module afterwards is ignored.

use tracing::{debug, info};

use crate::game::constants::scoring::STAR_BONUS;
use crate::game::lanes::Board;
use crate::game::state::{EntityId, GameState, Lane, SimulationPhase};
use crate::game::systems::collision::CollisionEvent;
use crate::net::protocol::{Command, CommandKind};

/// Observable outcome of a player transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    Moved {
        from: Lane,
        to: Lane,
    },
    Fired {
        bullet_id: EntityId,
        x: f32,
        y: f32,
    },
    ObstacleDestroyed {
        bullet_id: EntityId,
        obstacle_id: EntityId,
    },
    LifeLost {
        lives_left: u32,
        invulnerable_until_tick: u64,
    },
    PowerUpCollected {
        power_up_id: EntityId,
        lives: u32,
    },
    GameOver {
        final_score: u64,
    },
}

/// How a drained command was handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutcome {
    Applied(PlayerEvent),
    /// Rejected by the per-kind debounce window
    Debounced,
    /// Not applicable in the current state (fire while unarmed, or GameOver)
    Ignored,
}

/// End the invulnerability window once `now` reaches it
pub fn expire_invulnerability(state: &mut GameState, now: u64) -> bool {
    match state.player.invulnerable_until_tick {
        Some(until) if now >= until => {
            state.player.invulnerable_until_tick = None;
            debug!(tick = now, "invulnerability expired");
            true
        }
        _ => false,
    }
}

/// Apply one input command
pub fn apply_command(state: &mut GameState, board: &Board, command: &Command) -> CommandOutcome {
    if state.is_game_over() {
        return CommandOutcome::Ignored;
    }

    match command.kind {
        CommandKind::Fire => {
            // Unarmed fire does not consume the debounce window
            if !state.player.can_attack {
                return CommandOutcome::Ignored;
            }
            if !state.debounce.is_ready(command.kind, command.timestamp_ms) {
                return CommandOutcome::Debounced;
            }
            state.debounce.record(command.kind, command.timestamp_ms);
            let (x, y) = board.bullet_origin(state.player.lane);
            let bullet_id = state.entities.add_bullet(x, y);
            CommandOutcome::Applied(PlayerEvent::Fired { bullet_id, x, y })
        }
        CommandKind::MoveLeft | CommandKind::MoveRight => {
            if !state.debounce.is_ready(command.kind, command.timestamp_ms) {
                return CommandOutcome::Debounced;
            }
            state.debounce.record(command.kind, command.timestamp_ms);
            let from = state.player.lane;
            let delta = command.kind.lane_delta().unwrap_or(0);
            let to = board.lanes.step(from, delta);
            state.player.lane = to;
            CommandOutcome::Applied(PlayerEvent::Moved { from, to })
        }
    }
}

/// Apply one collision event at tick `now`
pub fn apply_collision(
    state: &mut GameState,
    event: &CollisionEvent,
    now: u64,
    invulnerability_ticks: u64,
) -> Option<PlayerEvent> {
    if state.is_game_over() {
        return None;
    }

    match *event {
        CollisionEvent::BulletHitObstacle {
            bullet_id,
            obstacle_id,
        } => {
            state.entities.mark_removed(bullet_id);
            state.entities.mark_removed(obstacle_id);
            Some(PlayerEvent::ObstacleDestroyed {
                bullet_id,
                obstacle_id,
            })
        }
        CollisionEvent::PlayerHitObstacle(obstacle_id) => {
            if state.player.is_invulnerable(now) {
                return None;
            }
            // The obstacle goes away whatever the outcome
            state.entities.mark_removed(obstacle_id);

            if state.player.lives > 1 {
                let until = now.saturating_add(invulnerability_ticks);
                state.player.lives -= 1;
                state.player.can_attack = false;
                state.player.invulnerable_until_tick = Some(until);
                info!(tick = now, lives = state.player.lives, until, "life lost");
                Some(PlayerEvent::LifeLost {
                    lives_left: state.player.lives,
                    invulnerable_until_tick: until,
                })
            } else {
                state.player.lives = 0;
                state.player.invulnerable_until_tick = None;
                state.phase = SimulationPhase::GameOver;
                let final_score = state.score.value();
                state.final_score = Some(final_score);
                info!(tick = now, final_score, "game over");
                Some(PlayerEvent::GameOver { final_score })
            }
        }
        CollisionEvent::PlayerHitPowerUp(power_up_id) => {
            state.entities.mark_removed(power_up_id);
            state.player.lives += 1;
            state.player.can_attack = true;
            state.score.add(STAR_BONUS);
            debug!(tick = now, lives = state.player.lives, "star collected");
            Some(PlayerEvent::PowerUpCollected {
                power_up_id,
                lives: state.player.lives,
            })
        }
    }
}
