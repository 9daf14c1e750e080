/// Board dimensions in pixels
pub mod board {
    /// Board width
    pub const WIDTH: f32 = 400.0;
    /// Board height
    pub const HEIGHT: f32 = 600.0;
    /// Number of lanes the board is split into
    pub const LANE_COUNT: usize = 4;
}

/// Player car dimensions
pub mod car {
    pub const WIDTH: f32 = 45.0;
    pub const HEIGHT: f32 = 70.0;
    /// Gap between the car's bottom edge and the bottom of the board
    pub const BOTTOM_MARGIN: f32 = 10.0;
}

/// Obstacle dimensions and descent scaling
pub mod obstacle {
    pub const WIDTH: f32 = 30.0;
    pub const HEIGHT: f32 = 45.0;
    /// Descent speed gains 1 px/tick for every this many points of score
    pub const SPEED_SCORE_STEP: u64 = 500;
}

/// Star (power-up) constants
pub mod star {
    /// Stars are square
    pub const SIZE: f32 = 30.0;
    /// Per-tick chance of spawning a star once eligible
    pub const SPAWN_RATE: f64 = 0.005;
    /// Stars only spawn once score is strictly above this
    pub const MIN_SCORE: u64 = 100;
    /// Obstacles above this y occupy their lane for star placement
    pub const LOOKAHEAD_Y: f32 = 200.0;
}

/// Bullet constants
pub mod bullet {
    pub const WIDTH: f32 = 6.0;
    pub const HEIGHT: f32 = 15.0;
    /// Upward travel per tick (independent of difficulty and score)
    pub const SPEED: f32 = 15.0;
}

/// Obstacle spawn scaling
pub mod spawn {
    /// Spawn probability grows by score / this divisor (uncapped)
    pub const SCORE_PROBABILITY_DIVISOR: f64 = 8000.0;
}

/// Scoring constants
pub mod scoring {
    /// Points awarded for every tick survived
    pub const PER_TICK: u64 = 3;
    /// Bonus for picking up a star
    pub const STAR_BONUS: u64 = 20;
}

/// Player constants
pub mod player {
    /// Lives at the start of a run
    pub const STARTING_LIVES: u32 = 1;
    /// Invulnerability window after losing a life
    pub const INVULNERABILITY_MS: u64 = 2000;
}

/// Input handling constants
pub mod input {
    /// Minimum time between accepted move commands
    pub const MOVE_DEBOUNCE_MS: u64 = 150;
    /// Minimum time between accepted fire commands
    pub const FIRE_DEBOUNCE_MS: u64 = 200;
    /// Command queue capacity (commands buffered between ticks)
    pub const QUEUE_CAPACITY: usize = 256;
}

/// Simulation timing
pub mod timing {
    /// Fixed tick interval (50 Hz)
    pub const TICK_INTERVAL_MS: u64 = 20;
}

/// Leaderboard constants
pub mod leaderboard {
    /// Number of entries retained
    pub const CAPACITY: usize = 10;
    /// Name recorded when a submission has none
    pub const ANONYMOUS: &str = "anonymous";
}

/// Starting lane for a lane count (left of center on even counts)
#[inline]
pub fn starting_lane(lane_count: usize) -> usize {
    (lane_count / 2).saturating_sub(1)
}

/// Convert a duration in milliseconds to a whole number of ticks (rounded up)
#[inline]
pub fn ms_to_ticks(ms: u64, tick_interval_ms: u64) -> u64 {
    if tick_interval_ms == 0 {
        return 0;
    }
    ms.div_ceil(tick_interval_ms)
}
