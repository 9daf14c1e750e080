pub mod clock;
pub mod constants;
pub mod difficulty;
pub mod input_buffer;
pub mod lanes;
pub mod leaderboard;
pub mod performance;
pub mod simulation;
pub mod state;
pub mod systems;
