pub mod autopilot;
pub mod collision;
pub mod movement;
pub mod player;
pub mod spawn;
