//! Lane Dodger simulation library
//!
//! A fixed-tick, lane-based dodge-and-shoot simulation. A car sits at the
//! bottom of a board split into lanes; obstacle waves and stars fall from
//! the top, the car changes lanes and fires bullets once it holds a star.
//!
//! The engine renders nothing and reads no devices. Input arrives as
//! abstract [`net::protocol::Command`]s through a bounded queue, and the
//! state leaves as [`net::protocol::RenderSnapshot`]s.

pub mod config;
pub mod util;
pub mod game;
pub mod net;
pub mod metrics;
