//! netpong - two-player network-synchronized Pong
//!
//! One peer (the host) runs the authoritative simulation; the other (the
//! client) renders received snapshots and reports only its own paddle.
//! A small relay pairs exactly one host with exactly one client and forwards
//! their traffic.
//!
//! Core modules:
//! - `sim`: deterministic simulation (physics, scoring, game state)
//! - `protocol`: closed message vocabulary and wire codec
//! - `reconcile`: per-message state reconciliation, parameterized by role
//! - `session`: transport-agnostic pairing state machine
//! - `relay`: TCP relay server driving a `session`
//! - `peer`: endpoint plumbing plus the host tick loop and client driver

pub mod peer;
pub mod protocol;
pub mod reconcile;
pub mod relay;
pub mod session;
pub mod sim;

pub use peer::{ClientGame, Endpoint, HostGame, PeerEvent};
pub use protocol::{LostReason, Message};
pub use reconcile::Role;
pub use sim::{BallState, GameState, PlayerId, PlayerState};

/// Game configuration constants
pub mod consts {
    /// Host tick rate; the sole pacing mechanism for the simulation
    pub const TICK_HZ: u32 = 60;

    /// Play field dimensions
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 500.0;

    /// Paddle dimensions
    pub const PADDLE_WIDTH: f32 = 15.0;
    pub const PADDLE_HEIGHT: f32 = 80.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    /// Serve speed at (re)spawn
    pub const BALL_SPAWN_SPEED: f32 = 5.0;
    /// Maximum ball speed
    pub const BALL_SPEED_MAX: f32 = 12.0;

    /// Speed multiplier on each paddle hit (the rally accelerates)
    pub const PADDLE_BOOST: f32 = 1.05;
    /// Vertical deflection per pixel of off-center paddle contact
    pub const SPIN_FACTOR: f32 = 0.1;

    /// First player to reach this score wins the round
    pub const WINNING_SCORE: u32 = 10;
}
