//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and
//! deterministic apart from the serve direction, which draws from the
//! caller's seeded RNG:
//! - Fixed timestep only
//! - No I/O or platform dependencies
//! - The host steps it; the client never does

pub mod state;
pub mod step;

pub use state::{BallState, GameState, PlayerId, PlayerState, clamp_paddle_y};
pub use step::{StepEvent, step};
