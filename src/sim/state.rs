//! Game state shared between host and client
//!
//! The host's copy is authoritative; the client's copy is whatever the last
//! SYNC carried, with its own paddle preserved (see `reconcile`).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Which side of the field a player defends. The host is always `P1`
/// (left); the client is always `P2` (right). Fixed at session join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerId {
    P1,
    P2,
}

/// One player's slice of the shared state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Top edge of the paddle, clamped to `[0, FIELD_HEIGHT - PADDLE_HEIGHT]`
    pub y: f32,
    pub score: u32,
    pub name: String,
    pub connected: bool,
}

impl PlayerState {
    fn new(name: &str, connected: bool) -> Self {
        Self {
            y: (FIELD_HEIGHT - PADDLE_HEIGHT) / 2.0,
            score: 0,
            name: name.to_string(),
            connected,
        }
    }

    /// Vertical center of the paddle, the reference point for spin
    pub fn paddle_center(&self) -> f32 {
        self.y + PADDLE_HEIGHT / 2.0
    }
}

/// Clamp a paddle offset into the play field
pub fn clamp_paddle_y(y: f32) -> f32 {
    y.clamp(0.0, FIELD_HEIGHT - PADDLE_HEIGHT)
}

/// Ball kinematics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl BallState {
    /// Serve from field center. Direction is the only nondeterminism in the
    /// simulation: left/right is a coin flip, the vertical component is
    /// uniform in `[-BALL_SPAWN_SPEED, BALL_SPAWN_SPEED)`.
    pub fn spawn(rng: &mut impl Rng) -> Self {
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        Self {
            pos: Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0),
            vel: Vec2::new(
                direction * BALL_SPAWN_SPEED,
                (rng.random::<f32>() * 2.0 - 1.0) * BALL_SPAWN_SPEED,
            ),
        }
    }
}

/// The single shared simulation snapshot.
///
/// Exactly one of three shapes holds at any time: paused with no winner
/// (pre-game or between rounds), active play, or terminal (`winner` set,
/// which forces `is_paused`). Only the simulation (host side) or a received
/// SYNC (client side) produces values of this type during play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub player1: PlayerState,
    pub player2: PlayerState,
    pub ball: BallState,
    pub is_paused: bool,
    pub winner: Option<PlayerId>,
}

impl GameState {
    /// Fresh pre-game state: paddles centered, ball served, play paused
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            player1: PlayerState::new("Host", true),
            player2: PlayerState::new("Guest", false),
            ball: BallState::spawn(rng),
            is_paused: true,
            winner: None,
        }
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        match id {
            PlayerId::P1 => &self.player1,
            PlayerId::P2 => &self.player2,
        }
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        match id {
            PlayerId::P1 => &mut self.player1,
            PlayerId::P2 => &mut self.player2,
        }
    }

    /// Explicit (re)start transition, host only. Respawns the ball and
    /// unpauses; if the previous round had a winner, both scores reset to 0.
    /// This is the sole path that clears `winner`; `step` never does.
    pub fn restart(&mut self, rng: &mut impl Rng) {
        if self.winner.take().is_some() {
            self.player1.score = 0;
            self.player2.score = 0;
        }
        self.ball = BallState::spawn(rng);
        self.is_paused = false;
    }
}
