//! Fixed timestep simulation step
//!
//! Advances ball and paddle interaction deterministically; the serve
//! direction after a goal is the only draw from the caller's seeded RNG.

use rand::Rng;

use super::state::{BallState, GameState, PlayerId};
use crate::consts::*;

/// Things that happened during a tick, for logging and host-side UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    Scored(PlayerId),
    Won(PlayerId),
}

/// Advance the simulation by one fixed tick.
///
/// No-op while paused or after a win; resuming is an explicit transition
/// (`GameState::restart`), never a side effect of stepping.
pub fn step(state: &mut GameState, rng: &mut impl Rng) -> Vec<StepEvent> {
    let mut events = Vec::new();
    if state.is_paused || state.winner.is_some() {
        return events;
    }

    let ball = &mut state.ball;
    ball.pos += ball.vel;

    // Top/bottom wall reflection
    if ball.pos.y - BALL_RADIUS < 0.0 {
        ball.pos.y = BALL_RADIUS;
        ball.vel.y = -ball.vel.y;
    }
    if ball.pos.y + BALL_RADIUS > FIELD_HEIGHT {
        ball.pos.y = FIELD_HEIGHT - BALL_RADIUS;
        ball.vel.y = -ball.vel.y;
    }

    // Left paddle (player1): reflect, speed up the rally, and impart spin
    // proportional to how far off paddle-center the contact was
    if ball.pos.x - BALL_RADIUS < PADDLE_WIDTH
        && ball.pos.y > state.player1.y
        && ball.pos.y < state.player1.y + PADDLE_HEIGHT
    {
        ball.pos.x = PADDLE_WIDTH + BALL_RADIUS;
        ball.vel.x *= -PADDLE_BOOST;
        ball.vel.y += (ball.pos.y - state.player1.paddle_center()) * SPIN_FACTOR;
    }

    // Right paddle (player2)
    if ball.pos.x + BALL_RADIUS > FIELD_WIDTH - PADDLE_WIDTH
        && ball.pos.y > state.player2.y
        && ball.pos.y < state.player2.y + PADDLE_HEIGHT
    {
        ball.pos.x = FIELD_WIDTH - PADDLE_WIDTH - BALL_RADIUS;
        ball.vel.x *= -PADDLE_BOOST;
        ball.vel.y += (ball.pos.y - state.player2.paddle_center()) * SPIN_FACTOR;
    }

    // Cap speed without changing direction
    let speed = ball.vel.length();
    if speed > BALL_SPEED_MAX {
        ball.vel *= BALL_SPEED_MAX / speed;
    }

    // A ball past either goal line scores for the opposite side
    if state.ball.pos.x < 0.0 {
        award(state, PlayerId::P2, rng, &mut events);
    } else if state.ball.pos.x > FIELD_WIDTH {
        award(state, PlayerId::P1, rng, &mut events);
    }

    events
}

fn award(
    state: &mut GameState,
    scorer: PlayerId,
    rng: &mut impl Rng,
    events: &mut Vec<StepEvent>,
) {
    let player = state.player_mut(scorer);
    player.score += 1;
    let won = player.score >= WINNING_SCORE;
    events.push(StepEvent::Scored(scorer));

    state.ball = BallState::spawn(rng);
    if won {
        state.winner = Some(scorer);
        state.is_paused = true;
        events.push(StepEvent::Won(scorer));
    }
}
