//! State reconciliation applied to every inbound gameplay message
//!
//! The rule that matters most: the locally controlled paddle is never
//! overwritten by a remote snapshot. The host's view of the client paddle is
//! one round trip stale, so committing it back onto the client would make
//! the paddle visibly jitter under the player's own finger.

use log::debug;

use crate::protocol::Message;
use crate::sim::{GameState, clamp_paddle_y};

/// Which end of the session this peer is. Fixed at join time, never
/// reassigned mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Client,
}

/// Apply one inbound gameplay message to the locally held state.
///
/// Messages arriving in the wrong direction for `role` are ignored; that is
/// the protocol's access-control rule, not an error.
pub fn apply_message(role: Role, state: &mut GameState, msg: &Message) {
    match (role, msg) {
        (Role::Client, Message::Sync(snapshot)) => {
            // Client authority over its own paddle: restore the local Y
            // before committing the snapshot.
            let local_y = state.player2.y;
            *state = snapshot.clone();
            state.player2.y = local_y;
        }
        (Role::Host, Message::Input(y)) => {
            // Absorb immediately rather than waiting for the next tick, so
            // the host's view of the opponent moves without tick latency.
            state.player2.y = clamp_paddle_y(*y);
        }
        _ => debug!("ignoring out-of-role message as {role:?}"),
    }
}

/// Optimistic local paddle move; never waits for a round trip.
///
/// Returns the INPUT message the caller must transmit, if any: the client
/// reports its paddle to the host, while the host's next SYNC already
/// carries its own.
pub fn local_move(role: Role, state: &mut GameState, y: f32) -> Option<Message> {
    let y = clamp_paddle_y(y);
    match role {
        Role::Host => {
            state.player1.y = y;
            None
        }
        Role::Client => {
            state.player2.y = y;
            Some(Message::Input(y))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FIELD_HEIGHT, PADDLE_HEIGHT};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn state(seed: u64) -> GameState {
        GameState::new(&mut Pcg32::seed_from_u64(seed))
    }

    #[test]
    fn test_client_sync_preserves_local_paddle() {
        let mut local = state(1);
        local.player2.y = 321.0;

        let mut snapshot = state(2);
        snapshot.player2.y = 50.0;
        snapshot.player1.score = 4;
        snapshot.is_paused = false;

        apply_message(Role::Client, &mut local, &Message::Sync(snapshot.clone()));

        // Everything from the snapshot except the local paddle
        assert_eq!(local.player2.y, 321.0);
        assert_eq!(local.player1.score, 4);
        assert!(!local.is_paused);
        assert_eq!(local.ball, snapshot.ball);
    }

    #[test]
    fn test_host_absorbs_and_clamps_input() {
        let mut local = state(1);

        apply_message(Role::Host, &mut local, &Message::Input(250.0));
        assert_eq!(local.player2.y, 250.0);

        apply_message(Role::Host, &mut local, &Message::Input(-999.0));
        assert_eq!(local.player2.y, 0.0);

        apply_message(Role::Host, &mut local, &Message::Input(9999.0));
        assert_eq!(local.player2.y, FIELD_HEIGHT - PADDLE_HEIGHT);
    }

    #[test]
    fn test_out_of_role_messages_are_ignored() {
        let mut host_state = state(1);
        let before = host_state.clone();
        apply_message(Role::Host, &mut host_state, &Message::Sync(state(2)));
        assert_eq!(host_state, before);

        let mut client_state = state(1);
        let before = client_state.clone();
        apply_message(Role::Client, &mut client_state, &Message::Input(10.0));
        apply_message(Role::Client, &mut client_state, &Message::PeerPaired);
        assert_eq!(client_state, before);
    }

    #[test]
    fn test_local_move_host_is_silent() {
        let mut local = state(1);
        assert_eq!(local_move(Role::Host, &mut local, 123.0), None);
        assert_eq!(local.player1.y, 123.0);
    }

    #[test]
    fn test_local_move_client_emits_clamped_input() {
        let mut local = state(1);
        let msg = local_move(Role::Client, &mut local, -40.0);
        assert_eq!(local.player2.y, 0.0);
        assert_eq!(msg, Some(Message::Input(0.0)));
    }
}
