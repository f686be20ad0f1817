//! Wire protocol shared by relay, host, and client
//!
//! One JSON object per line over the duplex channel. The vocabulary is
//! closed: a frame that does not decode to a known shape is dropped by the
//! receiver, never escalated. No message type may be interpreted outside its
//! declared direction; `reconcile` and `session` enforce that.

use serde::{Deserialize, Serialize};

use crate::sim::GameState;

/// Why the remaining peer lost its counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LostReason {
    HostGone,
    ClientGone,
}

/// Everything that can cross the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Peer -> relay: claim the host slot
    RegisterHost,
    /// Peer -> relay: claim the client slot
    RegisterClient,
    /// Host -> client: full authoritative snapshot
    Sync(GameState),
    /// Client -> host: the client's own paddle offset
    Input(f32),
    /// Relay -> both: a host and a client are now paired
    PeerPaired,
    /// Relay -> remaining peer: the counterpart went away
    PeerLost(LostReason),
    /// Relay -> registering client: no host to pair with; retry later
    HostNotFound,
}

impl Message {
    /// Encode as a single newline-terminated frame
    pub fn encode(&self) -> String {
        let mut line = serde_json::to_string(self).expect("message serializes");
        line.push('\n');
        line
    }

    /// Decode one frame. Malformed or unrecognized input is a drop
    /// (`None`), not an error; a misbehaving peer must not crash this one.
    pub fn decode(line: &str) -> Option<Self> {
        serde_json::from_str(line.trim()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_tags_match_the_wire_vocabulary() {
        assert_eq!(Message::RegisterHost.encode(), "{\"type\":\"REGISTER_HOST\"}\n");
        assert_eq!(
            Message::Input(142.5).encode(),
            "{\"type\":\"INPUT\",\"payload\":142.5}\n"
        );
        assert_eq!(
            Message::PeerLost(LostReason::HostGone).encode(),
            "{\"type\":\"PEER_LOST\",\"payload\":\"host-gone\"}\n"
        );
    }

    #[test]
    fn test_sync_round_trips() {
        let mut rng = Pcg32::seed_from_u64(21);
        let msg = Message::Sync(crate::sim::GameState::new(&mut rng));
        assert_eq!(Message::decode(&msg.encode()), Some(msg));
    }

    #[test]
    fn test_unknown_or_malformed_frames_are_dropped() {
        assert_eq!(Message::decode("{\"type\":\"TELEPORT\"}"), None);
        assert_eq!(Message::decode("{\"type\":\"INPUT\"}"), None);
        assert_eq!(Message::decode("not json at all"), None);
        assert_eq!(Message::decode(""), None);
    }
}
