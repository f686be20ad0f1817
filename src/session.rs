//! Session pairing state machine
//!
//! Transport-agnostic: every operation returns the notices the relay must
//! deliver as `(connection, message)` pairs, so the machine itself performs
//! no I/O and is trivially testable. One host slot, one client slot; the
//! session owns the slots and connection ids are lookup handles only, never
//! lifecycle controls.

use log::{debug, info};

use crate::protocol::{LostReason, Message};

/// Opaque connection handle assigned by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub u64);

/// Observable pairing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No host present (a client may already be waiting)
    Empty,
    /// Host present, no client yet
    HostWaiting,
    /// Exactly one host and one client
    Paired,
}

/// A notice the relay must deliver to one connection
pub type Notice = (ConnId, Message);

/// Pairing slots for one host/client pair. One session per relay instance;
/// running multiple concurrent games would mean keying sessions by an
/// explicit session identifier, which is out of scope here.
#[derive(Debug, Default)]
pub struct Session {
    host: Option<ConnId>,
    client: Option<ConnId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (self.host, self.client) {
            (Some(_), Some(_)) => Phase::Paired,
            (Some(_), None) => Phase::HostWaiting,
            (None, _) => Phase::Empty,
        }
    }

    /// Claim the host slot. A second registration silently evicts the prior
    /// host; the evicted connection gets no signal and must rely on its own
    /// disconnect detection. If a client is already waiting, both sides are
    /// paired immediately.
    pub fn register_host(&mut self, conn: ConnId) -> Vec<Notice> {
        match self.host.replace(conn) {
            Some(old) => info!("host {conn:?} registered, superseding {old:?}"),
            None => info!("host registered: {conn:?}"),
        }
        match self.client {
            Some(client) => vec![(conn, Message::PeerPaired), (client, Message::PeerPaired)],
            None => Vec::new(),
        }
    }

    /// Claim the client slot. With no host present the registration still
    /// holds the slot (it pairs when a host arrives) but the connection is
    /// told so it can surface an actionable notice.
    pub fn register_client(&mut self, conn: ConnId) -> Vec<Notice> {
        match self.client.replace(conn) {
            Some(old) => info!("client {conn:?} registered, superseding {old:?}"),
            None => info!("client registered: {conn:?}"),
        }
        match self.host {
            Some(host) => vec![(host, Message::PeerPaired), (conn, Message::PeerPaired)],
            None => vec![(conn, Message::HostNotFound)],
        }
    }

    /// Role-scoped forwarding: SYNC flows host to client, INPUT client to
    /// host. A message from a connection that does not hold the matching
    /// slot is dropped silently; that is the access-control invariant, not
    /// an error.
    pub fn forward(&self, from: ConnId, msg: Message) -> Option<Notice> {
        match msg {
            Message::Sync(_) if self.host == Some(from) => {
                self.client.map(|client| (client, msg))
            }
            Message::Input(_) if self.client == Some(from) => {
                self.host.map(|host| (host, msg))
            }
            _ => {
                debug!("dropping unforwardable message from {from:?}");
                None
            }
        }
    }

    /// Vacate whichever slot `conn` held and notify the remaining peer.
    pub fn disconnect(&mut self, conn: ConnId) -> Option<Notice> {
        if self.host == Some(conn) {
            self.host = None;
            info!("host disconnected: {conn:?}");
            return self
                .client
                .map(|client| (client, Message::PeerLost(LostReason::HostGone)));
        }
        if self.client == Some(conn) {
            self.client = None;
            info!("client disconnected: {conn:?}");
            return self
                .host
                .map(|host| (host, Message::PeerLost(LostReason::ClientGone)));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const HOST: ConnId = ConnId(1);
    const CLIENT: ConnId = ConnId(2);
    const INTRUDER: ConnId = ConnId(3);

    fn sync() -> Message {
        Message::Sync(crate::sim::GameState::new(&mut Pcg32::seed_from_u64(0)))
    }

    #[test]
    fn test_host_then_client_pairs_once() {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::Empty);

        assert!(session.register_host(HOST).is_empty());
        assert_eq!(session.phase(), Phase::HostWaiting);

        let notices = session.register_client(CLIENT);
        assert_eq!(session.phase(), Phase::Paired);
        assert_eq!(
            notices,
            vec![(HOST, Message::PeerPaired), (CLIENT, Message::PeerPaired)]
        );
    }

    #[test]
    fn test_client_then_host_pairs_once() {
        let mut session = Session::new();

        let notices = session.register_client(CLIENT);
        assert_eq!(notices, vec![(CLIENT, Message::HostNotFound)]);
        assert_eq!(session.phase(), Phase::Empty);

        let notices = session.register_host(HOST);
        assert_eq!(session.phase(), Phase::Paired);
        assert_eq!(
            notices,
            vec![(HOST, Message::PeerPaired), (CLIENT, Message::PeerPaired)]
        );
    }

    #[test]
    fn test_second_host_evicts_the_first() {
        let mut session = Session::new();
        session.register_host(HOST);
        session.register_client(CLIENT);

        let notices = session.register_host(INTRUDER);
        assert_eq!(
            notices,
            vec![(INTRUDER, Message::PeerPaired), (CLIENT, Message::PeerPaired)]
        );

        // The evicted host no longer holds the slot
        assert_eq!(session.forward(HOST, sync()), None);
        assert!(matches!(
            session.forward(INTRUDER, sync()),
            Some((CLIENT, Message::Sync(_)))
        ));
    }

    #[test]
    fn test_forwarding_is_role_scoped() {
        let mut session = Session::new();
        session.register_host(HOST);
        session.register_client(CLIENT);

        assert!(matches!(
            session.forward(HOST, sync()),
            Some((CLIENT, Message::Sync(_)))
        ));
        assert_eq!(
            session.forward(CLIENT, Message::Input(33.0)),
            Some((HOST, Message::Input(33.0)))
        );

        // Wrong direction or wrong slot: silent drop
        assert_eq!(session.forward(CLIENT, sync()), None);
        assert_eq!(session.forward(HOST, Message::Input(1.0)), None);
        assert_eq!(session.forward(INTRUDER, sync()), None);
        assert_eq!(session.forward(HOST, Message::PeerPaired), None);
    }

    #[test]
    fn test_host_disconnect_notifies_client() {
        let mut session = Session::new();
        session.register_host(HOST);
        session.register_client(CLIENT);

        let notice = session.disconnect(HOST);
        assert_eq!(notice, Some((CLIENT, Message::PeerLost(LostReason::HostGone))));
        assert_eq!(session.phase(), Phase::Empty);

        // A later host pairs with the still-waiting client
        let notices = session.register_host(INTRUDER);
        assert_eq!(
            notices,
            vec![(INTRUDER, Message::PeerPaired), (CLIENT, Message::PeerPaired)]
        );
    }

    #[test]
    fn test_client_disconnect_returns_to_host_waiting() {
        let mut session = Session::new();
        session.register_host(HOST);
        session.register_client(CLIENT);

        let notice = session.disconnect(CLIENT);
        assert_eq!(notice, Some((HOST, Message::PeerLost(LostReason::ClientGone))));
        assert_eq!(session.phase(), Phase::HostWaiting);

        // A fresh client re-pairs
        let notices = session.register_client(INTRUDER);
        assert_eq!(
            notices,
            vec![(HOST, Message::PeerPaired), (INTRUDER, Message::PeerPaired)]
        );
    }

    #[test]
    fn test_unknown_disconnect_is_a_noop() {
        let mut session = Session::new();
        session.register_host(HOST);
        assert_eq!(session.disconnect(INTRUDER), None);
        assert_eq!(session.phase(), Phase::HostWaiting);
    }
}
