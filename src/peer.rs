//! Peer-side endpoint and game drivers
//!
//! `Endpoint` owns the relay connection: a read task decoding frames into a
//! channel and a write task flushing outbound frames, so sends never block
//! the caller. `HostGame` runs the authoritative tick loop; `ClientGame`
//! applies reconciliation and reports paddle input. Both publish read-only
//! snapshots through a watch channel; renderers subscribe, they never see
//! the mutable state.

use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::consts::TICK_HZ;
use crate::protocol::{LostReason, Message};
use crate::reconcile::{self, Role};
use crate::sim::{self, GameState};

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("relay connection closed")]
    Closed,
}

/// Lifecycle events surfaced to the embedding application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerEvent {
    /// A counterpart joined; play can begin
    Paired,
    /// The counterpart went away; return to a pre-game state
    PeerLost(LostReason),
    /// Registered as client with no host present; retry is fine
    HostNotFound,
}

/// One end of the relay channel. Role is fixed at construction and never
/// reassigned.
pub struct Endpoint {
    role: Role,
    outbound: mpsc::UnboundedSender<Message>,
    inbound: mpsc::UnboundedReceiver<Message>,
    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl Endpoint {
    /// Connect to the relay and claim the host slot
    pub async fn register_as_host(addr: &str) -> Result<Self, PeerError> {
        Self::connect(addr, Role::Host).await
    }

    /// Connect to the relay and claim the client slot
    pub async fn register_as_client(addr: &str) -> Result<Self, PeerError> {
        Self::connect(addr, Role::Client).await
    }

    async fn connect(addr: &str, role: Role) -> Result<Self, PeerError> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, mut writer) = stream.into_split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let write_task = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if writer.write_all(msg.encode().as_bytes()).await.is_err() {
                    break;
                }
            }
        });

        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let read_task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match Message::decode(&line) {
                    Some(msg) => {
                        if in_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    None => debug!("dropping malformed frame from relay"),
                }
            }
        });

        let endpoint = Self {
            role,
            outbound: out_tx,
            inbound: in_rx,
            read_task,
            write_task,
        };
        endpoint.send(match role {
            Role::Host => Message::RegisterHost,
            Role::Client => Message::RegisterClient,
        })?;
        Ok(endpoint)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Fire-and-forget send; delivery is never awaited
    pub fn send(&self, msg: Message) -> Result<(), PeerError> {
        self.outbound.send(msg).map_err(|_| PeerError::Closed)
    }

    /// Next inbound message; `None` once the relay connection is gone
    pub async fn recv(&mut self) -> Option<Message> {
        self.inbound.recv().await
    }

    /// Tear down both socket tasks. Nothing is delivered after this.
    pub fn close(&self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.close();
    }
}

/// Commands the application feeds the host driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    /// Move the host's own paddle
    Move(f32),
    /// Start or restart the round
    Restart,
}

/// Commands the application feeds the client driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientCommand {
    /// Move the client's own paddle
    Move(f32),
}

enum Driven<C> {
    Tick,
    Inbound(Option<Message>),
    Command(Option<C>),
}

/// The authoritative peer: owns the canonical `GameState`, paces the world
/// at `TICK_HZ`, and broadcasts a snapshot after every tick. The client
/// never simulates.
pub struct HostGame {
    endpoint: Endpoint,
    state: GameState,
    rng: Pcg32,
    snapshot_tx: watch::Sender<GameState>,
}

impl HostGame {
    /// Register as host on the relay. The initial state is paused, waiting
    /// for a client; the returned receiver is the renderer's subscription.
    pub async fn connect(
        addr: &str,
        seed: u64,
    ) -> Result<(Self, watch::Receiver<GameState>), PeerError> {
        let endpoint = Endpoint::register_as_host(addr).await?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let state = GameState::new(&mut rng);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.clone());
        Ok((
            Self {
                endpoint,
                state,
                rng,
                snapshot_tx,
            },
            snapshot_rx,
        ))
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Optimistic local paddle move; the next tick's SYNC carries it, so
    /// nothing is transmitted here.
    pub fn local_move(&mut self, y: f32) {
        reconcile::local_move(Role::Host, &mut self.state, y);
        self.publish();
    }

    /// Explicit (re)start; the sole path that clears a winner. The client
    /// learns of it through the SYNC this emits.
    pub fn restart(&mut self) -> Result<(), PeerError> {
        self.state.restart(&mut self.rng);
        self.publish();
        self.endpoint.send(Message::Sync(self.state.clone()))
    }

    /// Advance one tick and broadcast the resulting snapshot
    pub fn tick(&mut self) -> Result<(), PeerError> {
        for event in sim::step(&mut self.state, &mut self.rng) {
            info!("{event:?}");
        }
        self.publish();
        self.endpoint.send(Message::Sync(self.state.clone()))
    }

    /// Handle one inbound message; lifecycle notices bubble up as events
    pub fn handle_message(&mut self, msg: Message) -> Option<PeerEvent> {
        match msg {
            Message::PeerPaired => {
                // Fresh round for the new pairing; the client's first SYNC
                // is this state.
                self.state = GameState::new(&mut self.rng);
                self.state.player2.connected = true;
                self.publish();
                let _ = self.endpoint.send(Message::Sync(self.state.clone()));
                Some(PeerEvent::Paired)
            }
            Message::PeerLost(reason) => {
                self.state.player2.connected = false;
                self.state.is_paused = true;
                self.publish();
                Some(PeerEvent::PeerLost(reason))
            }
            other => {
                reconcile::apply_message(Role::Host, &mut self.state, &other);
                self.publish();
                None
            }
        }
    }

    /// Drive ticks, inbound messages, and application commands until the
    /// relay connection closes or the command channel is dropped (quit).
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<HostCommand>,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<(), PeerError> {
        let mut ticker = time::interval(Duration::from_secs(1) / TICK_HZ);
        loop {
            let driven = tokio::select! {
                _ = ticker.tick() => Driven::Tick,
                msg = self.endpoint.recv() => Driven::Inbound(msg),
                cmd = commands.recv() => Driven::Command(cmd),
            };
            match driven {
                Driven::Tick => self.tick()?,
                Driven::Inbound(Some(msg)) => {
                    if let Some(event) = self.handle_message(msg) {
                        let _ = events.send(event);
                    }
                }
                Driven::Inbound(None) => return Err(PeerError::Closed),
                Driven::Command(Some(HostCommand::Move(y))) => self.local_move(y),
                Driven::Command(Some(HostCommand::Restart)) => self.restart()?,
                Driven::Command(None) => {
                    // Quit: stop the timer and close the channel before any
                    // further snapshot could be published
                    self.endpoint.close();
                    return Ok(());
                }
            }
        }
    }

    fn publish(&self) {
        // Fire-and-forget; all receivers may be gone
        let _ = self.snapshot_tx.send(self.state.clone());
    }
}

/// The rendering peer: applies received snapshots (preserving its own
/// paddle) and reports paddle input to the host.
pub struct ClientGame {
    endpoint: Endpoint,
    state: GameState,
    snapshot_tx: watch::Sender<GameState>,
}

impl ClientGame {
    /// Register as client on the relay. The placeholder state is replaced
    /// wholesale by the first SYNC, local paddle aside.
    pub async fn connect(
        addr: &str,
    ) -> Result<(Self, watch::Receiver<GameState>), PeerError> {
        let endpoint = Endpoint::register_as_client(addr).await?;
        let state = GameState::new(&mut Pcg32::seed_from_u64(0));
        let (snapshot_tx, snapshot_rx) = watch::channel(state.clone());
        Ok((
            Self {
                endpoint,
                state,
                snapshot_tx,
            },
            snapshot_rx,
        ))
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Optimistic local paddle move, plus the INPUT report to the host
    pub fn local_move(&mut self, y: f32) -> Result<(), PeerError> {
        if let Some(input) = reconcile::local_move(Role::Client, &mut self.state, y) {
            self.endpoint.send(input)?;
        }
        self.publish();
        Ok(())
    }

    /// Handle one inbound message; lifecycle notices bubble up as events
    pub fn handle_message(&mut self, msg: Message) -> Option<PeerEvent> {
        match msg {
            Message::PeerPaired => Some(PeerEvent::Paired),
            Message::HostNotFound => Some(PeerEvent::HostNotFound),
            Message::PeerLost(reason) => Some(PeerEvent::PeerLost(reason)),
            other => {
                reconcile::apply_message(Role::Client, &mut self.state, &other);
                self.publish();
                None
            }
        }
    }

    /// Drive inbound messages and application commands until the relay
    /// connection closes or the command channel is dropped (quit). The
    /// client has no ticker: it never simulates.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<ClientCommand>,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<(), PeerError> {
        loop {
            let driven = tokio::select! {
                msg = self.endpoint.recv() => Driven::Inbound(msg),
                cmd = commands.recv() => Driven::Command(cmd),
            };
            match driven {
                Driven::Tick => unreachable!("client has no ticker"),
                Driven::Inbound(Some(msg)) => {
                    if let Some(event) = self.handle_message(msg) {
                        let _ = events.send(event);
                    }
                }
                Driven::Inbound(None) => return Err(PeerError::Closed),
                Driven::Command(Some(ClientCommand::Move(y))) => self.local_move(y)?,
                Driven::Command(None) => {
                    self.endpoint.close();
                    return Ok(());
                }
            }
        }
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send(self.state.clone());
    }
}
