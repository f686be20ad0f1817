//! TCP relay server
//!
//! Accepts connections, decodes newline-delimited frames, and drives the
//! pairing state machine. Slot registration, forwarding, and disconnects
//! are serialized behind one mutex, so a client can never pair with two
//! hosts at once. One session per process instance.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};

use crate::protocol::Message;
use crate::session::{ConnId, Session};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound queues for every live connection, keyed by id
type Writers = HashMap<ConnId, mpsc::UnboundedSender<Message>>;

struct Shared {
    session: Session,
    writers: Writers,
}

/// Bind `addr` and serve until the process is stopped
pub async fn run(addr: &str) -> Result<(), RelayError> {
    let listener = TcpListener::bind(addr).await?;
    info!("relay listening on {}", listener.local_addr()?);
    serve(listener).await
}

/// Accept loop over an already-bound listener (tests bind port 0 and pass
/// the listener in)
pub async fn serve(listener: TcpListener) -> Result<(), RelayError> {
    let shared = Arc::new(Mutex::new(Shared {
        session: Session::new(),
        writers: HashMap::new(),
    }));

    let mut next_id = 0u64;
    loop {
        let (stream, addr) = listener.accept().await?;
        next_id += 1;
        let id = ConnId(next_id);
        info!("connection {id:?} from {addr}");
        tokio::spawn(handle_connection(stream, id, Arc::clone(&shared)));
    }
}

async fn handle_connection(stream: TcpStream, id: ConnId, shared: Arc<Mutex<Shared>>) {
    let (reader, mut writer) = stream.into_split();

    // Writer task owns the send half; sends are fire-and-forget
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    shared.lock().await.writers.insert(id, tx);
    let write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if writer.write_all(msg.encode().as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some(msg) = Message::decode(&line) else {
            debug!("dropping malformed frame from {id:?}");
            continue;
        };

        let mut guard = shared.lock().await;
        let notices = match msg {
            Message::RegisterHost => guard.session.register_host(id),
            Message::RegisterClient => guard.session.register_client(id),
            other => guard.session.forward(id, other).into_iter().collect(),
        };
        for (target, notice) in notices {
            deliver(&guard.writers, target, notice);
        }
    }

    // Socket closed or errored: vacate the slot, tell the remaining peer
    let mut guard = shared.lock().await;
    guard.writers.remove(&id);
    if let Some((target, notice)) = guard.session.disconnect(id) {
        deliver(&guard.writers, target, notice);
    }
    write_task.abort();
}

fn deliver(writers: &Writers, target: ConnId, msg: Message) {
    match writers.get(&target) {
        Some(tx) => {
            if tx.send(msg).is_err() {
                warn!("writer for {target:?} already gone");
            }
        }
        None => warn!("no writer for {target:?}"),
    }
}
